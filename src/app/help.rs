use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help")
        .open(open)
        .resizable(true)
        .default_width(460.0)
        .show(ctx, |ui| {
            ui.heading("Keyboard Shortcuts");
            ui.separator();
            help_row(ui, "⌘S", "Export template (JSON)");
            help_row(ui, "⌘O", "Import template (JSON)");
            help_row(ui, "⌘N", "New section");
            help_row(ui, "Escape", "Cancel dialog or drag");
            help_row(ui, "F1 / ?", "This window (? toggles)");

            ui.add_space(10.0);
            ui.heading("Canvas");
            ui.separator();
            help_row(ui, "Double-click canvas", "New section at pointer");
            help_row(ui, "Double-click title", "Rename / recolor section");
            help_row(ui, "Drag title", "Move section");
            help_row(ui, "Drag corner", "Resize section");
            help_row(ui, "Drag catalog icon", "Place icon in the cell under the pointer");
            help_row(
                ui,
                "Drag placed icon",
                "Move or swap; into another section replaces its occupant",
            );
            help_row(
                ui,
                "Right-click icon",
                "Quantity, ★ not needed, ? unspecified, subtype, delete",
            );
        });
}

/// `?` flips the help window, except while a text field has focus.
pub(super) fn toggle_on_shortcut(open: bool, typing: bool) -> bool {
    if typing { open } else { !open }
}

fn help_row(ui: &mut egui::Ui, key: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized([150.0, 18.0], egui::Label::new(egui::RichText::new(key).monospace()));
        ui.label(description);
    });
}
