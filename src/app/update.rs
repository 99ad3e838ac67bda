use eframe::egui;
use stockpiler::canvas::GestureKind;
use stockpiler::grid::{IconScale, SECTION_HEADER_HEIGHT};
use stockpiler::model::{
    CategoryFilter, Icon, IconCategory, Point, QUANTITY_MIN, QuantityBadge, QuantityPreset, Section,
    Subtype,
};
use stockpiler::placement::{DragPayload, DropOutcome, GridLayout, Highlight};

use super::render::{self, ModalResult, RESIZE_HANDLE};
use super::{CanvasAction, IconEdit, StockpileApp, help};

/// Everything needed to draw one section this frame.
struct SectionView {
    section: Section,
    layout: GridLayout,
    highlight: Highlight,
}

const CATALOG_TILE: f32 = 52.0;
const FULL_UV: egui::Rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

impl eframe::App for StockpileApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_canvas();
        self.handle_shortcuts(ctx);

        let mut actions = Vec::new();
        self.top_bar(ctx);
        self.status_bar(ctx);
        self.catalog_panel(ctx, &mut actions);
        self.canvas_panel(ctx, &mut actions);
        for action in actions {
            self.apply(ctx, action);
        }

        if let Some(mut modal) = self.modal.take() {
            match render::section_modal_ui(ctx, &mut modal) {
                ModalResult::Open => self.modal = Some(modal),
                ModalResult::Confirm => self.confirm_modal(modal),
                ModalResult::Cancel => self.cancel_modal(),
            }
        }
        if self.confirm_clear {
            match render::confirm_clear_ui(ctx) {
                ModalResult::Open => {}
                ModalResult::Confirm => {
                    self.confirm_clear = false;
                    self.clear_document();
                }
                ModalResult::Cancel => self.confirm_clear = false,
            }
        }
        help::draw_help_window(ctx, &mut self.show_help);

        self.sync_canvas();
    }
}

impl StockpileApp {
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let typing = ctx.wants_keyboard_input();
        let (mut export, mut import, mut new_section, mut escape) = (false, false, false, false);
        ctx.input_mut(|i| {
            export = i.consume_key(egui::Modifiers::COMMAND, egui::Key::S);
            import = i.consume_key(egui::Modifiers::COMMAND, egui::Key::O);
            new_section = !typing && i.consume_key(egui::Modifiers::COMMAND, egui::Key::N);
            escape = i.consume_key(egui::Modifiers::NONE, egui::Key::Escape);
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = true;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Questionmark) {
                self.show_help = help::toggle_on_shortcut(self.show_help, typing);
            }
        });
        if export {
            self.export_json_dialog();
        }
        if import {
            self.import_json_dialog();
        }
        if new_section && self.modal.is_none() {
            self.new_section_from_toolbar();
        }
        if escape {
            if self.modal.is_some() {
                self.cancel_modal();
            }
            self.confirm_clear = false;
            self.canvas.cancel_drag();
            self.canvas.cancel_gesture();
            egui::DragAndDrop::clear_payload(ctx);
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Import JSON... (⌘O)").clicked() {
                        self.import_json_dialog();
                        ui.close_menu();
                    }
                    if ui.button("Export JSON... (⌘S)").clicked() {
                        self.export_json_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Clear...").clicked() {
                        self.confirm_clear = true;
                        ui.close_menu();
                    }
                });
                if ui.button("New section").clicked() {
                    self.new_section_from_toolbar();
                }
                ui.separator();
                ui.label("Icons:");
                let current = self.store.icon_scale();
                for scale in IconScale::ALL {
                    if ui.selectable_label(current == scale, scale.name()).clicked()
                        && current != scale
                    {
                        self.store.set_icon_scale(scale);
                    }
                }
                ui.separator();
                if ui.button("Help").clicked() {
                    self.show_help = true;
                }
            });
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icons: usize = self.store.sections().iter().map(|s| s.icons.len()).sum();
                    ui.label(format!("Icons: {icons}"));
                    ui.separator();
                    ui.label(format!("Sections: {}", self.store.sections().len()));
                });
            });
        });
    }

    fn catalog_panel(&mut self, ctx: &egui::Context, actions: &mut Vec<CanvasAction>) {
        egui::SidePanel::left("catalog")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Catalog");
                let mut category = self.store.category();
                egui::ComboBox::from_id_salt("category")
                    .selected_text(category.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(
                            &mut category,
                            CategoryFilter::All,
                            CategoryFilter::All.label(),
                        );
                        for c in IconCategory::ALL {
                            ui.selectable_value(&mut category, CategoryFilter::Only(c), c.label());
                        }
                    });
                if category != self.store.category() {
                    self.store.set_category(category);
                }

                let mut search = self.store.search().to_string();
                if ui
                    .add(egui::TextEdit::singleline(&mut search).hint_text("Search"))
                    .changed()
                {
                    self.store.set_search(search);
                }
                ui.separator();

                let icons: Vec<Icon> = self.store.filtered_icons().into_iter().cloned().collect();
                ui.small(format!("{} icons", icons.len()));
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        for icon in &icons {
                            let (rect, response) = ui.allocate_exact_size(
                                egui::vec2(CATALOG_TILE, CATALOG_TILE),
                                egui::Sense::drag(),
                            );
                            let texture = self.textures.get(ctx, &icon.path);
                            let painter = ui.painter();
                            painter.rect_filled(rect, 3.0, egui::Color32::from_black_alpha(60));
                            match texture {
                                Some(t) => {
                                    painter.image(
                                        t.id(),
                                        rect.shrink(4.0),
                                        FULL_UV,
                                        egui::Color32::WHITE,
                                    );
                                }
                                None => {
                                    painter.text(
                                        rect.center(),
                                        egui::Align2::CENTER_CENTER,
                                        &icon.display_name,
                                        egui::FontId::proportional(9.0),
                                        egui::Color32::LIGHT_GRAY,
                                    );
                                }
                            }
                            let response = response.on_hover_text(&icon.display_name);
                            if response.drag_started() && !self.canvas.is_gesture_active() {
                                actions.push(CanvasAction::BeginDrag(DragPayload::from_icon(icon)));
                            }
                        }
                    });
                });
            });
    }

    fn canvas_panel(&mut self, ctx: &egui::Context, actions: &mut Vec<CanvasAction>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                let (w, h) = self.canvas.size();
                let (rect, response) =
                    ui.allocate_exact_size(egui::vec2(w, h), egui::Sense::click());
                let origin = rect.min;
                let painter = ui.painter_at(rect);
                render::draw_background(&painter, rect);

                let pointer = ctx.input(|i| i.pointer.latest_pos());
                if response.double_clicked() && self.modal.is_none() {
                    if let Some(p) = pointer {
                        self.open_section_modal_at(render::to_canvas(origin, p));
                    }
                }

                let scale = self.store.icon_scale();
                let subtypes = self.store.subtypes().to_vec();
                let views: Vec<SectionView> = self
                    .canvas
                    .controllers()
                    .iter()
                    .filter_map(|c| {
                        let mut section = c.section()?.clone();
                        if let Some((x, y, w, h)) = self.canvas.preview(&section.id) {
                            section.x = x;
                            section.y = y;
                            section.width = w;
                            section.height = h;
                        }
                        Some(SectionView {
                            section,
                            layout: c.layout().clone(),
                            highlight: c.highlight(),
                        })
                    })
                    .collect();
                for view in &views {
                    self.draw_section(ui, &painter, origin, scale, view, &subtypes, actions);
                }

                self.track_drag(ctx, rect, pointer);
            });
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_section(
        &mut self,
        ui: &mut egui::Ui,
        painter: &egui::Painter,
        origin: egui::Pos2,
        scale: IconScale,
        view: &SectionView,
        subtypes: &[Subtype],
        actions: &mut Vec<CanvasAction>,
    ) {
        let section = &view.section;
        let id = section.id.clone();
        let pos = Point::new(section.x, section.y);
        let rect = egui::Rect::from_min_size(
            render::to_screen(origin, pos),
            egui::vec2(section.width, section.height),
        );
        render::draw_section_frame(
            painter,
            rect,
            &section.title,
            render::section_color(&section.color),
            view.highlight.section,
        );

        let header =
        egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), SECTION_HEADER_HEIGHT));
        let header_response = ui
            .interact(header, egui::Id::new(("section_header", &id)), egui::Sense::click_and_drag())
            .on_hover_cursor(egui::CursorIcon::Grab);
        gesture_actions(&header_response, &id, GestureKind::Move, actions);
        if header_response.double_clicked() {
            actions.push(CanvasAction::EditSection(id.clone()));
        }
        header_response.context_menu(|ui| {
            if ui.button("Edit...").clicked() {
                actions.push(CanvasAction::EditSection(id.clone()));
                ui.close();
            }
            if ui.button("Delete section").clicked() {
                actions.push(CanvasAction::DeleteSection(id.clone()));
                ui.close();
            }
        });

        let handle =
        egui::Rect::from_min_max(rect.max - egui::vec2(RESIZE_HANDLE, RESIZE_HANDLE), rect.max);
        let handle_response = ui
            .interact(handle, egui::Id::new(("section_resize", &id)), egui::Sense::drag())
            .on_hover_cursor(egui::CursorIcon::ResizeNwSe);
        gesture_actions(&handle_response, &id, GestureKind::Resize, actions);

        for cell in &view.layout.empty_cells {
            let slot = render::slot_rect(origin, pos, scale, *cell);
            render::draw_empty_cell(painter, slot, view.highlight.cell == Some(*cell));
        }

        for placed in &view.layout.icons {
            let Some(icon) = section.icon(&placed.instance_id) else {
                continue;
            };
            let slot = render::slot_rect(origin, pos, scale, placed.cell);
            let texture = self.textures.get(ui.ctx(), &icon.path);
            let subtype_texture = icon
                .subtype
                .as_deref()
                .and_then(|path| self.textures.get(ui.ctx(), path));
            render::draw_icon_slot(
                painter,
                slot,
                scale,
                texture.as_ref(),
                subtype_texture.as_ref(),
                icon.badge(),
                view.highlight.cell == Some(placed.cell),
            );

            let response = ui.interact(
                slot,
                egui::Id::new(("section_icon", &placed.instance_id)),
                egui::Sense::click_and_drag(),
            );
            if response.drag_started() && !self.canvas.is_gesture_active() {
                if let Some(payload) = self
                    .canvas
                    .controller(&id)
                    .and_then(|c| c.begin_drag(&placed.instance_id))
                {
                    actions.push(CanvasAction::BeginDrag(payload));
                }
            }
            let icon_action = |edit| CanvasAction::Icon {
                section_id: id.clone(),
                instance_id: placed.instance_id.clone(),
                edit,
            };
            response.context_menu(|ui| {
                ui.horizontal(|ui| {
                    if ui.button(" − ").clicked() {
                        actions.push(icon_action(IconEdit::Step(-1)));
                    }
                    let mut quantity = icon.quantity.max(QUANTITY_MIN);
                    let field = egui::DragValue::new(&mut quantity)
                        .range(QUANTITY_MIN..=i32::MAX)
                        .speed(0.2);
                    if ui.add(field).changed() {
                        actions.push(icon_action(IconEdit::Set(quantity)));
                    }
                    if let QuantityBadge::NotNeeded | QuantityBadge::Unspecified = icon.badge() {
                        ui.label(icon.badge().text().unwrap_or_default());
                    }
                    if ui.button(" + ").clicked() {
                        actions.push(icon_action(IconEdit::Step(1)));
                    }
                });
                if ui.button("★ Not needed").clicked() {
                    actions.push(icon_action(IconEdit::Preset(QuantityPreset::NotNeeded)));
                    ui.close();
                }
                if ui.button("? Unspecified").clicked() {
                    actions.push(icon_action(IconEdit::Preset(QuantityPreset::Unspecified)));
                    ui.close();
                }
                ui.menu_button("Subtype", |ui| {
                    if ui
                        .selectable_label(icon.subtype.is_none(), "None")
                        .clicked()
                    {
                        actions.push(icon_action(IconEdit::Subtype(None)));
                        ui.close();
                    }
                    for subtype in subtypes {
                        let selected = icon.subtype.as_deref() == Some(subtype.path.as_str());
                        if ui.selectable_label(selected, &subtype.display_name).clicked() {
                            let edit = IconEdit::Subtype(Some(subtype.path.clone()));
                            actions.push(icon_action(edit));
                            ui.close();
                        }
                    }
                });
                ui.separator();
                if ui.button("Delete").clicked() {
                    actions.push(icon_action(IconEdit::Remove));
                    ui.close();
                }
            });
        }
    }

    /// Hover feedback while a drag is active, and the drop on release.
    fn track_drag(
        &mut self,
        ctx: &egui::Context,
        canvas_rect: egui::Rect,
        pointer: Option<egui::Pos2>,
    ) {
        if self.canvas.drag_payload().is_none() {
            return;
        }
        if !egui::DragAndDrop::has_any_payload(ctx) {
            self.canvas.cancel_drag();
            return;
        }
        let Some(p) = pointer else {
            return;
        };
        let origin = canvas_rect.min;

        if ctx.input(|i| i.pointer.any_released()) {
            let encoded = egui::DragAndDrop::take_payload::<String>(ctx);
            let outcome = match encoded {
                Some(text) if canvas_rect.contains(p) => {
                    self.canvas
                        .drop_encoded(&mut self.store, &text, render::to_canvas(origin, p))
                }
                _ => {
                    self.canvas.cancel_drag();
                    DropOutcome::Ignored
                }
            };
            match outcome {
                DropOutcome::Added { .. } => self.status = Some("Icon added".to_string()),
                DropOutcome::Transferred { .. } => {
                    self.status = Some("Icon moved to another section".to_string())
                }
                DropOutcome::Moved { .. } | DropOutcome::Ignored => {}
            }
            return;
        }

        if canvas_rect.contains(p) {
            self.canvas.hover(render::to_canvas(origin, p));
        } else {
            self.canvas.drag_leave();
        }
        if let Some(path) = self.drag_image_path() {
            if let Some(texture) = self.textures.get(ctx, &path) {
                let painter = ctx.layer_painter(egui::LayerId::new(
                    egui::Order::Tooltip,
                    egui::Id::new("drag_ghost"),
                ));
                let side = self.store.icon_scale().metrics().img;
                painter.image(
                    texture.id(),
                    egui::Rect::from_center_size(p, egui::vec2(side, side)),
                    FULL_UV,
                    egui::Color32::from_white_alpha(200),
                );
            }
        }
        ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
    }

    fn drag_image_path(&self) -> Option<String> {
        match self.canvas.drag_payload()? {
            DragPayload::Catalog { path, .. } => Some(path.clone()),
            DragPayload::GridIcon {
                icon_instance_id,
                from_section_id,
            } => self
                .store
                .section(from_section_id)
                .and_then(|s| s.icon(icon_instance_id))
                .map(|i| i.path.clone()),
        }
    }
}

fn gesture_actions(
    response: &egui::Response,
    section_id: &str,
    kind: GestureKind,
    actions: &mut Vec<CanvasAction>,
) {
    if response.drag_started() {
        actions.push(CanvasAction::BeginGesture(section_id.to_string(), kind));
    }
    if response.dragged() {
        let delta = response.drag_delta();
        if delta != egui::Vec2::ZERO {
            actions.push(CanvasAction::Gesture(delta));
        }
    }
    if response.drag_stopped() {
        actions.push(CanvasAction::EndGesture);
    }
}
