use stockpiler::model::{Point, SectionPatch};
use stockpiler::settings;

use super::{ModalTarget, SectionModal, StockpileApp};

/// Where the toolbar's "New section" places the section.
const TOOLBAR_SECTION_POS: Point = Point { x: 40.0, y: 40.0 };

impl StockpileApp {
    pub(super) fn export_json_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.settings.export_path)
            .add_filter("JSON", &["json"])
            .save_file()
        {
            let path_str = path.display().to_string();
            match std::fs::write(&path, self.store.export_json()) {
                Ok(()) => {
                    log::info!("exported template to {path_str}");
                    self.settings.export_path = path_str.clone();
                    if let Err(e) = settings::save_settings(&self.settings_path, &self.settings) {
                        log::warn!("failed to save settings: {e:#}");
                    }
                    self.status = Some(format!("Exported {path_str}"));
                }
                Err(e) => self.status = Some(format!("Export failed: {e}")),
            }
        }
    }

    pub(super) fn import_json_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            let path_str = path.display().to_string();
            match std::fs::read_to_string(&path) {
                Ok(json) => {
                    if self.store.import_json(&json) {
                        log::info!("imported template from {path_str}");
                        self.status = Some(format!("Imported {path_str}"));
                    } else {
                        self.status = Some(format!("Not a valid template: {path_str}"));
                    }
                }
                Err(e) => self.status = Some(format!("Read failed: {e}")),
            }
        }
    }

    pub(super) fn clear_document(&mut self) {
        self.canvas.cancel_drag();
        self.canvas.cancel_gesture();
        self.store.clear_sections();
        self.status = Some("Cleared all sections".to_string());
    }

    pub(super) fn new_section_from_toolbar(&mut self) {
        self.canvas.begin_section_at(TOOLBAR_SECTION_POS);
        self.modal = Some(SectionModal::create());
    }

    pub(super) fn open_section_modal_at(&mut self, pointer: Point) {
        if self.canvas.request_section_at(pointer) {
            self.modal = Some(SectionModal::create());
        }
    }

    /// Applies the modal's title and color, creating or editing as requested.
    pub(super) fn confirm_modal(&mut self, modal: SectionModal) {
        match modal.target {
            ModalTarget::Create => {
                if self
                    .canvas
                    .confirm_section(&mut self.store, &modal.title, &modal.color)
                    .is_some()
                {
                    self.status = Some("Section created".to_string());
                }
            }
            ModalTarget::Edit(id) => {
                self.store
                    .update_section(&id, &SectionPatch::title_and_color(modal.title, modal.color));
            }
        }
    }

    pub(super) fn cancel_modal(&mut self) {
        self.modal = None;
        self.canvas.cancel_section();
    }
}
