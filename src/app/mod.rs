use eframe::egui;
use std::cell::Cell;
use std::rc::Rc;

use stockpiler::canvas::{CanvasController, GestureKind};
use stockpiler::catalog::Catalog;
use stockpiler::model::{self, QuantityPreset};
use stockpiler::placement::DragPayload;
use stockpiler::settings::{self, AppSettings};
use stockpiler::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use stockpiler::store::Store;

mod actions;
mod help;
mod render;
mod textures;
mod update;

#[derive(Clone, Debug, PartialEq)]
enum ModalTarget {
    Create,
    Edit(String),
}

/// Create/edit dialog for a section's title and color.
#[derive(Clone, Debug)]
struct SectionModal {
    target: ModalTarget,
    title: String,
    color: String,
}

impl SectionModal {
    fn create() -> Self {
        Self {
            target: ModalTarget::Create,
            title: String::new(),
            color: model::SECTION_COLORS[0].to_string(),
        }
    }

    fn edit(section: &model::Section) -> Self {
        Self {
            target: ModalTarget::Edit(section.id.clone()),
            title: section.title.clone(),
            color: section.color.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum IconEdit {
    Set(i32),
    Step(i32),
    Preset(QuantityPreset),
    Subtype(Option<String>),
    Remove,
}

/// Collected while drawing, applied once the frame's borrows are released.
#[derive(Clone, Debug, PartialEq)]
enum CanvasAction {
    BeginDrag(DragPayload),
    BeginGesture(String, GestureKind),
    Gesture(egui::Vec2),
    EndGesture,
    EditSection(String),
    DeleteSection(String),
    Icon {
        section_id: String,
        instance_id: String,
        edit: IconEdit,
    },
}

pub struct StockpileApp {
    store: Store,
    canvas: CanvasController,
    settings: AppSettings,
    settings_path: String,
    textures: textures::TextureCache,
    dirty: Rc<Cell<bool>>,
    modal: Option<SectionModal>,
    confirm_clear: bool,
    status: Option<String>,
    show_help: bool,
}

impl StockpileApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (settings, settings_path) = settings::load_or_default();
        let mut status = None;
        let storage: Box<dyn KeyValueStorage> = match FileStorage::open(&settings.storage_dir) {
            Ok(storage) => {
                log::info!("local storage at {}", storage.dir().display());
                Box::new(storage)
            }
            Err(e) => {
                log::warn!("local storage unavailable, changes will not persist: {e:#}");
                status = Some("Local storage unavailable".to_string());
                Box::new(MemoryStorage::new())
            }
        };

        let mut store = Store::new(storage);
        let catalog = Catalog::load(&settings.catalog_sources());
        store.set_icons(catalog.icons);
        store.set_subtypes(catalog.subtypes);
        store.load();

        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        store.subscribe(move |_| flag.set(true));

        let mut canvas = CanvasController::new(settings.canvas_width, settings.canvas_height);
        canvas.sync(&store);

        Self {
            store,
            canvas,
            settings,
            settings_path,
            textures: textures::TextureCache::default(),
            dirty,
            modal: None,
            confirm_clear: false,
            status,
            show_help: false,
        }
    }

    /// Re-syncs section controllers after the store notified a change.
    fn sync_canvas(&mut self) {
        if self.dirty.replace(false) {
            for (id, plan) in self.canvas.sync(&self.store) {
                log::trace!("section {id} re-rendered: {plan:?}");
            }
        }
    }

    /// Starts a drag: the encoded payload rides on egui's drag-and-drop
    /// state, the decoded one drives hover feedback.
    fn start_drag(&mut self, ctx: &egui::Context, payload: DragPayload) {
        egui::DragAndDrop::set_payload(ctx, payload.encode());
        self.canvas.begin_drag(payload);
    }

    fn apply(&mut self, ctx: &egui::Context, action: CanvasAction) {
        match action {
            CanvasAction::BeginDrag(payload) => self.start_drag(ctx, payload),
            CanvasAction::BeginGesture(id, kind) => {
                self.canvas.begin_gesture(&id, kind);
            }
            CanvasAction::Gesture(delta) => self.canvas.drag_gesture(delta.x, delta.y),
            CanvasAction::EndGesture => {
                self.canvas.end_gesture(&mut self.store);
            }
            CanvasAction::EditSection(id) => {
                if let Some(section) = self.store.section(&id) {
                    self.modal = Some(SectionModal::edit(section));
                }
            }
            CanvasAction::DeleteSection(id) => {
                if self.store.delete_section(&id) {
                    self.status = Some("Section deleted".to_string());
                }
            }
            CanvasAction::Icon {
                section_id,
                instance_id,
                edit,
            } => {
                apply_icon_edit(&mut self.store, &section_id, &instance_id, edit);
            }
        }
    }
}

fn apply_icon_edit(
    store: &mut Store,
    section_id: &str,
    instance_id: &str,
    edit: IconEdit,
) -> bool {
    let (s, i) = (section_id, instance_id);
    match edit {
        IconEdit::Set(value) => store.set_icon_quantity(s, i, value),
        IconEdit::Step(delta) => store.step_icon_quantity(s, i, delta),
        IconEdit::Preset(preset) => store.set_icon_quantity_preset(s, i, preset),
        IconEdit::Subtype(subtype) => store.set_icon_subtype(s, i, subtype),
        IconEdit::Remove => store.remove_icon_from_section(s, i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpiler::model::{Icon, IconCategory, Point, Section};

    fn store_with_icon() -> (Store, String, String) {
        let mut store = Store::new(Box::new(MemoryStorage::new()));
        let section = Section::new("Dépôt", "#3d5a80", Point::new(0.0, 0.0));
        let section_id = section.id.clone();
        store.add_section(section);
        let shell = Icon {
            id: "shell.png".into(),
            filename: "shell.png".into(),
            display_name: "Obus 150mm".into(),
            category: IconCategory::HeavyAmmunition,
            path: "assets/icons/shell.png".into(),
        };
        let instance_id = store
            .add_icon_to_section(&section_id, &shell, None)
            .expect("section exists");
        (store, section_id, instance_id)
    }

    fn quantity(store: &Store, section_id: &str, instance_id: &str) -> Option<i32> {
        store
            .section(section_id)
            .and_then(|s| s.icon(instance_id))
            .map(|i| i.quantity)
    }

    #[test]
    fn typed_quantity_is_written_directly() {
        let (mut store, s, i) = store_with_icon();
        assert!(apply_icon_edit(&mut store, &s, &i, IconEdit::Set(250)));
        assert_eq!(quantity(&store, &s, &i), Some(250));
        assert!(apply_icon_edit(&mut store, &s, &i, IconEdit::Set(-4)));
        assert_eq!(quantity(&store, &s, &i), Some(model::QUANTITY_MIN));
    }

    #[test]
    fn typed_quantity_replaces_a_preset() {
        let (mut store, s, i) = store_with_icon();
        apply_icon_edit(&mut store, &s, &i, IconEdit::Preset(QuantityPreset::NotNeeded));
        apply_icon_edit(&mut store, &s, &i, IconEdit::Set(12));
        assert_eq!(quantity(&store, &s, &i), Some(12));
        assert!(!apply_icon_edit(&mut store, &s, "missing", IconEdit::Set(3)));
    }
}
