//! The single authoritative document: sections, catalogs, filter state and
//! the icon-scale preset, with synchronous change notification.
//!
//! Every mutator that touches the template persists it and then notifies all
//! listeners in subscription order. References to unknown sections or icon
//! instances are silent no-ops; they return `false` and notify nobody.

use serde::Serialize;
use std::rc::Rc;

use crate::grid::{self, IconScale};
use crate::migrate;
use crate::model::{
    CategoryFilter, Cell, Icon, QUANTITY_MIN, QuantityPreset, Section, SectionIcon, SectionPatch,
    Subtype, Template,
};
use crate::storage::{ICON_SCALE_KEY, KeyValueStorage, TEMPLATE_KEY};

pub type Listener = Rc<dyn Fn(&Store)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Serialize)]
struct TemplateRef<'a> {
    sections: &'a [Section],
}

pub struct Store {
    icons: Vec<Icon>,
    subtypes: Vec<Subtype>,
    sections: Vec<Section>,
    category: CategoryFilter,
    search: String,
    icon_scale: IconScale,
    storage: Box<dyn KeyValueStorage>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            icons: Vec::new(),
            subtypes: Vec::new(),
            sections: Vec::new(),
            category: CategoryFilter::All,
            search: String::new(),
            icon_scale: IconScale::default(),
            storage,
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    // --- read access ---

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn subtypes(&self) -> &[Subtype] {
        &self.subtypes
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn icon_scale(&self) -> IconScale {
        self.icon_scale
    }

    pub fn template(&self) -> Template {
        Template {
            sections: self.sections.clone(),
        }
    }

    /// Catalog icons matching the category filter and the search text.
    ///
    /// Search is a case-insensitive substring match on display name or
    /// filename, ignoring surrounding whitespace.
    pub fn filtered_icons(&self) -> Vec<&Icon> {
        let query = self.search.trim().to_lowercase();
        self.icons
            .iter()
            .filter(|icon| self.category.matches(icon.category))
            .filter(|icon| {
                query.is_empty()
                    || icon.display_name.to_lowercase().contains(&query)
                    || icon.filename.to_lowercase().contains(&query)
            })
            .collect()
    }

    // --- subscription ---

    pub fn subscribe(&mut self, listener: impl Fn(&Store) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn emit(&self) {
        let listeners: Vec<Listener> = self.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in listeners {
            listener(self);
        }
    }

    fn commit(&mut self) {
        self.save();
        self.emit();
    }

    // --- catalog and filters ---

    pub fn set_icons(&mut self, icons: Vec<Icon>) {
        self.icons = icons;
        self.emit();
    }

    pub fn set_subtypes(&mut self, subtypes: Vec<Subtype>) {
        self.subtypes = subtypes;
        self.emit();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.emit();
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.emit();
    }

    pub fn set_icon_scale(&mut self, scale: IconScale) {
        self.icon_scale = scale;
        if let Err(e) = self.storage.set(ICON_SCALE_KEY, scale.name()) {
            log::warn!("failed to persist icon scale: {e:#}");
        }
        self.emit();
    }

    // --- sections ---

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
        self.commit();
    }

    pub fn update_section(&mut self, id: &str, patch: &SectionPatch) -> bool {
        let Some(section) = self.section_mut(id) else {
            return false;
        };
        section.apply(patch);
        self.commit();
        true
    }

    pub fn delete_section(&mut self, id: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.id != id);
        if self.sections.len() == before {
            return false;
        }
        self.commit();
        true
    }

    pub fn clear_sections(&mut self) {
        self.sections.clear();
        self.commit();
    }

    fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    // --- icons inside sections ---

    /// Places a new instance of `icon` and returns its instance id.
    ///
    /// Without a cell, the first free cell in row-major order across the
    /// section's current column capacity is used. A requested cell that is
    /// already taken falls back to the same search.
    pub fn add_icon_to_section(
        &mut self,
        section_id: &str,
        icon: &Icon,
        cell: Option<Cell>,
    ) -> Option<String> {
        let scale = self.icon_scale;
        let section = self.section_mut(section_id)?;
        let occupied = section.occupied_cells();
        let cell = match cell {
            Some(c) if !occupied.contains(&c) => c,
            _ => {
                let cols = grid::grid_dimensions(scale, section.width, section.height).cols;
                grid::first_free_cell(&occupied, cols)
            }
        };
        let placed = SectionIcon::from_icon(icon, cell);
        let id = placed.id.clone();
        section.icons.push(placed);
        self.commit();
        Some(id)
    }

    pub fn remove_icon_from_section(&mut self, section_id: &str, instance_id: &str) -> bool {
        let Some(section) = self.section_mut(section_id) else {
            return false;
        };
        let before = section.icons.len();
        section.icons.retain(|i| i.id != instance_id);
        if section.icons.len() == before {
            return false;
        }
        self.commit();
        true
    }

    fn edit_icon(
        &mut self,
        section_id: &str,
        instance_id: &str,
        edit: impl FnOnce(&mut SectionIcon),
    ) -> bool {
        let Some(icon) = self
            .section_mut(section_id)
            .and_then(|s| s.icon_mut(instance_id))
        else {
            return false;
        };
        edit(icon);
        self.commit();
        true
    }

    /// Sets an ordinary quantity, clamped to at least one.
    pub fn set_icon_quantity(&mut self, section_id: &str, instance_id: &str, value: i32) -> bool {
        self.edit_icon(section_id, instance_id, |icon| {
            icon.quantity = value.max(QUANTITY_MIN);
        })
    }

    /// Writes one of the sentinel quantities.
    pub fn set_icon_quantity_preset(
        &mut self,
        section_id: &str,
        instance_id: &str,
        preset: QuantityPreset,
    ) -> bool {
        self.edit_icon(section_id, instance_id, |icon| {
            icon.quantity = preset.value();
        })
    }

    /// Increments or decrements a quantity.
    ///
    /// Stepping up from a sentinel lands on one; stepping down never goes below one
    /// and leaves sentinels alone.
    pub fn step_icon_quantity(&mut self, section_id: &str, instance_id: &str, delta: i32) -> bool {
        self.edit_icon(section_id, instance_id, |icon| {
            let q = icon.quantity;
            icon.quantity = if delta > 0 {
                if q < QUANTITY_MIN { QUANTITY_MIN } else { q.saturating_add(delta) }
            } else if delta < 0 && q > QUANTITY_MIN {
                q.saturating_add(delta).max(QUANTITY_MIN)
            } else {
                q
            };
        })
    }

    pub fn set_icon_subtype(
        &mut self,
        section_id: &str,
        instance_id: &str,
        subtype: Option<String>,
    ) -> bool {
        self.edit_icon(section_id, instance_id, |icon| {
            icon.subtype = subtype;
        })
    }

    /// Rewrites the display order. Ids not present in the section are dropped,
    /// and the section keeps exactly the icons named in `ordered`.
    pub fn reorder_section_icons<S: AsRef<str>>(
        &mut self,
        section_id: &str,
        ordered: &[S],
    ) -> bool {
        let Some(section) = self.section_mut(section_id) else {
            return false;
        };
        let mut remaining = std::mem::take(&mut section.icons);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in ordered {
            if let Some(pos) = remaining.iter().position(|i| i.id == id.as_ref()) {
                reordered.push(remaining.swap_remove(pos));
            }
        }
        section.icons = reordered;
        self.commit();
        true
    }

    /// Moves an instance to `cell` within its section, swapping with any occupant.
    pub fn move_icon_to_grid_position(
        &mut self,
        section_id: &str,
        instance_id: &str,
        cell: Cell,
    ) -> bool {
        let Some(section) = self.section_mut(section_id) else {
            return false;
        };
        let Some(moving) = section.icons.iter().position(|i| i.id == instance_id) else {
            return false;
        };
        let from = section.icons[moving].cell();
        if let Some(occupant) = section
            .icons
            .iter()
            .position(|i| i.id != instance_id && i.cell() == cell)
        {
            section.icons[occupant].set_cell(from);
        }
        section.icons[moving].set_cell(cell);
        self.commit();
        true
    }

    /// Transfers an instance into another section at `cell`.
    ///
    /// An occupant of the destination cell is removed, not swapped back.
    /// Within a single section this is a grid move.
    pub fn move_icon_between_sections(
        &mut self,
        from_id: &str,
        to_id: &str,
        instance_id: &str,
        cell: Cell,
    ) -> bool {
        if from_id == to_id {
            return self.move_icon_to_grid_position(from_id, instance_id, cell);
        }
        if self.section(to_id).is_none() {
            return false;
        }
        let Some(source) = self.section_mut(from_id) else {
            return false;
        };
        let Some(pos) = source.icons.iter().position(|i| i.id == instance_id) else {
            return false;
        };
        let mut icon = source.icons.remove(pos);
        icon.set_cell(cell);
        if let Some(dest) = self.section_mut(to_id) {
            dest.icons.retain(|i| i.cell() != cell);
            dest.icons.push(icon);
        }
        self.commit();
        true
    }

    // --- persistence ---

    /// Writes the template to storage. Failures are logged, never raised.
    pub fn save(&mut self) {
        let text = match serde_json::to_string(&TemplateRef {
            sections: &self.sections,
        }) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("failed to serialize template: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.set(TEMPLATE_KEY, &text) {
            log::warn!("failed to persist template: {e:#}");
        }
    }

    /// Restores the icon scale and template from storage.
    ///
    /// Missing keys are a normal fresh start. Malformed data is logged and
    /// discarded, leaving the current document in place. Returns whether a
    /// template was applied.
    pub fn load(&mut self) -> bool {
        match self.storage.get(ICON_SCALE_KEY) {
            Ok(Some(name)) => match IconScale::from_name(&name) {
                Some(scale) => self.icon_scale = scale,
                None => log::warn!("ignoring unknown stored icon scale {name:?}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("failed to read icon scale: {e:#}"),
        }

        let text = match self.storage.get(TEMPLATE_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => {
                self.emit();
                return false;
            }
            Err(e) => {
                log::warn!("failed to read stored template: {e:#}");
                return false;
            }
        };
        match migrate::parse_template(&text, self.icon_scale) {
            Ok(template) => {
                self.sections = template.sections;
                self.emit();
                true
            }
            Err(e) => {
                log::warn!("discarding stored template: {e:#}");
                false
            }
        }
    }

    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&TemplateRef {
            sections: &self.sections,
        })
        .unwrap_or_else(|e| {
            log::warn!("failed to serialize template: {e}");
            String::from("{\n  \"sections\": []\n}")
        })
    }

    /// Replaces the document with `text`. Malformed input leaves the current
    /// document untouched. Returns whether the import was applied.
    pub fn import_json(&mut self, text: &str) -> bool {
        match migrate::parse_template(text, self.icon_scale) {
            Ok(template) => {
                self.sections = template.sections;
                self.commit();
                true
            }
            Err(e) => {
                log::warn!("ignoring malformed template import: {e:#}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IconCategory, Point};
    use crate::storage::MemoryStorage;
    use std::cell::RefCell;

    fn store() -> (Store, MemoryStorage) {
        let storage = MemoryStorage::new();
        (Store::new(Box::new(storage.clone())), storage)
    }

    fn icon(id: &str, name: &str, category: IconCategory) -> Icon {
        Icon {
            id: id.to_string(),
            filename: id.to_string(),
            display_name: name.to_string(),
            category,
            path: format!("assets/icons/{id}"),
        }
    }

    fn section(id: &str) -> Section {
        Section {
            id: id.to_string(),
            title: "Test".into(),
            color: "#ffffff".into(),
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 200.0,
            icons: Vec::new(),
        }
    }

    fn rifle() -> Icon {
        icon("rifle.png", "Fusil", IconCategory::SmallArms)
    }

    #[test]
    fn update_section_touches_only_given_fields() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        let patch = SectionPatch {
            title: Some("Vehicles".into()),
            x: Some(500.0),
            ..Default::default()
        };
        assert!(store.update_section("s1", &patch));
        let s = &store.sections()[0];
        assert_eq!(s.title, "Vehicles");
        assert_eq!(s.x, 500.0);
        assert_eq!(s.y, 0.0);
        assert_eq!(s.color, "#ffffff");
        assert!(!store.update_section("ghost", &patch));
    }

    #[test]
    fn delete_section_keeps_the_others() {
        let (mut store, _) = store();
        for id in ["a", "b", "c"] {
            store.add_section(section(id));
        }
        assert!(store.delete_section("b"));
        assert!(!store.delete_section("missing"));
        let ids: Vec<&str> = store.sections().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn add_icon_without_cell_takes_first_free_cell() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        for _ in 0..6 {
            store.add_icon_to_section("s1", &rifle(), None);
        }
        // 300 wide at medium scale: four columns
        let cells: Vec<Cell> = store.sections()[0].icons.iter().map(|i| i.cell()).collect();
        assert_eq!(
            cells,
            vec![
                Cell::new(0, 0),
                Cell::new(0, 1),
                Cell::new(0, 2),
                Cell::new(0, 3),
                Cell::new(1, 0),
                Cell::new(1, 1),
            ]
        );
        assert_eq!(store.sections()[0].icons[0].quantity, 1);
        assert_eq!(store.sections()[0].icons[0].icon_id, "rifle.png");
    }

    #[test]
    fn add_icon_at_explicit_cell() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        store.add_icon_to_section("s1", &rifle(), Some(Cell::new(2, 3)));
        assert_eq!(store.sections()[0].icons[0].cell(), Cell::new(2, 3));
        assert!(store.add_icon_to_section("ghost", &rifle(), None).is_none());
    }

    #[test]
    fn add_icon_onto_taken_cell_finds_another() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        store.add_icon_to_section("s1", &rifle(), Some(Cell::ORIGIN));
        store.add_icon_to_section("s1", &rifle(), Some(Cell::ORIGIN));
        let cells: Vec<Cell> = store.sections()[0].icons.iter().map(|i| i.cell()).collect();
        assert_eq!(cells, vec![Cell::ORIGIN, Cell::new(0, 1)]);
    }

    #[test]
    fn quantity_clamps_to_one() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        let id = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");
        store.set_icon_quantity("s1", &id, 5);
        assert_eq!(store.sections()[0].icons[0].quantity, 5);
        store.set_icon_quantity("s1", &id, 0);
        assert_eq!(store.sections()[0].icons[0].quantity, 1);
        store.set_icon_quantity("s1", &id, -10);
        assert_eq!(store.sections()[0].icons[0].quantity, 1);
    }

    #[test]
    fn quantity_presets_and_steps() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        let id = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");
        let quantity = |store: &Store| store.sections()[0].icons[0].quantity;

        store.step_icon_quantity("s1", &id, -1);
        assert_eq!(quantity(&store), 1);
        store.step_icon_quantity("s1", &id, 1);
        store.step_icon_quantity("s1", &id, 1);
        assert_eq!(quantity(&store), 3);

        store.set_icon_quantity_preset("s1", &id, QuantityPreset::NotNeeded);
        assert_eq!(quantity(&store), 0);
        store.step_icon_quantity("s1", &id, -1);
        assert_eq!(quantity(&store), 0);
        store.set_icon_quantity_preset("s1", &id, QuantityPreset::Unspecified);
        assert_eq!(quantity(&store), -1);
        store.step_icon_quantity("s1", &id, 1);
        assert_eq!(quantity(&store), 1);
    }

    #[test]
    fn subtype_set_and_cleared() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        let id = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");
        store.set_icon_subtype("s1", &id, Some("assets/icons/subtypes/veteran.png".into()));
        assert_eq!(
            store.sections()[0].icons[0].subtype.as_deref(),
            Some("assets/icons/subtypes/veteran.png")
        );
        store.set_icon_subtype("s1", &id, None);
        assert_eq!(store.sections()[0].icons[0].subtype, None);
    }

    #[test]
    fn remove_icon() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        let id = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");
        assert!(!store.remove_icon_from_section("s1", "ghost"));
        assert!(store.remove_icon_from_section("s1", &id));
        assert!(store.sections()[0].icons.is_empty());
    }

    #[test]
    fn reorder_filters_unknown_ids() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        let a = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");
        let b = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");
        let c = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");

        store.reorder_section_icons("s1", &[c.as_str(), a.as_str(), b.as_str()]);
        let ids: Vec<&str> = store.sections()[0].icons.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, [c.as_str(), a.as_str(), b.as_str()]);

        store.reorder_section_icons("s1", &["ghost-id", a.as_str(), a.as_str()]);
        let ids: Vec<&str> = store.sections()[0].icons.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, [a.as_str()]);

        assert!(!store.reorder_section_icons("ghost", &[a.as_str()]));
        assert_eq!(store.sections()[0].icons.len(), 1);
    }

    #[test]
    fn grid_move_swaps_with_occupant() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        let a = store
            .add_icon_to_section("s1", &rifle(), Some(Cell::new(0, 0)))
            .expect("section exists");
        let b = store
            .add_icon_to_section("s1", &rifle(), Some(Cell::new(1, 1)))
            .expect("section exists");

        assert!(store.move_icon_to_grid_position("s1", &a, Cell::new(1, 1)));
        let s = &store.sections()[0];
        assert_eq!(s.icon(&a).map(|i| i.cell()), Some(Cell::new(1, 1)));
        assert_eq!(s.icon(&b).map(|i| i.cell()), Some(Cell::new(0, 0)));

        assert!(store.move_icon_to_grid_position("s1", &a, Cell::new(2, 3)));
        assert_eq!(store.sections()[0].icon(&a).map(|i| i.cell()), Some(Cell::new(2, 3)));
        assert!(!store.move_icon_to_grid_position("s1", "ghost", Cell::ORIGIN));
    }

    #[test]
    fn cross_section_move_displaces_occupant() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        store.add_section(section("s2"));
        let a = store
            .add_icon_to_section("s1", &rifle(), Some(Cell::new(0, 0)))
            .expect("section exists");
        store.add_icon_to_section("s2", &rifle(), Some(Cell::new(1, 1)));

        assert!(store.move_icon_between_sections("s1", "s2", &a, Cell::new(1, 1)));
        assert!(store.sections()[0].icons.is_empty());
        let dest = &store.sections()[1].icons;
        assert_eq!(dest.len(), 1);
        assert_eq!(dest[0].id, a);
        assert_eq!(dest[0].cell(), Cell::new(1, 1));
    }

    #[test]
    fn cross_section_move_with_unknown_refs_is_noop() {
        let (mut store, _) = store();
        store.add_section(section("s1"));
        store.add_section(section("s2"));
        let a = store.add_icon_to_section("s1", &rifle(), None).expect("section exists");

        assert!(!store.move_icon_between_sections("ghost", "s2", &a, Cell::ORIGIN));
        assert!(!store.move_icon_between_sections("s1", "s2", "ghost", Cell::ORIGIN));
        assert!(!store.move_icon_between_sections("s1", "ghost", &a, Cell::ORIGIN));
        assert_eq!(store.sections()[0].icons.len(), 1);
        assert!(store.sections()[1].icons.is_empty());
    }

    #[test]
    fn filter_composition() {
        let (mut store, _) = store();
        store.set_icons(vec![
            icon("rifle.png", "Fusil", IconCategory::SmallArms),
            icon("tank.png", "Tank Lourd", IconCategory::Vehicles),
            icon("grenade.png", "Grenade à main", IconCategory::SmallArms),
        ]);
        assert_eq!(store.filtered_icons().len(), 3);

        store.set_category(CategoryFilter::Only(IconCategory::SmallArms));
        store.set_search("fusil");
        let names: Vec<&str> = store
            .filtered_icons()
            .into_iter()
            .map(|i| i.display_name.as_str())
            .collect();
        assert_eq!(names, ["Fusil"]);

        store.set_category(CategoryFilter::All);
        store.set_search("  TANK  ");
        let names: Vec<&str> = store
            .filtered_icons()
            .into_iter()
            .map(|i| i.display_name.as_str())
            .collect();
        assert_eq!(names, ["Tank Lourd"]);

        store.set_search("grenade.png");
        assert_eq!(store.filtered_icons().len(), 1);
    }

    #[test]
    fn mutations_persist_template() -> anyhow::Result<()> {
        let (mut store, storage) = store();
        store.add_section(section("s1"));
        let saved = storage.get(TEMPLATE_KEY)?.expect("template saved");
        let value: serde_json::Value = serde_json::from_str(&saved)?;
        assert_eq!(value["sections"][0]["id"], "s1");
        Ok(())
    }

    #[test]
    fn load_restores_scale_and_sections() -> anyhow::Result<()> {
        let (mut store, storage) = store();
        let mut writer = storage.clone();
        writer.set(ICON_SCALE_KEY, "large")?;
        writer.set(
            TEMPLATE_KEY,
            r##"{"sections":[{"id":"loaded","title":"Chargé","color":"#f00","x":50,"y":50,"width":200,"height":150,"icons":[]}]}"##,
        )?;
        assert!(store.load());
        assert_eq!(store.icon_scale(), IconScale::Large);
        assert_eq!(store.sections()[0].title, "Chargé");
        Ok(())
    }

    #[test]
    fn load_places_legacy_icons_at_the_stored_scale() -> anyhow::Result<()> {
        let (mut store, storage) = store();
        let mut writer = storage.clone();
        writer.set(ICON_SCALE_KEY, "large")?;
        // 270 wide leaves 254px of grid: three large columns, four medium ones
        writer.set(
            TEMPLATE_KEY,
            r##"{"sections":[{"id":"old","title":"Ancien","color":"#6b5234",
                "x":0,"y":0,"width":270,"height":300,
                "icons":[
                    {"id":"a","iconId":"rifle.png","filename":"rifle.png","path":"/rifle.png"},
                    {"id":"b","iconId":"tank.png","filename":"tank.png","path":"/tank.png",
                     "gridRow":0,"gridCol":1},
                    {"id":"c","iconId":"ammo.png","filename":"ammo.png","path":"/ammo.png"},
                    {"id":"d","iconId":"fuel.png","filename":"fuel.png","path":"/fuel.png"},
                    {"id":"e","iconId":"med.png","filename":"med.png","path":"/med.png"}
                ]}]}"##,
        )?;
        assert!(store.load());
        assert_eq!(store.icon_scale(), IconScale::Large);
        let cells: Vec<(&str, Cell)> = store.sections()[0]
            .icons
            .iter()
            .map(|i| (i.id.as_str(), i.cell()))
            .collect();
        assert_eq!(
            cells,
            [
                ("a", Cell::new(0, 0)),
                ("b", Cell::new(0, 1)),
                ("c", Cell::new(0, 2)),
                ("d", Cell::new(1, 0)),
                ("e", Cell::new(1, 1)),
            ]
        );
        Ok(())
    }

    #[test]
    fn load_ignores_corrupted_storage() -> anyhow::Result<()> {
        let (mut store, storage) = store();
        store.add_section(section("keep"));
        let mut writer = storage.clone();
        writer.set(TEMPLATE_KEY, "not valid json{")?;
        writer.set(ICON_SCALE_KEY, "gigantic")?;
        assert!(!store.load());
        assert_eq!(store.sections().len(), 1);
        assert_eq!(store.icon_scale(), IconScale::Medium);
        Ok(())
    }

    #[test]
    fn empty_storage_is_a_fresh_start() {
        let (mut store, _) = store();
        assert!(!store.load());
        assert!(store.sections().is_empty());
        assert_eq!(store.icon_scale(), IconScale::Medium);
    }

    #[test]
    fn set_icon_scale_persists() -> anyhow::Result<()> {
        let (mut store, storage) = store();
        store.set_icon_scale(IconScale::Small);
        assert_eq!(storage.get(ICON_SCALE_KEY)?.as_deref(), Some("small"));
        assert_eq!(store.icon_scale(), IconScale::Small);
        Ok(())
    }

    #[test]
    fn import_rejects_garbage_without_losing_state() {
        let (mut store, _) = store();
        store.add_section(section("keep"));
        assert!(!store.import_json("not valid json{"));
        assert_eq!(store.sections()[0].id, "keep");
    }

    #[test]
    fn export_then_import_round_trips() {
        let (mut store, _) = store();
        let mut s = Section::new("Roundtrip", "#ef4444", Point::new(150.0, 250.0));
        s.width = 350.0;
        s.height = 280.0;
        store.add_section(s);
        let id = store.sections()[0].id.clone();
        let icon_id = store.add_icon_to_section(&id, &rifle(), None).expect("section exists");
        store.set_icon_subtype(&id, &icon_id, Some("assets/icons/subtypes/a.png".into()));
        store.set_icon_quantity_preset(&id, &icon_id, QuantityPreset::Unspecified);
        let before = store.template();

        let exported = store.export_json();
        let (mut fresh, _) = self::store();
        assert!(fresh.import_json(&exported));
        assert_eq!(fresh.template(), before);
    }

    #[test]
    fn listeners_run_in_order_and_unsubscribe() {
        let (mut store, _) = store();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let first = Rc::clone(&log);
        let id = store.subscribe(move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        store.subscribe(move |s| {
            assert_eq!(s.search(), s.search().trim_end());
            second.borrow_mut().push("second");
        });

        store.set_search("test");
        assert_eq!(*log.borrow(), ["first", "second"]);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_search("other");
        assert_eq!(*log.borrow(), ["first", "second", "second"]);
    }

    #[test]
    fn listener_sees_completed_state() {
        let (mut store, _) = store();
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        store.subscribe(move |s| *sink.borrow_mut() = s.sections().len());
        store.add_section(section("s1"));
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn unknown_ids_do_not_notify() {
        let (mut store, _) = store();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        store.subscribe(move |_| *sink.borrow_mut() += 1);
        store.delete_section("ghost");
        store.set_icon_quantity("ghost", "ghost", 3);
        assert_eq!(*count.borrow(), 0);
    }
}
