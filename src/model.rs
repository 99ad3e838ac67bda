use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_SECTION_WIDTH: f32 = 200.0;
pub const DEFAULT_SECTION_HEIGHT: f32 = 150.0;
pub const MIN_SECTION_WIDTH: f32 = 100.0;
pub const MIN_SECTION_HEIGHT: f32 = 60.0;
pub const DEFAULT_SECTION_TITLE: &str = "Section";

/// Colors offered when creating or editing a section.
pub const SECTION_COLORS: [&str; 16] = [
    "#8b7d3a", "#6b5234", "#8b3538", "#3d5a80", "#5c4a6e", "#a08b3a", "#4a3728", "#b84545",
    "#2d4a6b", "#7c5a9e", "#d4a534", "#e67e22", "#27ae60", "#16a085", "#95a5a6", "#34495e",
];

/// Quantity meaning "marked not needed", shown as a star badge.
pub const QUANTITY_NOT_NEEDED: i32 = 0;
/// Quantity meaning "unspecified / variable", shown as a question-mark badge.
pub const QUANTITY_UNSPECIFIED: i32 = -1;
/// Lowest ordinary quantity. Plain quantity edits never go below it.
pub const QUANTITY_MIN: i32 = 1;

/// Collision-resistant identifier for sections and placed icons.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

/// A `(row, col)` address inside a section's placement grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub const ORIGIN: Cell = Cell { row: 0, col: 0 };

    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IconCategory {
    #[serde(rename = "Small Arms")]
    SmallArms,
    #[serde(rename = "Heavy Arms")]
    HeavyArms,
    #[serde(rename = "Heavy Ammunition")]
    HeavyAmmunition,
    Utility,
    Medical,
    Resources,
    Uniforms,
    Vehicles,
    #[serde(rename = "Field Weapons")]
    FieldWeapons,
    Structures,
    Naval,
    Trains,
    Planes,
}

impl IconCategory {
    pub const ALL: [IconCategory; 13] = [
        IconCategory::SmallArms,
        IconCategory::HeavyArms,
        IconCategory::HeavyAmmunition,
        IconCategory::Utility,
        IconCategory::Medical,
        IconCategory::Resources,
        IconCategory::Uniforms,
        IconCategory::Vehicles,
        IconCategory::FieldWeapons,
        IconCategory::Structures,
        IconCategory::Naval,
        IconCategory::Trains,
        IconCategory::Planes,
    ];

    /// Category assigned to catalog icons missing from the category map.
    pub const FALLBACK: IconCategory = IconCategory::Resources;

    pub fn label(self) -> &'static str {
        match self {
            IconCategory::SmallArms => "Small Arms",
            IconCategory::HeavyArms => "Heavy Arms",
            IconCategory::HeavyAmmunition => "Heavy Ammunition",
            IconCategory::Utility => "Utility",
            IconCategory::Medical => "Medical",
            IconCategory::Resources => "Resources",
            IconCategory::Uniforms => "Uniforms",
            IconCategory::Vehicles => "Vehicles",
            IconCategory::FieldWeapons => "Field Weapons",
            IconCategory::Structures => "Structures",
            IconCategory::Naval => "Naval",
            IconCategory::Trains => "Trains",
            IconCategory::Planes => "Planes",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

/// Category selection in the catalog sidebar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(IconCategory),
}

impl CategoryFilter {
    pub fn matches(self, category: IconCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(c) => c.label(),
        }
    }
}

/// Catalog entry. Loaded once at startup and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    pub id: String,
    pub filename: String,
    pub display_name: String,
    pub category: IconCategory,
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subtype {
    pub filename: String,
    pub display_name: String,
    pub path: String,
}

/// One placed instance of a catalog icon inside a section.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionIcon {
    pub id: String,
    pub icon_id: String,
    pub filename: String,
    pub path: String,
    pub quantity: i32,
    pub grid_row: u32,
    pub grid_col: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl SectionIcon {
    pub fn from_icon(icon: &Icon, cell: Cell) -> Self {
        Self {
            id: generate_id(),
            icon_id: icon.id.clone(),
            filename: icon.filename.clone(),
            path: icon.path.clone(),
            quantity: QUANTITY_MIN,
            grid_row: cell.row,
            grid_col: cell.col,
            subtype: None,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.grid_row, self.grid_col)
    }

    pub fn set_cell(&mut self, cell: Cell) {
        self.grid_row = cell.row;
        self.grid_col = cell.col;
    }

    pub fn badge(&self) -> QuantityBadge {
        QuantityBadge::for_quantity(self.quantity)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub color: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub icons: Vec<SectionIcon>,
}

impl Section {
    /// A fresh, empty section of the default size with its top-left corner at `pos`.
    pub fn new(title: impl Into<String>, color: impl Into<String>, pos: Point) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_SECTION_TITLE.to_string()
        } else {
            title.trim().to_string()
        };
        Self {
            id: generate_id(),
            title,
            color: color.into(),
            x: pos.x,
            y: pos.y,
            width: DEFAULT_SECTION_WIDTH,
            height: DEFAULT_SECTION_HEIGHT,
            icons: Vec::new(),
        }
    }

    pub fn icon(&self, instance_id: &str) -> Option<&SectionIcon> {
        self.icons.iter().find(|i| i.id == instance_id)
    }

    pub fn icon_mut(&mut self, instance_id: &str) -> Option<&mut SectionIcon> {
        self.icons.iter_mut().find(|i| i.id == instance_id)
    }

    pub fn occupied_cells(&self) -> HashSet<Cell> {
        self.icons.iter().map(SectionIcon::cell).collect()
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Applies every field present in `patch`.
    pub fn apply(&mut self, patch: &SectionPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
    }
}

/// Partial section update. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub color: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl SectionPatch {
    pub fn position(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Default::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width.max(MIN_SECTION_WIDTH)),
            height: Some(height.max(MIN_SECTION_HEIGHT)),
            ..Default::default()
        }
    }

    pub fn title_and_color(title: impl Into<String>, color: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_SECTION_TITLE.to_string()
        } else {
            title.trim().to_string()
        };
        Self {
            title: Some(title),
            color: Some(color.into()),
            ..Default::default()
        }
    }
}

/// The whole unit of persistence. Catalogs are not part of it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Template {
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Quantities reachable only through the dedicated preset controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantityPreset {
    NotNeeded,
    Unspecified,
}

impl QuantityPreset {
    pub fn value(self) -> i32 {
        match self {
            QuantityPreset::NotNeeded => QUANTITY_NOT_NEEDED,
            QuantityPreset::Unspecified => QUANTITY_UNSPECIFIED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantityBadge {
    None,
    Count(i32),
    NotNeeded,
    Unspecified,
}

impl QuantityBadge {
    pub fn for_quantity(quantity: i32) -> Self {
        match quantity {
            QUANTITY_NOT_NEEDED => QuantityBadge::NotNeeded,
            QUANTITY_UNSPECIFIED => QuantityBadge::Unspecified,
            q if q > 1 => QuantityBadge::Count(q),
            _ => QuantityBadge::None,
        }
    }

    pub fn text(self) -> Option<String> {
        match self {
            QuantityBadge::None => None,
            QuantityBadge::Count(q) => Some(q.to_string()),
            QuantityBadge::NotNeeded => Some("★".to_string()),
            QuantityBadge::Unspecified => Some("?".to_string()),
        }
    }
}

/// Parses a `#rrggbb` color. Anything else yields `None`.
pub fn parse_hex_color(hex: &str) -> Option<egui::Color32> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(egui::Color32::from_rgb(r, g, b))
}
