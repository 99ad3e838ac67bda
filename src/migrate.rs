//! Upgrade of persisted templates to the current grid-placement schema.
//!
//! Documents written before grid placement carry icons without `gridRow` /
//! `gridCol`. Those icons get row-major positions that never collide with
//! icons that already have valid coordinates.

use anyhow::Context;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

use crate::grid::{self, IconScale};
use crate::model::{
    self, Cell, DEFAULT_SECTION_HEIGHT, DEFAULT_SECTION_TITLE, DEFAULT_SECTION_WIDTH, QUANTITY_MIN,
    Section, SectionIcon, Template,
};

/// Known shapes of a persisted template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schema {
    /// At least one icon lacks numeric grid coordinates.
    Legacy,
    /// Every icon carries grid coordinates.
    Grid,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoredTemplate {
    #[serde(default)]
    pub sections: Option<Vec<StoredSection>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StoredSection {
    #[serde(default = "model::generate_id")]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default)]
    pub icons: Option<Vec<StoredSectionIcon>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSectionIcon {
    #[serde(default = "model::generate_id")]
    pub id: String,
    #[serde(default)]
    pub icon_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default, deserialize_with = "lenient_coord")]
    pub grid_row: Option<u32>,
    #[serde(default, deserialize_with = "lenient_coord")]
    pub grid_col: Option<u32>,
    #[serde(default)]
    pub subtype: Option<String>,
}

fn default_title() -> String {
    DEFAULT_SECTION_TITLE.to_string()
}

fn default_color() -> String {
    model::SECTION_COLORS[0].to_string()
}

fn default_width() -> f32 {
    DEFAULT_SECTION_WIDTH
}

fn default_height() -> f32 {
    DEFAULT_SECTION_HEIGHT
}

fn default_quantity() -> i32 {
    QUANTITY_MIN
}

/// Accepts any JSON value; only non-negative integral numbers count as a coordinate.
fn lenient_coord<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        let n = v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })?;
        u32::try_from(n).ok()
    }))
}

impl StoredSectionIcon {
    fn cell(&self) -> Option<Cell> {
        Some(Cell::new(self.grid_row?, self.grid_col?))
    }
}

impl StoredTemplate {
    pub fn schema(&self) -> Schema {
        let legacy = self.sections.iter().flatten().any(|s| {
            s.icons
                .iter()
                .flatten()
                .any(|i| i.cell().is_none())
        });
        if legacy { Schema::Legacy } else { Schema::Grid }
    }
}

/// Parses template text of any known schema and upgrades it.
pub fn parse_template(text: &str, scale: IconScale) -> anyhow::Result<Template> {
    let stored = serde_json::from_str::<StoredTemplate>(text).context("parse template json")?;
    Ok(upgrade_template(stored, scale))
}

pub fn upgrade_template(stored: StoredTemplate, scale: IconScale) -> Template {
    if stored.schema() == Schema::Legacy {
        log::info!("placing legacy icons on the grid at {} scale", scale.name());
    }
    Template {
        sections: stored
            .sections
            .unwrap_or_default()
            .into_iter()
            .map(|s| upgrade_section(s, scale))
            .collect(),
    }
}

/// Assigns positions to icons without valid coordinates.
///
/// Column capacity comes from the stored width. An icon whose coordinates
/// repeat a cell already claimed earlier in the list is placed again as well.
pub fn upgrade_section(stored: StoredSection, scale: IconScale) -> Section {
    let cols = grid::grid_dimensions(scale, stored.width, stored.height).cols;
    let icons = stored.icons.unwrap_or_default();

    let mut claimed: HashSet<Cell> = HashSet::new();
    let keep: Vec<Option<Cell>> = icons
        .iter()
        .map(|icon| icon.cell().filter(|cell| claimed.insert(*cell)))
        .collect();

    let icons = icons
        .into_iter()
        .zip(keep)
        .map(|(icon, cell)| {
            let cell = cell.unwrap_or_else(|| {
                let free = grid::first_free_cell(&claimed, cols);
                claimed.insert(free);
                free
            });
            SectionIcon {
                id: icon.id,
                icon_id: icon.icon_id,
                filename: icon.filename,
                path: icon.path,
                quantity: icon.quantity,
                grid_row: cell.row,
                grid_col: cell.col,
                subtype: icon.subtype,
            }
        })
        .collect();

    Section {
        id: stored.id,
        title: stored.title,
        color: stored.color,
        x: stored.x,
        y: stored.y,
        width: stored.width,
        height: stored.height,
        icons,
    }
}
