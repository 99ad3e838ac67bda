//! Read-only icon and subtype catalogs loaded from JSON maps at startup.
//!
//! Loading never fails: unreadable or malformed files are logged and yield an
//! empty list so the store always starts with some catalog.

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::{Icon, IconCategory, Subtype};

/// Key prefix marking annotation entries inside the mapping files.
pub const COMMENT_PREFIX: &str = "_comment";

/// Where the three mapping files and the icon images live.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogSources {
    pub assets_dir: PathBuf,
    pub icon_mapping: PathBuf,
    pub category_mapping: PathBuf,
    pub subtype_mapping: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    pub icons: Vec<Icon>,
    pub subtypes: Vec<Subtype>,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryEntry {
    #[serde(default)]
    items: Vec<String>,
}

fn is_comment(key: &str) -> bool {
    key.starts_with(COMMENT_PREFIX)
}

/// Display-name map (`filename -> display name`), comments removed, file order kept.
fn parse_name_map(text: &str) -> anyhow::Result<Vec<(String, String)>> {
    let map: Map<String, Value> = serde_json::from_str(text).context("parse name map")?;
    Ok(map
        .into_iter()
        .filter(|(key, _)| !is_comment(key))
        .filter_map(|(key, value)| match value {
            Value::String(name) => Some((key, name)),
            other => {
                log::warn!("ignoring non-text display name for {key}: {other}");
                None
            }
        })
        .collect())
}

/// Builds a `filename -> category` lookup from `{category: {items: [...]}}`.
pub fn parse_category_map(text: &str) -> anyhow::Result<HashMap<String, IconCategory>> {
    let map: Map<String, Value> = serde_json::from_str(text).context("parse category map")?;
    let mut lookup = HashMap::new();
    for (label, entry) in map {
        if is_comment(&label) {
            continue;
        }
        let Some(category) = IconCategory::from_label(&label) else {
            log::warn!("ignoring unknown category {label:?}");
            continue;
        };
        let entry: CategoryEntry = serde_json::from_value(entry)
            .with_context(|| format!("parse items of category {label:?}"))?;
        for filename in entry.items {
            lookup.insert(filename, category);
        }
    }
    Ok(lookup)
}

pub fn icon_path(assets_dir: &Path, filename: &str) -> String {
    assets_dir
        .join("icons")
        .join(filename)
        .to_string_lossy()
        .into_owned()
}

pub fn subtype_path(assets_dir: &Path, filename: &str) -> String {
    assets_dir
        .join("icons")
        .join("subtypes")
        .join(filename)
        .to_string_lossy()
        .into_owned()
}

pub fn parse_icons(
    names: &str,
    categories: &HashMap<String, IconCategory>,
    assets_dir: &Path,
) -> anyhow::Result<Vec<Icon>> {
    Ok(parse_name_map(names)?
        .into_iter()
        .map(|(filename, display_name)| {
            let category = categories.get(&filename).copied().unwrap_or_else(|| {
                log::warn!(
                    "{filename} has no category, using {}",
                    IconCategory::FALLBACK.label()
                );
                IconCategory::FALLBACK
            });
            Icon {
                id: filename.clone(),
                path: icon_path(assets_dir, &filename),
                filename,
                display_name,
                category,
            }
        })
        .collect())
}

pub fn parse_subtypes(names: &str, assets_dir: &Path) -> anyhow::Result<Vec<Subtype>> {
    Ok(parse_name_map(names)?
        .into_iter()
        .map(|(filename, display_name)| Subtype {
            path: subtype_path(assets_dir, &filename),
            filename,
            display_name,
        })
        .collect())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn try_load_icons(sources: &CatalogSources) -> anyhow::Result<Vec<Icon>> {
    let categories = match read(&sources.category_mapping).and_then(|t| parse_category_map(&t)) {
        Ok(lookup) => lookup,
        Err(e) => {
            log::warn!("category map unavailable: {e:#}");
            HashMap::new()
        }
    };
    parse_icons(&read(&sources.icon_mapping)?, &categories, &sources.assets_dir)
}

/// Loads the icon catalog; any failure yields an empty list.
pub fn load_icons(sources: &CatalogSources) -> Vec<Icon> {
    try_load_icons(sources).unwrap_or_else(|e| {
        log::warn!("icon catalog unavailable: {e:#}");
        Vec::new()
    })
}

/// Loads the subtype catalog; any failure yields an empty list.
pub fn load_subtypes(sources: &CatalogSources) -> Vec<Subtype> {
    read(&sources.subtype_mapping)
        .and_then(|text| parse_subtypes(&text, &sources.assets_dir))
        .unwrap_or_else(|e| {
            log::warn!("subtype catalog unavailable: {e:#}");
            Vec::new()
        })
}

impl Catalog {
    pub fn load(sources: &CatalogSources) -> Self {
        let catalog = Self {
            icons: load_icons(sources),
            subtypes: load_subtypes(sources),
        };
        log::info!(
            "catalog loaded: {} icons, {} subtypes",
            catalog.icons.len(),
            catalog.subtypes.len()
        );
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATEGORIES: &str = r#"{
        "_comment": "grouping used by the sidebar",
        "Small Arms": { "_comment": "rifles", "items": ["rifle.png", "pistol.png"] },
        "Vehicles": { "items": ["tank.png", "VehicleIcons/halftrack.png"] }
    }"#;

    #[test]
    fn icons_get_categories_and_paths() -> anyhow::Result<()> {
        let lookup = parse_category_map(CATEGORIES)?;
        let names = r#"{"rifle.png":"Fusil","pistol.png":"Pistolet","tank.png":"Tank Lourd"}"#;
        let icons = parse_icons(names, &lookup, Path::new("assets"))?;
        assert_eq!(icons.len(), 3);
        let rifle = &icons[0];
        assert_eq!(rifle.id, "rifle.png");
        assert_eq!(rifle.display_name, "Fusil");
        assert_eq!(rifle.category, IconCategory::SmallArms);
        assert_eq!(icons[2].category, IconCategory::Vehicles);
        assert!(rifle.path.ends_with("rifle.png"));
        assert!(rifle.path.starts_with("assets"));
        Ok(())
    }

    #[test]
    fn comment_keys_are_skipped() -> anyhow::Result<()> {
        let lookup = parse_category_map(CATEGORIES)?;
        let names = r#"{"_comment_1":"note","_comment":"x","rifle.png":"Fusil"}"#;
        let icons = parse_icons(names, &lookup, Path::new("assets"))?;
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].display_name, "Fusil");
        Ok(())
    }

    #[test]
    fn unmapped_icon_falls_back() -> anyhow::Result<()> {
        let lookup = parse_category_map(CATEGORIES)?;
        let names = r#"{"unknown.png":"Icône Inconnue"}"#;
        let icons = parse_icons(names, &lookup, Path::new("assets"))?;
        assert_eq!(icons[0].category, IconCategory::Resources);
        Ok(())
    }

    #[test]
    fn nested_filenames_keep_their_folder() -> anyhow::Result<()> {
        let lookup = parse_category_map(CATEGORIES)?;
        let names = r#"{"VehicleIcons/halftrack.png":"Halftrack"}"#;
        let icons = parse_icons(names, &lookup, Path::new("assets"))?;
        assert!(icons[0].path.contains("VehicleIcons"));
        assert!(icons[0].path.ends_with("halftrack.png"));
        assert_eq!(icons[0].category, IconCategory::Vehicles);
        Ok(())
    }

    #[test]
    fn subtypes_resolve_under_subtypes_dir() -> anyhow::Result<()> {
        let subtypes = parse_subtypes(
            r#"{"veteran.png":"Vétéran","elite.png":"Élite"}"#,
            Path::new("assets"),
        )?;
        assert_eq!(subtypes.len(), 2);
        assert_eq!(subtypes[0].filename, "veteran.png");
        assert_eq!(subtypes[0].display_name, "Vétéran");
        assert!(subtypes[0].path.contains("subtypes"));
        assert!(parse_subtypes("{}", Path::new("assets"))?.is_empty());
        Ok(())
    }

    #[test]
    fn missing_files_give_empty_catalog() {
        let missing = PathBuf::from("definitely/not/here");
        let sources = CatalogSources {
            assets_dir: missing.clone(),
            icon_mapping: missing.join("iconMapping.json"),
            category_mapping: missing.join("categoryMapping.json"),
            subtype_mapping: missing.join("subtypeMapping.json"),
        };
        assert_eq!(Catalog::load(&sources), Catalog::default());
    }

    #[test]
    fn malformed_maps_are_errors() {
        assert!(parse_category_map("[1, 2]").is_err());
        assert!(parse_subtypes("nope", Path::new("assets")).is_err());
    }
}
