use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::CatalogSources;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub assets_dir: String,
    pub icon_mapping: String,
    pub category_mapping: String,
    pub subtype_mapping: String,
    pub storage_dir: String,
    pub export_path: String,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            icon_mapping: "iconMapping.json".to_string(),
            category_mapping: "categoryMapping.json".to_string(),
            subtype_mapping: "subtypeMapping.json".to_string(),
            storage_dir: default_storage_dir(),
            export_path: "template.json".to_string(),
            canvas_width: 1920.0,
            canvas_height: 1080.0,
        }
    }
}

fn default_storage_dir() -> String {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("stockpiler")
            .display()
            .to_string(),
        None => ".stockpiler".to_string(),
    }
}

impl AppSettings {
    pub fn catalog_sources(&self) -> CatalogSources {
        let assets = PathBuf::from(&self.assets_dir);
        CatalogSources {
            icon_mapping: assets.join(&self.icon_mapping),
            category_mapping: assets.join(&self.category_mapping),
            subtype_mapping: assets.join(&self.subtype_mapping),
            assets_dir: assets,
        }
    }
}

/// `$HOME/.config/stockpiler.toml` if it exists, else `settings.toml` if it exists.
pub fn config_path() -> Option<String> {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config").join("stockpiler.toml");
        if path.exists() {
            return Some(path.display().to_string());
        }
    }
    if Path::new("settings.toml").exists() {
        return Some("settings.toml".to_string());
    }
    None
}

/// Parses settings as TOML or JSON, trying the format the extension suggests first.
pub fn parse_settings(text: &str, path: &str) -> Option<AppSettings> {
    if path.ends_with(".toml") {
        toml::from_str::<AppSettings>(text)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(text).ok())
    } else {
        serde_json::from_str::<AppSettings>(text)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(text).ok())
    }
}

pub fn load_settings(path: &str) -> Option<AppSettings> {
    let text = std::fs::read_to_string(path).ok()?;
    let settings = parse_settings(&text, path);
    if settings.is_none() {
        log::warn!("ignoring unreadable settings file {path}");
    }
    settings
}

/// Settings from the usual locations, or defaults.
pub fn load_or_default() -> (AppSettings, String) {
    let path = config_path().unwrap_or_else(|| "settings.toml".to_string());
    let settings = load_settings(&path)
        .or_else(|| load_settings("settings.json"))
        .unwrap_or_default();
    (settings, path)
}

pub fn save_settings(path: &str, settings: &AppSettings) -> anyhow::Result<()> {
    let text = if path.ends_with(".toml") {
        toml::to_string_pretty(settings).context("encode settings as toml")?
    } else {
        serde_json::to_string_pretty(settings).context("encode settings as json")?
    };
    std::fs::write(path, text).with_context(|| format!("write {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let text = "assets_dir = \"/srv/icons\"\ncanvas_width = 2560.0\n";
        let settings = parse_settings(text, "a.toml");
        let settings = settings.unwrap_or_else(|| panic!("toml should parse"));
        assert_eq!(settings.assets_dir, "/srv/icons");
        assert_eq!(settings.canvas_width, 2560.0);
        assert_eq!(settings.canvas_height, 1080.0);
        assert_eq!(settings.icon_mapping, "iconMapping.json");
    }

    #[test]
    fn json_accepted_in_toml_file() {
        let settings = parse_settings(r#"{"export_path": "out.json"}"#, "settings.toml");
        assert_eq!(settings.map(|s| s.export_path), Some("out.json".to_string()));
        assert_eq!(parse_settings("[[[", "settings.toml"), None);
    }

    #[test]
    fn catalog_sources_live_under_assets() {
        let settings = AppSettings {
            assets_dir: "res".into(),
            ..Default::default()
        };
        let sources = settings.catalog_sources();
        assert_eq!(sources.icon_mapping, PathBuf::from("res").join("iconMapping.json"));
        assert_eq!(sources.assets_dir, PathBuf::from("res"));
    }

    #[test]
    fn save_then_load() -> anyhow::Result<()> {
        let name = format!("stockpiler-{}.toml", crate::model::generate_id());
        let path = std::env::temp_dir().join(name);
        let path = path.display().to_string();
        let settings = AppSettings {
            canvas_height: 720.0,
            ..Default::default()
        };
        save_settings(&path, &settings)?;
        assert_eq!(load_settings(&path), Some(settings));
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
