use eframe::egui;
use std::collections::HashMap;

/// Icon images decoded once per path. Failed loads are remembered too.
#[derive(Default)]
pub(super) struct TextureCache {
    entries: HashMap<String, Option<egui::TextureHandle>>,
}

impl TextureCache {
    pub(super) fn get(&mut self, ctx: &egui::Context, path: &str) -> Option<egui::TextureHandle> {
        self.entries
            .entry(path.to_string())
            .or_insert_with(|| match load_rgba(path) {
                Ok(image) => Some(ctx.load_texture(path, image, egui::TextureOptions::LINEAR)),
                Err(e) => {
                    log::warn!("cannot load icon {path}: {e:#}");
                    None
                }
            })
            .clone()
    }
}

fn load_rgba(path: &str) -> anyhow::Result<egui::ColorImage> {
    use anyhow::Context;
    let decoded = image::open(path).with_context(|| format!("decode {path}"))?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
