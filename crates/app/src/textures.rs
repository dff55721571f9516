//! Texture cache for inline message images.

use eframe::egui;
use shared::conversation::EncodedImage;
use std::collections::{HashMap, HashSet};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Default)]
pub struct TextureCache {
    loaded: HashMap<u64, egui::TextureHandle>,
    failed: HashSet<u64>,
}

impl TextureCache {
    /// Texture for `image`, decoding and uploading it on first use.
    pub fn get(&mut self, ctx: &egui::Context, image: &EncodedImage) -> Option<egui::TextureHandle> {
        let key = key_for(image);
        if let Some(texture) = self.loaded.get(&key) {
            return Some(texture.clone());
        }
        if self.failed.contains(&key) {
            return None;
        }

        match chat_host::image::decode_rgba(image) {
            Ok(rgba) => {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(rgba.size, &rgba.pixels);
                let texture = ctx.load_texture(
                    format!("msg-image-{key:x}"),
                    color_image,
                    egui::TextureOptions::LINEAR,
                );
                self.loaded.insert(key, texture.clone());
                Some(texture)
            }
            Err(e) => {
                tracing::warn!("cannot display image: {}", e);
                self.failed.insert(key);
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
        self.failed.clear();
    }
}

fn key_for(image: &EncodedImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    image.data_url().hash(&mut hasher);
    hasher.finish()
}
