//! Staging images for a send, and decoding them for display.

use ::image::{DynamicImage, ImageOutputFormat, RgbaImage};
use shared::conversation::EncodedImage;
use std::io::Cursor;
use std::path::Path;

pub const SUPPORTED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/bmp"];

/// 10 MiB
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Invalid file type. Supported: jpeg, png, webp, bmp")]
    Unsupported { mime: String },

    #[error("File too large. Maximum size: 10MB")]
    TooLarge { size: usize },

    #[error("Could not read image: {0}")]
    Unreadable(String),
}

/// Validate and encode raw image bytes of the given MIME type.
pub fn stage_from_bytes(bytes: &[u8], mime: &str) -> Result<EncodedImage, ImageError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !SUPPORTED_TYPES.contains(&mime.as_str()) {
        return Err(ImageError::Unsupported { mime });
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge { size: bytes.len() });
    }
    Ok(EncodedImage::from_bytes(&mime, bytes))
}

/// Read an image file, inferring its type from the extension.
pub fn stage_from_path(path: &Path) -> Result<EncodedImage, ImageError> {
    let mime = mime_for_path(path).ok_or_else(|| ImageError::Unsupported {
        mime: path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default(),
    })?;
    let size = std::fs::metadata(path)
        .map_err(|e| ImageError::Unreadable(e.to_string()))?
        .len() as usize;
    if size > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge { size });
    }
    let bytes = std::fs::read(path).map_err(|e| ImageError::Unreadable(e.to_string()))?;
    tracing::debug!("staged {:?} ({} bytes)", path, bytes.len());
    stage_from_bytes(&bytes, mime)
}

/// Re-encode a pasted RGBA bitmap as PNG.
pub fn stage_from_rgba(width: usize, height: usize, rgba: Vec<u8>) -> Result<EncodedImage, ImageError> {
    let buffer = RgbaImage::from_raw(width as u32, height as u32, rgba)
        .ok_or_else(|| ImageError::Unreadable("bitmap size does not match its pixels".into()))?;
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .map_err(|e| ImageError::Unreadable(e.to_string()))?;
    stage_from_bytes(&png, "image/png")
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Decoded pixels ready for a texture upload.
pub struct Rgba {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

pub fn decode_rgba(image: &EncodedImage) -> Result<Rgba, ImageError> {
    let bytes = image
        .decode()
        .map_err(|e| ImageError::Unreadable(e.to_string()))?;
    let decoded =
        ::image::load_from_memory(&bytes).map_err(|e| ImageError::Unreadable(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(Rgba {
        size,
        pixels: rgba.into_raw(),
    })
}
