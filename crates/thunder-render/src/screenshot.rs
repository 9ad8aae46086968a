//! Saving captured textures to image files.

use image::{ImageBuffer, Rgba};
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Saves tightly packed RGBA8 pixel data (top row first) to an image file.
///
/// Supports `.png`, `.jpg` and `.jpeg`.
pub fn save_image(filename: &str, data: &[u8], width: u32, height: u32) -> RenderResult<()> {
    let path = Path::new(filename);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, data.to_vec()).ok_or(RenderError::InvalidImageData)?;

    match extension.as_str() {
        "png" => {
            img.save_with_format(path, image::ImageFormat::Png)?;
        }
        "jpg" | "jpeg" => {
            // JPEG has no alpha
            let rgb_img = image::DynamicImage::ImageRgba8(img).to_rgb8();
            rgb_img.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => {
            return Err(RenderError::UnsupportedFormat(extension));
        }
    }

    Ok(())
}

/// Encodes tightly packed RGBA8 pixel data as PNG in memory.
pub fn save_to_buffer(data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, data.to_vec()).ok_or(RenderError::InvalidImageData)?;

    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;

    Ok(buffer.into_inner())
}
