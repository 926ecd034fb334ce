use eframe::egui::ColorImage;
use tracing::debug;

use crate::config::THUMBNAIL_MAX;

/// Downloads and decodes the thumbnail the engine advertised for a video.
/// Blocking; call from `spawn_blocking`. Any failure just means no preview.
pub fn fetch_thumbnail(url: &str) -> Option<ColorImage> {
    let resp = match reqwest::blocking::get(url).and_then(|r| r.error_for_status()) {
        Ok(r) => r,
        Err(e) => {
            debug!(url, "thumbnail request failed: {}", e);
            return None;
        }
    };
    let bytes = resp.bytes().ok()?;
    decode_thumbnail(&bytes)
}

/// Decodes image bytes and shrinks them to fit the info panel.
pub fn decode_thumbnail(bytes: &[u8]) -> Option<ColorImage> {
    let (max_w, max_h) = THUMBNAIL_MAX;
    let img = image::load_from_memory(bytes).ok()?;
    let img = if img.width() > max_w || img.height() > max_h {
        img.thumbnail(max_w, max_h)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    #[test]
    fn large_images_are_downscaled() {
        let image = decode_thumbnail(&png(1280, 720)).expect("decodes");
        assert!(image.size[0] <= THUMBNAIL_MAX.0 as usize);
        assert!(image.size[1] <= THUMBNAIL_MAX.1 as usize);
    }

    #[test]
    fn small_images_keep_their_size() {
        let image = decode_thumbnail(&png(120, 90)).expect("decodes");
        assert_eq!(image.size, [120, 90]);
    }

    #[test]
    fn junk_bytes_give_no_preview() {
        assert!(decode_thumbnail(b"definitely not an image").is_none());
    }
}
