use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::ImageOutputFormat;

use crate::core::hash;
use crate::error::Result;
use crate::utils::{ensure_dir_exists, generated_image_name};

/// A generated image written to the image directory.
#[derive(Debug, Clone)]
pub struct SavedImage {
    /// File name inside the image directory; doubles as the embedding id
    pub file_name: String,
    /// Full path of the saved file
    pub path: PathBuf,
    /// PNG-encoded content as written to disk
    pub png: Bytes,
}

/// Decode an image in any supported format and re-encode it as PNG.
pub fn to_png(raw: &[u8]) -> Result<Bytes> {
    let img = image::load_from_memory(raw)?;

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png)?;

    Ok(Bytes::from(buf.into_inner()))
}

/// Save a generated image as `generated_<label>_<content id>.png` under `dir`.
///
/// The name is derived from the PNG content, so saving the same picture twice
/// rewrites the same file and different pictures never collide.
pub fn save_generated(dir: &Path, label: &str, raw: &[u8]) -> Result<SavedImage> {
    let png = to_png(raw)?;
    let file_name = generated_image_name(label, &hash::content_id(&png));

    ensure_dir_exists(dir)?;
    let path = dir.join(&file_name);
    std::fs::write(&path, &png)?;

    log::debug!("Saved generated image {} ({} bytes)", path.display(), png.len());

    Ok(SavedImage {
        file_name,
        path,
        png,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn jpeg_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Jpeg(90)).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_to_png_reencodes() {
        let png = to_png(&jpeg_bytes()).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn test_to_png_rejects_garbage() {
        assert!(to_png(b"definitely not an image").is_err());
    }

    #[test]
    fn test_save_generated() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("generated");

        let saved = save_generated(&image_dir, "Coffee maker", &jpeg_bytes()).unwrap();

        assert!(saved.file_name.starts_with("generated_coffee-maker_"));
        assert!(saved.file_name.ends_with(".png"));
        assert_eq!(saved.path, image_dir.join(&saved.file_name));
        assert_eq!(std::fs::read(&saved.path).unwrap(), saved.png.to_vec());

        // Same content, same name
        let again = save_generated(&image_dir, "Coffee maker", &jpeg_bytes()).unwrap();
        assert_eq!(again.file_name, saved.file_name);
    }
}
