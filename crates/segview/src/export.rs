//! Writing composited slices to image files.

use std::path::Path;

use image::RgbaImage;
use segview_structures::{GrayWindow, SliceImage};

/// Saves a composited slice to an image file.
///
/// # Arguments
/// * `path` - Output filename (supports .png, .jpg, .jpeg)
/// * `slice` - The slice to write
/// * `window` - Gray window for the scan; `None` fits it to the slice
///
/// # Errors
/// Returns an error if the file cannot be written or format is unsupported.
pub fn save_slice(
    path: impl AsRef<Path>,
    slice: &SliceImage,
    window: Option<GrayWindow>,
) -> Result<(), ExportError> {
    save_rgba(path.as_ref(), slice.to_rgba_image(window))
}

/// Saves only the overlay layer of a slice, with its alpha channel, as PNG.
pub fn save_overlay(path: impl AsRef<Path>, slice: &SliceImage) -> Result<(), ExportError> {
    let path = path.as_ref();
    let extension = extension_of(path);
    if extension != "png" {
        return Err(ExportError::UnsupportedFormat(extension));
    }
    slice
        .overlay_image()
        .save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Encodes a composited slice as PNG in memory.
pub fn encode_png(slice: &SliceImage, window: Option<GrayWindow>) -> Result<Vec<u8>, ExportError> {
    let img = slice.to_rgba_image(window);
    if img.width() == 0 || img.height() == 0 {
        return Err(ExportError::InvalidImageData);
    }
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

fn save_rgba(path: &Path, img: RgbaImage) -> Result<(), ExportError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(ExportError::InvalidImageData);
    }
    match extension_of(path).as_str() {
        "png" => {
            img.save_with_format(path, image::ImageFormat::Png)?;
        }
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
            rgb.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        other => {
            return Err(ExportError::UnsupportedFormat(other.to_string()));
        }
    }
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Error type for image export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image data")]
    InvalidImageData,
}

#[cfg(test)]
mod tests {
    use glam::{UVec3, Vec3};
    use segview_core::{Orientation, VolumeGrid};
    use segview_structures::{composite, OverlayLayer};

    use super::*;

    fn slice() -> SliceImage {
        let dims = UVec3::new(6, 4, 3);
        let scan = VolumeGrid::from_fn(dims, Vec3::ONE, Vec3::ZERO, |x, _, _| x as f32).unwrap();
        let mask = VolumeGrid::from_fn(dims, Vec3::ONE, Vec3::ZERO, |x, _, _| {
            if x < 2 {
                1.0
            } else {
                0.0
            }
        })
        .unwrap();
        let layers = [OverlayLayer::new(&mask, Vec3::X, 1.0)];
        composite(&scan, Orientation::Axial, 1, layers, 0.5).unwrap()
    }

    #[test]
    fn test_save_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let slice = slice();

        let png = dir.path().join("axial.png");
        save_slice(&png, &slice, None).unwrap();
        let read = image::open(&png).unwrap().to_rgba8();
        assert_eq!(read.dimensions(), (6, 4));
        assert_eq!(read.get_pixel(0, 0), &image::Rgba([255, 0, 0, 255]));

        let jpg = dir.path().join("axial.JPG");
        save_slice(&jpg, &slice, None).unwrap();
        assert!(jpg.exists());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_slice(dir.path().join("axial.tiff"), &slice(), None).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(ext) if ext == "tiff"));
        let err = save_overlay(dir.path().join("overlay.jpg"), &slice()).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&slice(), Some(GrayWindow::new(0.0, 5.0))).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
