//! Composited slice images.

use glam::Vec3;
use image::{Rgba, RgbaImage};
use segview_core::Orientation;

/// Intensity window mapping scan values to display gray levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrayWindow {
    /// Value displayed as black.
    pub min: f32,
    /// Value displayed as white.
    pub max: f32,
}

impl GrayWindow {
    /// Creates a window from its bounds.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Fits the window to the finite range of `values`.
    #[must_use]
    pub fn fit(values: &[f32]) -> Self {
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if min > max {
            Self::new(0.0, 1.0)
        } else {
            Self::new(min, max)
        }
    }

    /// Maps a value to a gray level in `[0, 1]`.
    #[must_use]
    pub fn level(&self, value: f32) -> f32 {
        let width = self.max - self.min;
        if !value.is_finite() || width <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / width).clamp(0.0, 1.0)
    }
}

/// One cross-section of the scan with its mask overlay.
///
/// Both layers are row-major with row 0 at the top of the view. Overlay
/// pixels are straight (not premultiplied) RGBA in `[0, 1]`; a pixel no
/// visible structure covers is all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceImage {
    pub(crate) orientation: Orientation,
    pub(crate) index: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) base: Vec<f32>,
    pub(crate) overlay: Vec<[f32; 4]>,
}

impl SliceImage {
    /// Returns the orientation this image was cut along.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the slice index along the sliced axis.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the scan intensities.
    #[must_use]
    pub fn base(&self) -> &[f32] {
        &self.base
    }

    /// Returns the RGBA overlay.
    #[must_use]
    pub fn overlay(&self) -> &[[f32; 4]] {
        &self.overlay
    }

    fn offset(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.height && col < self.width)
            .then(|| row as usize * self.width as usize + col as usize)
    }

    /// Returns the scan intensity at `(row, col)`.
    #[must_use]
    pub fn base_at(&self, row: u32, col: u32) -> Option<f32> {
        self.offset(row, col).map(|i| self.base[i])
    }

    /// Returns the overlay RGBA at `(row, col)`.
    #[must_use]
    pub fn overlay_at(&self, row: u32, col: u32) -> Option<[f32; 4]> {
        self.offset(row, col).map(|i| self.overlay[i])
    }

    /// Returns the overlay alpha at `(row, col)`.
    #[must_use]
    pub fn alpha_at(&self, row: u32, col: u32) -> Option<f32> {
        self.overlay_at(row, col).map(|px| px[3])
    }

    /// Returns the number of pixels with a non-zero overlay alpha.
    #[must_use]
    pub fn overlay_pixel_count(&self) -> usize {
        self.overlay.iter().filter(|px| px[3] > 0.0).count()
    }

    /// Returns true if any overlay pixel is set.
    #[must_use]
    pub fn has_overlay(&self) -> bool {
        self.overlay.iter().any(|px| px[3] > 0.0)
    }

    /// Renders the slice to 8-bit RGBA: windowed gray with the overlay blended on top.
    ///
    /// With `window = None` the window is fitted to this slice's intensities.
    #[must_use]
    pub fn to_rgba_image(&self, window: Option<GrayWindow>) -> RgbaImage {
        let window = window.unwrap_or_else(|| GrayWindow::fit(&self.base));
        let mut img = RgbaImage::new(self.width, self.height);
        for (i, pixel) in img.pixels_mut().enumerate() {
            let gray = Vec3::splat(window.level(self.base[i]));
            let [r, g, b, a] = self.overlay[i];
            let rgb = gray.lerp(Vec3::new(r, g, b), a);
            *pixel = Rgba([to_u8(rgb.x), to_u8(rgb.y), to_u8(rgb.z), 255]);
        }
        img
    }

    /// Renders only the overlay layer to 8-bit RGBA.
    #[must_use]
    pub fn overlay_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width, self.height);
        for (pixel, px) in img.pixels_mut().zip(&self.overlay) {
            *pixel = Rgba(px.map(to_u8));
        }
        img
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_one() -> SliceImage {
        SliceImage {
            orientation: Orientation::Axial,
            index: 0,
            width: 2,
            height: 1,
            base: vec![0.0, 100.0],
            overlay: vec![[0.0; 4], [1.0, 0.0, 0.0, 0.5]],
        }
    }

    #[test]
    fn test_window_fit_and_level() {
        let window = GrayWindow::fit(&[-1000.0, 0.0, 1000.0, f32::NAN]);
        assert_eq!(window, GrayWindow::new(-1000.0, 1000.0));
        assert_eq!(window.level(0.0), 0.5);
        assert_eq!(window.level(5000.0), 1.0);
        assert_eq!(GrayWindow::new(3.0, 3.0).level(3.0), 0.0);
    }

    #[test]
    fn test_rgba_blend() {
        let img = two_by_one().to_rgba_image(None);
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        // White base blended halfway to red.
        assert_eq!(img.get_pixel(1, 0), &Rgba([255, 128, 128, 255]));
    }

    #[test]
    fn test_accessors() {
        let slice = two_by_one();
        assert_eq!(slice.alpha_at(0, 1), Some(0.5));
        assert_eq!(slice.alpha_at(1, 0), None);
        assert_eq!(slice.overlay_pixel_count(), 1);
        assert!(slice.has_overlay());
        assert_eq!(slice.overlay_image().get_pixel(1, 0), &Rgba([255, 0, 0, 128]));
    }
}
