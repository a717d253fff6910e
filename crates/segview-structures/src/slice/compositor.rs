//! Slice compositing: grayscale scan cross-section plus colored mask overlays.

use glam::Vec3;
use segview_core::{
    Options, Orientation, OverlayAlpha, Result, SegviewError, StyleRegistry, VolumeGrid,
};

use super::image::SliceImage;
use crate::structure::Structure;

/// One mask drawn over a slice.
#[derive(Debug, Clone, Copy)]
pub struct OverlayLayer<'a> {
    /// Mask volume, expected on the scan's grid.
    pub mask: &'a VolumeGrid,
    /// Overlay color.
    pub color: Vec3,
    /// Overlay alpha; layers with alpha 0 contribute nothing.
    pub alpha: f32,
}

impl<'a> OverlayLayer<'a> {
    /// Creates a layer drawing `mask` in `color` with `alpha`.
    pub fn new(mask: &'a VolumeGrid, color: Vec3, alpha: f32) -> Self {
        Self { mask, color, alpha }
    }
}

/// Composites the cross-section of `scan` at `index` with `layers` on top.
///
/// Every layer's mask is cut at the same orientation and index and binarized
/// with `mask_value > cutoff`. A mask whose cross-section is smaller or
/// larger than the scan's is aligned at pixel (0, 0): pixels outside the mask
/// are treated as unset and mask pixels outside the scan are dropped. Where
/// several layers cover a pixel, the overlay alpha is the largest of their
/// alphas and the color is that layer's color; on equal alphas the later
/// layer wins.
///
/// # Errors
/// Returns [`SegviewError::SliceOutOfRange`] if `index` is past the scan's
/// last slice along `orientation`.
pub fn composite<'a>(
    scan: &VolumeGrid,
    orientation: Orientation,
    index: u32,
    layers: impl IntoIterator<Item = OverlayLayer<'a>>,
    cutoff: f32,
) -> Result<SliceImage> {
    let base = scan
        .plane(orientation, index)
        .ok_or_else(|| SegviewError::SliceOutOfRange {
            orientation: orientation.to_string(),
            index,
            max: orientation.slice_count(scan.dims()).saturating_sub(1),
        })?;
    let (width, height) = (base.width(), base.height());
    let mut overlay = vec![[0.0_f32; 4]; base.values().len()];

    for layer in layers {
        if layer.alpha <= 0.0 {
            continue;
        }
        // A mask that does not reach this slice contributes nothing.
        let Some(plane) = layer.mask.plane(orientation, index) else {
            continue;
        };
        if (plane.width(), plane.height()) != (width, height) {
            log::debug!(
                "{orientation} slice {index}: mask is {}x{}, scan is {width}x{height}; \
                 zero-filling",
                plane.width(),
                plane.height()
            );
        }
        let rows = height.min(plane.height());
        let cols = width.min(plane.width());
        for row in 0..rows {
            for col in 0..cols {
                let covered = plane.get(row, col).is_some_and(|v| v > cutoff);
                let px = &mut overlay[row as usize * width as usize + col as usize];
                if covered && layer.alpha >= px[3] {
                    *px = [layer.color.x, layer.color.y, layer.color.z, layer.alpha];
                }
            }
        }
    }

    Ok(SliceImage {
        orientation,
        index,
        width,
        height,
        base: base.values().to_vec(),
        overlay,
    })
}

/// One slice view: an orientation and its currently displayed index.
///
/// The compositor holds no image state; every [`SliceCompositor::composite`]
/// call rebuilds the image from the volumes and the current styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceCompositor {
    orientation: Orientation,
    index: u32,
    slice_count: u32,
}

impl SliceCompositor {
    /// Creates a view over `scan`, starting at the middle slice.
    pub fn new(orientation: Orientation, scan: &VolumeGrid) -> Self {
        let slice_count = orientation.slice_count(scan.dims());
        Self {
            orientation,
            index: slice_count.saturating_sub(1) / 2,
            slice_count,
        }
    }

    /// Returns the orientation of this view.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the displayed slice index.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the largest valid slice index.
    #[must_use]
    pub fn max_index(&self) -> u32 {
        self.slice_count.saturating_sub(1)
    }

    /// Moves the view to `index`, clamped to the valid range. Returns the applied index.
    pub fn set_index(&mut self, index: u32) -> u32 {
        self.index = index.min(self.max_index());
        self.index
    }

    /// Composites the displayed slice.
    ///
    /// Each structure contributes its mask with its current color and the
    /// alpha given by `options.overlay_alpha`; hidden structures are skipped.
    pub fn composite(
        &self,
        scan: &VolumeGrid,
        structures: &[Structure],
        styles: &StyleRegistry,
        options: &Options,
    ) -> Result<SliceImage> {
        self.composite_at(self.index, scan, structures, styles, options)
    }

    /// Composites slice `index` without moving the view.
    pub fn composite_at(
        &self,
        index: u32,
        scan: &VolumeGrid,
        structures: &[Structure],
        styles: &StyleRegistry,
        options: &Options,
    ) -> Result<SliceImage> {
        let layers = structures
            .iter()
            .map(|s| layer_for(s, styles, options.overlay_alpha));
        composite(scan, self.orientation, index, layers, options.mask_cutoff)
    }
}

fn layer_for<'a>(
    structure: &'a Structure,
    styles: &StyleRegistry,
    policy: OverlayAlpha,
) -> OverlayLayer<'a> {
    let style = styles.get(structure.id());
    OverlayLayer::new(structure.mask(), style.color, policy.alpha(&style))
}
