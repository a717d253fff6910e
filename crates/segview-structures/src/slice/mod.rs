//! Orthogonal slice views of the scan with mask overlays.

mod compositor;
mod image;

pub use compositor::{composite, OverlayLayer, SliceCompositor};
pub use image::{GrayWindow, SliceImage};
