//! Structures and slice views for segview.
//!
//! A [`Structure`] pairs a segmentation mask with its lazily extracted
//! surface. The [`slice`] module cuts the scan along an [`Orientation`] and
//! paints every visible structure's mask on top.
//!
//! [`Orientation`]: segview_core::Orientation

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod slice;
pub mod structure;

pub use slice::{composite, GrayWindow, OverlayLayer, SliceCompositor, SliceImage};
pub use structure::Structure;
