//! Core data model for segview.
//!
//! This crate provides the pieces every view of a segmentation shares:
//! - [`VolumeGrid`] scalar volumes with physical spacing and origin, and
//!   NIfTI loading in [`io`]
//! - isosurface extraction ([`isosurface::extract`]) built on marching cubes
//!   and Laplacian smoothing
//! - [`StyleRegistry`], the single source of per-structure visual state
//! - [`Options`] for session configuration

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod io;
pub mod isosurface;
pub mod marching_cubes;
pub mod mesh;
pub mod options;
pub mod orientation;
pub mod palette;
pub mod smoothing;
pub mod style;
pub mod volume;

pub use error::{ExtractionFailure, Result, SegviewError, VolumeLoadError};
pub use io::{is_volume_file, load_volume, save_volume, volume_stem};
pub use isosurface::{extract, IsosurfaceExtractor, ThresholdPolicy};
pub use mesh::{MeshVertex, SurfaceMesh};
pub use options::{OverlayAlpha, Options, StylePreset};
pub use orientation::Orientation;
pub use style::{Style, StyleRegistry};
pub use volume::{Plane, VolumeGrid};

// Re-export glam types for convenience
pub use glam::{UVec3, Vec3};
