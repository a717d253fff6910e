//! segview: volumetric views of medical segmentation results.
//!
//! A [`Session`] holds one scan and the segmented structures drawn over it.
//! Each structure appears twice: as a 3D surface actor in the [`Scene`], and
//! as a colored overlay in the axial, sagittal and coronal slice views. Both
//! read the same [`StyleRegistry`], so a style change shows up in every view
//! at once.
//!
//! # Quick Start
//!
//! ```no_run
//! use segview::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let mut session = Session::open(
//!         "scan.nii.gz",
//!         [("liver", "liver.nii.gz"), ("spleen", "spleen.nii.gz")],
//!         Options::default(),
//!     )?;
//!     for warning in session.warnings() {
//!         eprintln!("{warning}");
//!     }
//!
//!     session.set_opacity("liver", 0.5)?;
//!     let axial = session.composite(Orientation::Axial)?;
//!     println!("{}x{}", axial.width(), axial.height());
//!     Ok(())
//! }
//! ```

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod collaborators;
pub mod export;
mod init;
pub mod scene;
pub mod session;

pub use collaborators::{
    ColorPicker, Metrics, MetricsProvider, MetricsTable, StaticStructureSource, StructureSource,
};
pub use export::{encode_png, save_overlay, save_slice, ExportError};
pub use init::init_logging;
pub use scene::{Actor, RenderSurface, Scene};
pub use session::{Session, SessionWarning, StyleEvent, ViewState};

// Re-export core types
pub use segview_core::{
    load_volume, save_volume, ExtractionFailure, IsosurfaceExtractor, MeshVertex, Options,
    Orientation, OverlayAlpha, Result, SegviewError, Style, StylePreset, StyleRegistry,
    SurfaceMesh, ThresholdPolicy, VolumeGrid, VolumeLoadError,
};
pub use segview_core::{UVec3, Vec3};

// Re-export structures
pub use segview_structures::{GrayWindow, SliceCompositor, SliceImage, Structure};
