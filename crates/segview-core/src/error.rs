//! Error types for segview.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read a volume from disk.
///
/// Fatal for the one volume being read. A session records it as a warning and
/// skips the structure, unless the volume is the scan itself.
#[derive(Error, Debug, Clone)]
pub enum VolumeLoadError {
    /// The file does not exist.
    #[error("volume file '{}' not found", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read or decoded.
    #[error("failed to read volume '{}': {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// The file is not a volumetric format this loader understands.
    #[error("unsupported volume format for '{}': {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// The header or voxel payload is inconsistent.
    #[error("invalid volume '{}': {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl VolumeLoadError {
    /// Returns the path of the volume that failed to load.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path)
            | Self::Unreadable { path, .. }
            | Self::UnsupportedFormat { path, .. }
            | Self::Invalid { path, .. } => path,
        }
    }
}

/// Recoverable failure to produce a surface for one structure.
///
/// A structure whose extraction fails has no 3D geometry but keeps its style
/// entry and its slice overlays.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionFailure {
    /// No voxel pair straddles the threshold.
    #[error("no surface at threshold {threshold} (values span [{min}, {max}])")]
    Empty { threshold: f32, min: f32, max: f32 },

    /// Triangles were produced but they enclose no area.
    #[error("degenerate surface: {triangles} triangles with zero total area")]
    Degenerate { triangles: usize },

    /// The volume has fewer than two samples along some axis.
    #[error("volume {nx}x{ny}x{nz} is too small to contour")]
    GridTooSmall { nx: u32, ny: u32, nz: u32 },

    /// The threshold is NaN or infinite.
    #[error("threshold {0} is not finite")]
    NonFiniteThreshold(f32),
}

/// The main error type for segview operations.
#[derive(Error, Debug)]
pub enum SegviewError {
    /// A volume could not be loaded.
    #[error(transparent)]
    VolumeLoad(#[from] VolumeLoadError),

    /// A volume could not be written.
    #[error("failed to write volume '{}': {reason}", path.display())]
    VolumeWrite { path: PathBuf, reason: String },

    /// An isosurface could not be extracted.
    #[error("extraction failed for '{structure}': {failure}")]
    Extraction {
        structure: String,
        failure: ExtractionFailure,
    },

    /// A structure with the given id already exists.
    #[error("structure '{0}' already exists")]
    StructureExists(String),

    /// A structure with the given id was not found.
    #[error("structure '{0}' not found")]
    StructureNotFound(String),

    /// A slice index is past the end of the volume along the sliced axis.
    #[error("slice index {index} out of range for {orientation} (max {max})")]
    SliceOutOfRange {
        orientation: String,
        index: u32,
        max: u32,
    },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Voxel spacing must be finite and strictly positive.
    #[error("invalid voxel spacing {0:?}")]
    InvalidSpacing([f32; 3]),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for segview operations.
pub type Result<T> = std::result::Result<T, SegviewError>;
