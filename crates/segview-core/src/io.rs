//! Reading and writing volumes in NIfTI-1 format (`.nii`, `.nii.gz`).
//!
//! Voxel spacing comes from `pixdim[1..4]`. The origin is the translation
//! column of the sform when `sform_code > 0`, otherwise the qform offsets when
//! `qform_code > 0`, otherwise zero. Both are used verbatim.

use std::path::Path;

use glam::{UVec3, Vec3};
use ndarray::{Array3, ShapeBuilder};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{Result, SegviewError, VolumeLoadError};
use crate::volume::VolumeGrid;

const SUPPORTED_EXTENSIONS: [&str; 4] = [".nii", ".nii.gz", ".hdr", ".hdr.gz"];

fn lowercase_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Returns true if `path` has a volume extension this loader reads.
pub fn is_volume_file(path: &Path) -> bool {
    let name = lowercase_name(path);
    SUPPORTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Returns the file name of a volume path with its volume extension removed.
///
/// `liver.nii.gz` gives `liver`. Returns `None` for other files.
pub fn volume_stem(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let lower = name.to_ascii_lowercase();
    // Longest match first so ".nii.gz" wins over ".nii".
    let ext = SUPPORTED_EXTENSIONS
        .iter()
        .filter(|ext| lower.ends_with(*ext))
        .max_by_key(|ext| ext.len())?;
    let stem = &name[..name.len() - ext.len()];
    (!stem.is_empty()).then_some(stem)
}

/// Loads a volume from a NIfTI file.
///
/// # Errors
/// Returns [`VolumeLoadError`] if the file is missing, has an unsupported
/// extension, cannot be decoded, or holds more than one 3D volume.
pub fn load_volume(path: impl AsRef<Path>) -> std::result::Result<VolumeGrid, VolumeLoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VolumeLoadError::NotFound(path.to_path_buf()));
    }
    if !is_volume_file(path) {
        return Err(VolumeLoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: format!("expected one of {}", SUPPORTED_EXTENSIONS.join(", ")),
        });
    }

    let unreadable = |reason: String| VolumeLoadError::Unreadable {
        path: path.to_path_buf(),
        reason,
    };
    let invalid = |reason: String| VolumeLoadError::Invalid {
        path: path.to_path_buf(),
        reason,
    };

    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| unreadable(e.to_string()))?;
    let header = object.header().clone();
    let dims = volume_dims(&header).map_err(|reason| VolumeLoadError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason,
    })?;
    let array = object
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|e| unreadable(e.to_string()))?;

    // Reversing the axes makes x the fastest-varying index in iteration order.
    let data: Vec<f32> = array.t().iter().copied().collect();

    let spacing = Vec3::new(header.pixdim[1], header.pixdim[2], header.pixdim[3]);
    let origin = header_origin(&header);

    let grid = VolumeGrid::new(dims, spacing, origin, data).map_err(|e| invalid(e.to_string()))?;
    log::debug!(
        "loaded volume {} ({}x{}x{}, spacing {:?}, origin {:?})",
        path.display(),
        dims.x,
        dims.y,
        dims.z,
        spacing,
        origin
    );
    Ok(grid)
}

/// Writes a volume to a NIfTI file, gzip-compressed if the name ends in `.gz`.
///
/// Spacing is written to `pixdim` and the origin to both the sform and the
/// qform so any reader recovers the placement.
pub fn save_volume(path: impl AsRef<Path>, volume: &VolumeGrid) -> Result<()> {
    let path = path.as_ref();
    let write_error = |reason: String| SegviewError::VolumeWrite {
        path: path.to_path_buf(),
        reason,
    };

    let dims = volume.dims();
    let spacing = volume.spacing();
    let origin = volume.origin();

    let header = NiftiHeader {
        pixdim: [1.0, spacing.x, spacing.y, spacing.z, 1.0, 1.0, 1.0, 1.0],
        qform_code: 1,
        sform_code: 1,
        quatern_x: origin.x,
        quatern_y: origin.y,
        quatern_z: origin.z,
        srow_x: [spacing.x, 0.0, 0.0, origin.x],
        srow_y: [0.0, spacing.y, 0.0, origin.y],
        srow_z: [0.0, 0.0, spacing.z, origin.z],
        ..NiftiHeader::default()
    };

    // Fortran layout: the first index varies fastest, matching the grid.
    let shape = (dims.x as usize, dims.y as usize, dims.z as usize).f();
    let array = Array3::from_shape_vec(shape, volume.data().to_vec())
        .map_err(|e| write_error(e.to_string()))?;

    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .map_err(|e| write_error(e.to_string()))?;
    Ok(())
}

fn volume_dims(header: &NiftiHeader) -> std::result::Result<UVec3, String> {
    let ndim = usize::from(header.dim[0]);
    if ndim == 0 || ndim > 7 {
        return Err(format!("invalid dimensionality {ndim}"));
    }
    let extent = |axis: usize| {
        if axis <= ndim {
            u32::from(header.dim[axis])
        } else {
            1
        }
    };
    if let Some(axis) = (4..=ndim).find(|&axis| header.dim[axis] > 1) {
        return Err(format!(
            "{ndim}D data with {} samples along axis {axis}; only single 3D volumes are supported",
            header.dim[axis]
        ));
    }
    let dims = UVec3::new(extent(1), extent(2), extent(3));
    if dims.min_element() == 0 {
        return Err(format!("empty volume {}x{}x{}", dims.x, dims.y, dims.z));
    }
    Ok(dims)
}

fn header_origin(header: &NiftiHeader) -> Vec3 {
    if header.sform_code > 0 {
        Vec3::new(header.srow_x[3], header.srow_y[3], header.srow_z[3])
    } else if header.qform_code > 0 {
        Vec3::new(header.quatern_x, header.quatern_y, header.quatern_z)
    } else {
        Vec3::ZERO
    }
}
