//! Isosurface extraction for structure masks.
//!
//! [`extract`] contours a volume at an explicit threshold, optionally relaxes
//! the result, and maps it to physical space with the volume's spacing and
//! origin. It is a pure function of its inputs. [`IsosurfaceExtractor`] adds
//! the threshold policy a session applies to every structure.

use serde::{Deserialize, Serialize};

use crate::error::ExtractionFailure;
use crate::marching_cubes::marching_cubes;
use crate::mesh::SurfaceMesh;
use crate::smoothing::laplacian_smooth;
use crate::volume::VolumeGrid;

/// Surfaces with less total area than this are reported as degenerate.
const MIN_SURFACE_AREA: f32 = 1e-9;

/// How the contouring threshold is chosen for a volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// The mean of the volume's finite samples, recomputed per volume.
    #[default]
    Mean,
    /// A fixed scalar.
    Fixed(f32),
}

impl ThresholdPolicy {
    /// Returns the threshold this policy selects for `volume`.
    #[must_use]
    pub fn resolve(self, volume: &VolumeGrid) -> f32 {
        match self {
            Self::Mean => volume.mean(),
            Self::Fixed(value) => value,
        }
    }
}

/// Contours `volume` at `threshold` and returns the surface in physical space.
///
/// With `smooth_iterations > 0` the surface is relaxed with Laplacian
/// smoothing using `relaxation` as the step factor; only vertex positions
/// change.
///
/// # Errors
/// Returns an [`ExtractionFailure`] if the threshold is not finite, the volume
/// is too thin to contain a cell, or the surface is empty or has no area.
pub fn extract(
    volume: &VolumeGrid,
    threshold: f32,
    smooth_iterations: u32,
    relaxation: f32,
) -> Result<SurfaceMesh, ExtractionFailure> {
    if !threshold.is_finite() {
        return Err(ExtractionFailure::NonFiniteThreshold(threshold));
    }
    let dims = volume.dims();
    if dims.min_element() < 2 {
        return Err(ExtractionFailure::GridTooSmall {
            nx: dims.x,
            ny: dims.y,
            nz: dims.z,
        });
    }

    let mut mesh = marching_cubes(volume.data(), dims, threshold);
    if mesh.is_empty() {
        let (min, max) = volume.value_range();
        return Err(ExtractionFailure::Empty {
            threshold,
            min,
            max,
        });
    }

    mesh.map_vertices(|v| volume.voxel_to_world(v));
    // Anisotropic spacing changes face orientation in physical space.
    mesh.recompute_normals();
    laplacian_smooth(&mut mesh, smooth_iterations, relaxation);

    if mesh.area() < MIN_SURFACE_AREA {
        return Err(ExtractionFailure::Degenerate {
            triangles: mesh.num_triangles(),
        });
    }

    log::debug!(
        "extracted isosurface at {threshold}: {} vertices, {} triangles",
        mesh.num_vertices(),
        mesh.num_triangles()
    );
    Ok(mesh)
}

/// Extraction settings shared by every structure of a session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IsosurfaceExtractor {
    /// Threshold selection policy.
    pub threshold: ThresholdPolicy,
    /// Number of Laplacian smoothing iterations (0 disables smoothing).
    pub smooth_iterations: u32,
    /// Smoothing step factor in `[0, 1]`.
    pub relaxation: f32,
}

impl IsosurfaceExtractor {
    /// Creates an extractor with the given policy and no smoothing.
    pub fn new(threshold: ThresholdPolicy) -> Self {
        Self {
            threshold,
            smooth_iterations: 0,
            relaxation: 0.0,
        }
    }

    /// Enables smoothing.
    #[must_use]
    pub fn with_smoothing(mut self, iterations: u32, relaxation: f32) -> Self {
        self.smooth_iterations = iterations;
        self.relaxation = relaxation;
        self
    }

    /// Extracts the surface of `volume` under this extractor's policy.
    pub fn extract(&self, volume: &VolumeGrid) -> Result<SurfaceMesh, ExtractionFailure> {
        extract(
            volume,
            self.threshold.resolve(volume),
            self.smooth_iterations,
            self.relaxation,
        )
    }
}

#[cfg(test)]
mod tests {
    use glam::{UVec3, Vec3};
    use proptest::prelude::*;

    use super::*;

    fn cube_mask(dims: UVec3, lo: u32, hi: u32) -> VolumeGrid {
        VolumeGrid::from_fn(dims, Vec3::ONE, Vec3::ZERO, |x, y, z| {
            let inside = [x, y, z].iter().all(|&c| c >= lo && c < hi);
            if inside {
                1.0
            } else {
                0.0
            }
        })
        .unwrap()
    }

    #[test]
    fn test_all_zero_mask_is_empty() {
        let mask = VolumeGrid::zeros(UVec3::new(64, 64, 40));
        let err = IsosurfaceExtractor::default().extract(&mask).unwrap_err();
        assert!(matches!(err, ExtractionFailure::Empty { .. }));
    }

    #[test]
    fn test_threshold_above_max_is_empty() {
        let mask = cube_mask(UVec3::splat(8), 2, 6);
        let err = extract(&mask, 2.0, 0, 0.0).unwrap_err();
        assert_eq!(
            err,
            ExtractionFailure::Empty {
                threshold: 2.0,
                min: 0.0,
                max: 1.0
            }
        );
    }

    #[test]
    fn test_thin_volume() {
        let mask = VolumeGrid::zeros(UVec3::new(8, 8, 1));
        assert!(matches!(
            extract(&mask, 0.5, 0, 0.0),
            Err(ExtractionFailure::GridTooSmall { nz: 1, .. })
        ));
    }

    #[test]
    fn test_non_finite_threshold() {
        let mask = cube_mask(UVec3::splat(4), 1, 3);
        assert!(matches!(
            extract(&mask, f32::NAN, 0, 0.0),
            Err(ExtractionFailure::NonFiniteThreshold(_))
        ));
    }

    #[test]
    fn test_mean_policy_finds_cube() {
        let mask = cube_mask(UVec3::splat(10), 3, 7);
        let threshold = ThresholdPolicy::Mean.resolve(&mask);
        assert!(threshold > 0.0 && threshold < 1.0);
        let mesh = IsosurfaceExtractor::new(ThresholdPolicy::Mean)
            .extract(&mask)
            .unwrap();
        let (min, max) = mesh.bounding_box().unwrap();
        assert!(min.min_element() > 2.0 && max.max_element() < 7.0);
    }

    #[test]
    fn test_world_placement_uses_spacing_and_origin() {
        let inner = cube_mask(UVec3::splat(10), 3, 7);
        let placed = VolumeGrid::new(
            inner.dims(),
            Vec3::new(2.0, 1.0, 0.5),
            Vec3::new(100.0, -50.0, 10.0),
            inner.data().to_vec(),
        )
        .unwrap();
        let mesh = extract(&placed, 0.5, 0, 0.0).unwrap();
        let (min, max) = mesh.bounding_box().unwrap();
        // Index-space box is [2.5, 6.5] on every axis.
        assert!((min - Vec3::new(105.0, -47.5, 11.25)).length() < 1e-4);
        assert!((max - Vec3::new(113.0, -43.5, 13.25)).length() < 1e-4);
    }

    #[test]
    fn test_smoothing_keeps_connectivity() {
        let mask = cube_mask(UVec3::splat(10), 3, 7);
        let raw = extract(&mask, 0.5, 0, 0.0).unwrap();
        let smooth = extract(&mask, 0.5, 10, 0.3).unwrap();
        assert_eq!(raw.indices, smooth.indices);
        assert_ne!(raw.vertices, smooth.vertices);
    }

    proptest! {
        #[test]
        fn extraction_is_deterministic(
            lo in 1_u32..4,
            size in 1_u32..4,
            threshold in 0.05_f32..0.95,
            iterations in 0_u32..4,
            relaxation in 0.0_f32..1.0,
        ) {
            let mask = cube_mask(UVec3::splat(9), lo, lo + size);
            let a = extract(&mask, threshold, iterations, relaxation);
            let b = extract(&mask, threshold, iterations, relaxation);
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn test_collapsed_surface_is_degenerate() {
        // The only crossing sits exactly on a corner, so all three triangle
        // vertices land on the same point.
        let mut data = vec![0.0; 8];
        data[0] = 1.0;
        let grid = VolumeGrid::new(UVec3::splat(2), Vec3::ONE, Vec3::ZERO, data).unwrap();
        assert_eq!(
            extract(&grid, 1.0, 0, 0.0),
            Err(ExtractionFailure::Degenerate { triangles: 1 })
        );
    }
}
