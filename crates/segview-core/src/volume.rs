//! Regular 3D scalar grids with physical placement.

use glam::{UVec3, Vec3};

use crate::error::{Result, SegviewError};
use crate::orientation::Orientation;

/// A dense 3D scalar volume.
///
/// Samples are stored with x varying fastest, then y, then z: the value for
/// voxel `(x, y, z)` lives at `x + nx * (y + ny * z)`. Spacing and origin are
/// defined against that ordering, so every flatten/unflatten goes through
/// [`VolumeGrid::flatten_index`] and [`VolumeGrid::unflatten_index`].
///
/// A grid is immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGrid {
    dims: UVec3,
    spacing: Vec3,
    origin: Vec3,
    data: Vec<f32>,
}

impl VolumeGrid {
    /// Creates a volume from x-fastest samples.
    ///
    /// # Errors
    /// Returns [`SegviewError::SizeMismatch`] if `data` does not hold exactly
    /// `nx * ny * nz` samples and [`SegviewError::InvalidSpacing`] if any
    /// spacing component is not a finite positive number.
    pub fn new(dims: UVec3, spacing: Vec3, origin: Vec3, data: Vec<f32>) -> Result<Self> {
        let expected = dims.x as usize * dims.y as usize * dims.z as usize;
        if data.len() != expected {
            return Err(SegviewError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        if !spacing.is_finite() || spacing.min_element() <= 0.0 {
            return Err(SegviewError::InvalidSpacing(spacing.to_array()));
        }
        Ok(Self {
            dims,
            spacing,
            origin,
            data,
        })
    }

    /// Creates a volume by evaluating `f(x, y, z)` at every voxel.
    pub fn from_fn(
        dims: UVec3,
        spacing: Vec3,
        origin: Vec3,
        mut f: impl FnMut(u32, u32, u32) -> f32,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(dims.x as usize * dims.y as usize * dims.z as usize);
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    data.push(f(x, y, z));
                }
            }
        }
        Self::new(dims, spacing, origin, data)
    }

    /// Creates an all-zero volume with unit spacing at the origin.
    pub fn zeros(dims: UVec3) -> Self {
        let len = dims.x as usize * dims.y as usize * dims.z as usize;
        Self {
            dims,
            spacing: Vec3::ONE,
            origin: Vec3::ZERO,
            data: vec![0.0; len],
        }
    }

    /// Returns the number of samples along x, y and z.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Returns the physical size of one voxel.
    #[must_use]
    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    /// Returns the physical position of voxel (0, 0, 0).
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the raw x-fastest samples.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the total number of voxels.
    #[must_use]
    pub fn num_voxels(&self) -> usize {
        self.data.len()
    }

    /// Flattens a voxel coordinate to an index into [`VolumeGrid::data`].
    #[must_use]
    pub fn flatten_index(&self, x: u32, y: u32, z: u32) -> usize {
        x as usize + self.dims.x as usize * (y as usize + self.dims.y as usize * z as usize)
    }

    /// Unflattens an index into [`VolumeGrid::data`] to a voxel coordinate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn unflatten_index(&self, idx: usize) -> UVec3 {
        let nx = self.dims.x as usize;
        let ny = self.dims.y as usize;
        UVec3::new((idx % nx) as u32, ((idx / nx) % ny) as u32, (idx / (nx * ny)) as u32)
    }

    /// Returns the sample at a voxel, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<f32> {
        if x < self.dims.x && y < self.dims.y && z < self.dims.z {
            Some(self.data[self.flatten_index(x, y, z)])
        } else {
            None
        }
    }

    /// Returns the range of finite samples, or `(0, 0)` if there are none.
    #[must_use]
    pub fn value_range(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in &self.data {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if min > max {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }

    /// Returns the mean of all finite samples, or 0 if there are none.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn mean(&self) -> f32 {
        let (sum, count) = self
            .data
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0_usize), |(sum, count), &v| {
                (sum + f64::from(v), count + 1)
            });
        if count == 0 {
            0.0
        } else {
            (sum / count as f64) as f32
        }
    }

    /// Converts a (possibly fractional) voxel coordinate to physical space.
    #[must_use]
    pub fn voxel_to_world(&self, voxel: Vec3) -> Vec3 {
        self.origin + voxel * self.spacing
    }

    /// Returns the physical bounding box spanned by the voxel centers.
    #[must_use]
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        let last = self.dims.saturating_sub(UVec3::ONE).as_vec3();
        let a = self.voxel_to_world(Vec3::ZERO);
        let b = self.voxel_to_world(last);
        (a.min(b), a.max(b))
    }

    /// Returns true if `other` has the same dimensions, spacing and origin.
    #[must_use]
    pub fn same_geometry(&self, other: &VolumeGrid) -> bool {
        self.dims == other.dims && self.spacing == other.spacing && self.origin == other.origin
    }

    /// Extracts the cross-section at `index` along `orientation`.
    ///
    /// Returns `None` if `index` is past the last slice.
    #[must_use]
    pub fn plane(&self, orientation: Orientation, index: u32) -> Option<Plane> {
        if index >= orientation.slice_count(self.dims) {
            return None;
        }
        let (width, height) = orientation.plane_size(self.dims);
        let mut values = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                let v = orientation.voxel(col, row, index);
                values.push(self.data[self.flatten_index(v.x, v.y, v.z)]);
            }
        }
        Some(Plane {
            width,
            height,
            values,
        })
    }
}

/// A row-major 2D cross-section of a [`VolumeGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Plane {
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

    /// Returns the row-major samples.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns the sample at `(row, col)`, or `None` outside the plane.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<f32> {
        if row < self.height && col < self.width {
            Some(self.values[row as usize * self.width as usize + col as usize])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(dims: UVec3) -> VolumeGrid {
        VolumeGrid::from_fn(dims, Vec3::ONE, Vec3::ZERO, |x, y, z| {
            (x + 100 * y + 10_000 * z) as f32
        })
        .unwrap()
    }

    #[test]
    fn test_volume_creation() {
        let grid = VolumeGrid::zeros(UVec3::new(10, 20, 30));
        assert_eq!(grid.dims(), UVec3::new(10, 20, 30));
        assert_eq!(grid.num_voxels(), 10 * 20 * 30);
        assert_eq!(grid.spacing(), Vec3::ONE);
    }

    #[test]
    fn test_size_mismatch() {
        let err = VolumeGrid::new(UVec3::new(2, 2, 2), Vec3::ONE, Vec3::ZERO, vec![0.0; 7]);
        assert!(matches!(
            err,
            Err(SegviewError::SizeMismatch {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_invalid_spacing() {
        let err = VolumeGrid::new(
            UVec3::new(1, 1, 1),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::ZERO,
            vec![0.0],
        );
        assert!(matches!(err, Err(SegviewError::InvalidSpacing(_))));
    }

    #[test]
    fn test_x_varies_fastest() {
        let grid = ramp(UVec3::new(3, 4, 5));
        assert_eq!(grid.data()[0], 0.0);
        assert_eq!(grid.data()[1], 1.0);
        assert_eq!(grid.data()[3], 100.0);
        assert_eq!(grid.data()[12], 10_000.0);
        assert_eq!(grid.get(2, 3, 4), Some(2.0 + 300.0 + 40_000.0));
        assert_eq!(grid.get(3, 0, 0), None);
    }

    #[test]
    fn test_index_conversion() {
        let grid = VolumeGrid::zeros(UVec3::new(5, 6, 7));
        let idx = grid.flatten_index(2, 3, 4);
        assert_eq!(idx, 2 + 5 * (3 + 6 * 4));
        assert_eq!(grid.unflatten_index(idx), UVec3::new(2, 3, 4));
    }

    #[test]
    fn test_mean_and_range() {
        let grid = VolumeGrid::new(
            UVec3::new(2, 2, 1),
            Vec3::ONE,
            Vec3::ZERO,
            vec![0.0, 1.0, 1.0, f32::NAN],
        )
        .unwrap();
        assert!((grid.mean() - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(grid.value_range(), (0.0, 1.0));
    }

    #[test]
    fn test_world_placement() {
        let grid = VolumeGrid::new(
            UVec3::new(3, 3, 3),
            Vec3::new(0.5, 1.0, 2.5),
            Vec3::new(-10.0, 5.0, 0.0),
            vec![0.0; 27],
        )
        .unwrap();
        let p = grid.voxel_to_world(Vec3::new(2.0, 1.0, 1.0));
        assert!((p - Vec3::new(-9.0, 6.0, 2.5)).length() < 1e-6);
        let (min, max) = grid.bounding_box();
        assert_eq!(min, Vec3::new(-10.0, 5.0, 0.0));
        assert_eq!(max, Vec3::new(-9.0, 7.0, 5.0));
    }

    #[test]
    fn test_planes_follow_orientation_convention() {
        let grid = ramp(UVec3::new(3, 4, 5));

        let axial = grid.plane(Orientation::Axial, 2).unwrap();
        assert_eq!((axial.width(), axial.height()), (3, 4));
        assert_eq!(axial.get(1, 2), grid.get(2, 1, 2));

        let sagittal = grid.plane(Orientation::Sagittal, 1).unwrap();
        assert_eq!((sagittal.width(), sagittal.height()), (4, 5));
        assert_eq!(sagittal.get(3, 2), grid.get(1, 2, 3));

        let coronal = grid.plane(Orientation::Coronal, 3).unwrap();
        assert_eq!((coronal.width(), coronal.height()), (3, 5));
        assert_eq!(coronal.get(4, 0), grid.get(0, 3, 4));

        assert!(grid.plane(Orientation::Axial, 5).is_none());
    }
}
