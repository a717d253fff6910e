//! The three axis-aligned slicing planes.
//!
//! Every cross-section, of the scan and of every mask, goes through the same
//! mapping from image pixels to voxels so base images and overlays stay
//! pixel-registered:
//!
//! | orientation | fixed axis | image columns | image rows | size (h × w) |
//! |-------------|------------|---------------|------------|--------------|
//! | axial       | z          | x             | y          | ny × nx      |
//! | sagittal    | x          | y             | z          | nz × ny      |
//! | coronal     | y          | x             | z          | nz × nx      |
//!
//! Row 0 is the top row of the displayed image and column 0 its left column,
//! so pixel `(row, col)` of a slice at `index` reads voxel
//! `(u = col, v = row, fixed = index)`.

use std::fmt;

use glam::UVec3;
use serde::{Deserialize, Serialize};

/// An axis-aligned slicing plane family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Holds z constant.
    Axial,
    /// Holds x constant.
    Sagittal,
    /// Holds y constant.
    Coronal,
}

impl Orientation {
    /// All orientations, in display order.
    pub const ALL: [Orientation; 3] = [Self::Axial, Self::Sagittal, Self::Coronal];

    /// Returns the volume axis held constant (0 = x, 1 = y, 2 = z).
    pub fn sliced_axis(self) -> usize {
        match self {
            Self::Axial => 2,
            Self::Sagittal => 0,
            Self::Coronal => 1,
        }
    }

    /// Returns the volume axes spanned by image columns and rows.
    pub fn in_plane_axes(self) -> (usize, usize) {
        match self {
            Self::Axial => (0, 1),
            Self::Sagittal => (1, 2),
            Self::Coronal => (0, 2),
        }
    }

    /// Returns `(width, height)` of a cross-section through a grid of `dims`.
    pub fn plane_size(self, dims: UVec3) -> (u32, u32) {
        let (u, v) = self.in_plane_axes();
        (dims[u], dims[v])
    }

    /// Returns the number of slices along the sliced axis.
    pub fn slice_count(self, dims: UVec3) -> u32 {
        dims[self.sliced_axis()]
    }

    /// Maps an image pixel on slice `index` to its voxel coordinate.
    pub fn voxel(self, col: u32, row: u32, index: u32) -> UVec3 {
        let mut voxel = UVec3::ZERO;
        let (u, v) = self.in_plane_axes();
        voxel[u] = col;
        voxel[v] = row;
        voxel[self.sliced_axis()] = index;
        voxel
    }

    /// Returns the lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Axial => "axial",
            Self::Sagittal => "sagittal",
            Self::Coronal => "coronal",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
