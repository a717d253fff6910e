//! Deterministic default colors for structures.
//!
//! A structure's default color is picked by hashing its id (case-folded) into
//! a fixed qualitative palette, so the same structure gets the same color in
//! every run and in every view.

use glam::Vec3;

/// Qualitative palette with well-separated hues.
pub const PALETTE: [[f32; 3]; 12] = [
    [0.894, 0.102, 0.110],
    [0.216, 0.494, 0.722],
    [0.302, 0.686, 0.290],
    [0.596, 0.306, 0.639],
    [1.000, 0.498, 0.000],
    [1.000, 0.851, 0.184],
    [0.651, 0.337, 0.157],
    [0.969, 0.506, 0.749],
    [0.102, 0.741, 0.710],
    [0.541, 0.714, 0.027],
    [0.400, 0.400, 0.900],
    [0.847, 0.361, 0.255],
];

/// 64-bit FNV-1a; stable across platforms and compiler versions.
fn fnv1a(bytes: impl IntoIterator<Item = u8>) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes
        .into_iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Returns the palette slot assigned to `id`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn palette_index(id: &str) -> usize {
    let hash = fnv1a(id.chars().flat_map(char::to_lowercase).collect::<String>().into_bytes());
    (hash % PALETTE.len() as u64) as usize
}

/// Returns the default color for a structure id.
#[must_use]
pub fn default_color(id: &str) -> Vec3 {
    Vec3::from_array(PALETTE[palette_index(id)])
}
