//! Laplacian relaxation of mesh vertices.

use glam::Vec3;

use crate::mesh::SurfaceMesh;

/// Builds the sorted, de-duplicated vertex neighbourhoods of a triangle mesh.
fn vertex_neighbors(mesh: &SurfaceMesh) -> Vec<Vec<u32>> {
    let mut neighbors = vec![Vec::new(); mesh.vertices.len()];
    for [a, b, c] in mesh.triangles() {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            neighbors[from as usize].push(to);
            neighbors[to as usize].push(from);
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    neighbors
}

/// Moves every vertex towards the centroid of its neighbours.
///
/// Each iteration computes `p + relaxation * (mean(neighbours) - p)` for all
/// vertices from the previous iteration's positions, so the result does not
/// depend on vertex visiting order. Connectivity is unchanged; normals are
/// recomputed afterwards. `relaxation` is clamped to `[0, 1]`.
pub fn laplacian_smooth(mesh: &mut SurfaceMesh, iterations: u32, relaxation: f32) {
    let relaxation = relaxation.clamp(0.0, 1.0);
    if iterations == 0 || relaxation <= 0.0 || mesh.is_empty() {
        return;
    }

    let neighbors = vertex_neighbors(mesh);
    let mut next = mesh.vertices.clone();

    for _ in 0..iterations {
        for (i, list) in neighbors.iter().enumerate() {
            if list.is_empty() {
                continue;
            }
            let sum: Vec3 = list.iter().map(|&n| mesh.vertices[n as usize]).sum();
            #[allow(clippy::cast_precision_loss)]
            let centroid = sum / list.len() as f32;
            let p = mesh.vertices[i];
            next[i] = p + relaxation * (centroid - p);
        }
        std::mem::swap(&mut mesh.vertices, &mut next);
    }

    mesh.recompute_normals();
}
