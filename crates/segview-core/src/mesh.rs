//! Triangle meshes produced by isosurface extraction.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex layout handed to render surfaces.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals (area-weighted average of adjacent faces, unit length).
    pub normals: Vec<Vec3>,
    /// Triangle indices (every 3 consecutive indices form a triangle).
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    /// Returns the number of triangles in the mesh.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the number of vertices in the mesh.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates over triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Returns the total surface area.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| {
                let va = self.vertices[a as usize];
                let vb = self.vertices[b as usize];
                let vc = self.vertices[c as usize];
                0.5 * (vb - va).cross(vc - va).length()
            })
            .sum()
    }

    /// Returns the axis-aligned bounding box, or `None` for a mesh without vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
        )
    }

    /// Recomputes vertex normals from the current positions.
    pub fn recompute_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.vertices.len(), Vec3::ZERO);
        for [a, b, c] in self.triangles().collect::<Vec<_>>() {
            let va = self.vertices[a as usize];
            let vb = self.vertices[b as usize];
            let vc = self.vertices[c as usize];
            let n = (vc - vb).cross(va - vb);
            self.normals[a as usize] += n;
            self.normals[b as usize] += n;
            self.normals[c as usize] += n;
        }
        for normal in &mut self.normals {
            let len = normal.length();
            if len > 1e-10 {
                *normal /= len;
            }
        }
    }

    /// Maps every vertex through `f` (normals are left untouched).
    pub fn map_vertices(&mut self, f: impl Fn(Vec3) -> Vec3) {
        for v in &mut self.vertices {
            *v = f(*v);
        }
    }

    /// Returns interleaved position/normal vertices for upload.
    #[must_use]
    pub fn interleaved(&self) -> Vec<MeshVertex> {
        self.vertices
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect()
    }

    /// Returns the interleaved vertex buffer as raw bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.interleaved()).to_vec()
    }

    /// Returns the index buffer as raw bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> SurfaceMesh {
        let mut mesh = SurfaceMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
        };
        mesh.recompute_normals();
        mesh
    }

    #[test]
    fn test_area_and_bounds() {
        let mesh = unit_triangle();
        assert_eq!(mesh.num_triangles(), 1);
        assert!((mesh.area() - 0.5).abs() < 1e-6);
        assert_eq!(mesh.bounding_box(), Some((Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0))));
        assert_eq!(SurfaceMesh::default().bounding_box(), None);
    }

    #[test]
    fn test_normals_are_unit() {
        let mesh = unit_triangle();
        assert_eq!(mesh.normals.len(), 3);
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-6);
            assert!(n.z.abs() > 0.99);
        }
    }

    #[test]
    fn test_byte_buffers() {
        let mesh = unit_triangle();
        assert_eq!(mesh.vertex_bytes().len(), 3 * std::mem::size_of::<MeshVertex>());
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }
}
