//! Marching cubes contouring of a scalar volume.
//!
//! The triangle table follows `MarchingCubeCpp` (public domain). Cells are
//! visited z-outermost, x-innermost, so a vertex on an edge shared by several
//! cells is created once, by the first cell that touches it, and reused through
//! a two-slab index cache.

#![allow(
    clippy::unreadable_literal,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use glam::UVec3;

use crate::mesh::SurfaceMesh;

/// The 12 cube edges as `(axis, start corner)`, in triangle-table order.
///
/// Corner `c` sits at offset `(c & 1, (c >> 1) & 1, (c >> 2) & 1)` from the
/// cell's minimum corner; an edge runs from its start corner one step along
/// `axis`.
const EDGES: [(usize, usize); 12] = [
    (0, 0),
    (0, 2),
    (0, 4),
    (0, 6),
    (1, 0),
    (1, 1),
    (1, 4),
    (1, 5),
    (2, 0),
    (2, 1),
    (2, 2),
    (2, 3),
];

#[inline]
fn corner_offset(corner: usize) -> UVec3 {
    UVec3::new(
        (corner & 1) as u32,
        ((corner >> 1) & 1) as u32,
        ((corner >> 2) & 1) as u32,
    )
}

/// Extracts the isosurface `field == isoval` as a triangle mesh.
///
/// `field` holds `dims.x * dims.y * dims.z` samples with x varying fastest.
/// Vertices are returned in voxel-index space; the caller maps them to
/// physical space. A grid with fewer than two samples along any axis has no
/// cells and yields an empty mesh.
///
/// # Panics
/// Panics if `field.len()` does not match `dims`.
#[must_use]
pub fn marching_cubes(field: &[f32], dims: UVec3, isoval: f32) -> SurfaceMesh {
    let (nx, ny, nz) = (dims.x as usize, dims.y as usize, dims.z as usize);
    assert!(
        field.len() == nx * ny * nz,
        "Field size {} does not match dimensions {}x{}x{} = {}",
        field.len(),
        nx,
        ny,
        nz,
        nx * ny * nz
    );

    let mut mesh = SurfaceMesh::default();
    if dims.min_element() < 2 {
        return mesh;
    }

    let index = |p: UVec3| p.x as usize + nx * (p.y as usize + ny * p.z as usize);

    // Vertex index per edge axis for every (x, y) node of two z-levels.
    let slab_index = |p: UVec3| nx * ny * (p.z as usize % 2) + p.y as usize * nx + p.x as usize;
    let mut slab = vec![[0_u32; 3]; nx * ny * 2];

    let mut values = [0.0_f32; 8];
    let mut edge_vertices = [0_u32; 12];

    for z in 0..dims.z - 1 {
        for y in 0..dims.y - 1 {
            for x in 0..dims.x - 1 {
                let cell = UVec3::new(x, y, z);

                let mut config = 0_usize;
                for (corner, value) in values.iter_mut().enumerate() {
                    *value = field[index(cell + corner_offset(corner))] - isoval;
                    if *value < 0.0 {
                        config |= 1 << corner;
                    }
                }
                if config == 0 || config == 255 {
                    continue;
                }

                for (edge, &(axis, start)) in EDGES.iter().enumerate() {
                    let offset = corner_offset(start);
                    let node = cell + offset;
                    // An edge on the cell's lower face along another axis was
                    // already visited by the neighbouring cell on that side.
                    let owned = (0..3)
                        .filter(|&d| d != axis)
                        .all(|d| offset[d] == 1 || cell[d] == 0);
                    if owned {
                        let va = values[start];
                        let vb = values[start | (1 << axis)];
                        if (va < 0.0) != (vb < 0.0) {
                            let mut v = node.as_vec3();
                            v[axis] += va / (va - vb);
                            slab[slab_index(node)][axis] = mesh.vertices.len() as u32;
                            mesh.vertices.push(v);
                        }
                    }
                    edge_vertices[edge] = slab[slab_index(node)][axis];
                }

                let entry = MC_TRIS[config];
                let n_indices = (entry & 0xF) as usize * 3;
                for i in 0..n_indices {
                    let edge = ((entry >> (4 + 4 * i)) & 0xF) as usize;
                    mesh.indices.push(edge_vertices[edge]);
                }
            }
        }
    }

    mesh.recompute_normals();
    mesh
}

/// Look-up table for triangle configurations (256 entries, one per cube configuration).
///
/// Each entry is a `u64` encoding:
/// - Bits `[3:0]`: Number of triangles (0-5)
/// - Bits `[7:4]`, `[11:8]`, ...: Edge indices (0-11) for each triangle vertex, 4 bits each
///
/// Taken from `MarchingCubeCpp` (public domain).
#[rustfmt::skip]
static MC_TRIS: [u64; 256] = [
    0, 33793, 36945, 159668546,
    18961, 144771090, 5851666, 595283255635,
    20913, 67640146, 193993474, 655980856339,
    88782242, 736732689667, 797430812739, 194554754,
    26657, 104867330, 136709522, 298069416227,
    109224258, 8877909667, 318136408323, 1567994331701604,
    189884450, 350847647843, 559958167731, 3256298596865604,
    447393122899, 651646838401572, 2538311371089956, 737032694307,
    29329, 43484162, 91358498, 374810899075,
    158485010, 178117478419, 88675058979, 433581536604804,
    158486962, 649105605635, 4866906995, 3220959471609924,
    649165714851, 3184943915608436, 570691368417972, 595804498035,
    124295042, 431498018963, 508238522371, 91518530,
    318240155763, 291789778348404, 1830001131721892, 375363605923,
    777781811075, 1136111028516116, 3097834205243396, 508001629971,
    2663607373704004, 680242583802939237, 333380770766129845, 179746658,
    42545, 138437538, 93365810, 713842853011,
    73602098, 69575510115, 23964357683, 868078761575828,
    28681778, 713778574611, 250912709379, 2323825233181284,
    302080811955, 3184439127991172, 1694042660682596, 796909779811,
    176306722, 150327278147, 619854856867, 1005252473234484,
    211025400963, 36712706, 360743481544788, 150627258963,
    117482600995, 1024968212107700, 2535169275963444, 4734473194086550421,
    628107696687956, 9399128243, 5198438490361643573, 194220594,
    104474994, 566996932387, 427920028243, 2014821863433780,
    492093858627, 147361150235284, 2005882975110676, 9671606099636618005,
    777701008947, 3185463219618820, 482784926917540, 2900953068249785909,
    1754182023747364, 4274848857537943333, 13198752741767688709, 2015093490989156,
    591272318771, 2659758091419812, 1531044293118596, 298306479155,
    408509245114388, 210504348563, 9248164405801223541, 91321106,
    2660352816454484, 680170263324308757, 8333659837799955077, 482966828984116,
    4274926723105633605, 3184439197724820, 192104450, 15217,
    45937, 129205250, 129208402, 529245952323,
    169097138, 770695537027, 382310500883, 2838550742137652,
    122763026, 277045793139, 81608128403, 1991870397907988,
    362778151475, 2059003085103236, 2132572377842852, 655681091891,
    58419234, 239280858627, 529092143139, 1568257451898804,
    447235128115, 679678845236084, 2167161349491220, 1554184567314086709,
    165479003923, 1428768988226596, 977710670185060, 10550024711307499077,
    1305410032576132, 11779770265620358997, 333446212255967269, 978168444447012,
    162736434, 35596216627, 138295313843, 891861543990356,
    692616541075, 3151866750863876, 100103641866564, 6572336607016932133,
    215036012883, 726936420696196, 52433666, 82160664963,
    2588613720361524, 5802089162353039525, 214799000387, 144876322,
    668013605731, 110616894681956, 1601657732871812, 430945547955,
    3156382366321172, 7644494644932993285, 3928124806469601813, 3155990846772900,
    339991010498708, 10743689387941597493, 5103845475, 105070898,
    3928064910068824213, 156265010, 1305138421793636, 27185,
    195459938, 567044449971, 382447549283, 2175279159592324,
    443529919251, 195059004769796, 2165424908404116, 1554158691063110021,
    504228368803, 1436350466655236, 27584723588724, 1900945754488837749,
    122971970, 443829749251, 302601798803, 108558722,
    724700725875, 43570095105972, 2295263717447940, 2860446751369014181,
    2165106202149444, 69275726195, 2860543885641537797, 2165106320445780,
    2280890014640004, 11820349930268368933, 8721082628082003989, 127050770,
    503707084675, 122834978, 2538193642857604, 10129,
    801441490467, 2923200302876740, 1443359556281892, 2901063790822564949,
    2728339631923524, 7103874718248233397, 12775311047932294245, 95520290,
    2623783208098404, 1900908618382410757, 137742672547, 2323440239468964,
    362478212387, 727199575803140, 73425410, 34337,
    163101314, 668566030659, 801204361987, 73030562,
    591509145619, 162574594, 100608342969108, 5553,
    724147968595, 1436604830452292, 176259090, 42001,
    143955266, 2385, 18433, 0,
];

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn sphere_field(n: u32, radius: f32) -> Vec<f32> {
        let center = Vec3::splat(n as f32 / 2.0);
        let mut field = Vec::with_capacity((n * n * n) as usize);
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    let p = Vec3::new(i as f32, j as f32, k as f32);
                    field.push((p - center).length() - radius);
                }
            }
        }
        field
    }

    #[test]
    fn test_constant_fields_have_no_surface() {
        let above = vec![1.0; 27];
        assert!(marching_cubes(&above, UVec3::splat(3), 0.0).is_empty());
        let below = vec![-1.0; 27];
        assert!(marching_cubes(&below, UVec3::splat(3), 0.0).is_empty());
    }

    #[test]
    fn test_single_crossing() {
        // Only corner (0,0,0) is below the isovalue.
        let mut field = vec![1.0_f32; 8];
        field[0] = -1.0;
        let mesh = marching_cubes(&field, UVec3::splat(2), 0.0);
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.num_vertices(), 3);
        for v in &mesh.vertices {
            assert!((v.length() - 0.5).abs() < 1e-6, "vertex {v:?} not at edge midpoint");
        }
    }

    #[test]
    fn test_sphere() {
        let n = 20_u32;
        let radius = n as f32 / 4.0;
        let center = Vec3::splat(n as f32 / 2.0);
        let mesh = marching_cubes(&sphere_field(n, radius), UVec3::splat(n), 0.0);

        assert!(
            mesh.num_triangles() > 100,
            "Expected >100 triangles, got {}",
            mesh.num_triangles()
        );
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
        assert_eq!(mesh.indices.len() % 3, 0);

        for &idx in &mesh.indices {
            assert!((idx as usize) < mesh.vertices.len());
        }
        for normal in &mesh.normals {
            assert!((normal.length() - 1.0).abs() < 0.01);
        }
        for v in &mesh.vertices {
            let dist = (*v - center).length();
            assert!(
                (dist - radius).abs() < 1.0,
                "Vertex {v:?} is {dist} from center (radius {radius})"
            );
        }
    }

    #[test]
    fn test_shared_edges_are_welded() {
        // A closed surface has every edge shared by exactly two triangles.
        let mesh = marching_cubes(&sphere_field(12, 3.3), UVec3::splat(12), 0.0);
        let mut edges = std::collections::HashMap::new();
        for t in mesh.indices.chunks_exact(3) {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        assert!(!edges.is_empty());
        assert!(edges.values().all(|&count| count == 2));
    }

    #[test]
    fn test_anisotropic_dims() {
        // Slab boundary along x only: x < 2 is below the isovalue.
        let dims = UVec3::new(5, 3, 4);
        let mut field = Vec::new();
        for _z in 0..dims.z {
            for _y in 0..dims.y {
                for x in 0..dims.x {
                    field.push(if x < 2 { 0.0 } else { 1.0 });
                }
            }
        }
        let mesh = marching_cubes(&field, dims, 0.5);
        assert!(!mesh.is_empty());
        for v in &mesh.vertices {
            assert!((v.x - 1.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_too_small_grid_is_empty() {
        let field = vec![0.0, 1.0];
        assert!(marching_cubes(&field, UVec3::new(2, 1, 1), 0.5).is_empty());
    }

    #[test]
    #[should_panic(expected = "Field size")]
    fn test_wrong_field_size() {
        let field = vec![0.0; 10];
        let _ = marching_cubes(&field, UVec3::splat(3), 0.0);
    }
}
