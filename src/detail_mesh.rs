//! Detail mesh: a per-polygon triangulation used for height-accurate ground
//! rendering and `findDistanceToWall`-style queries. This port does not
//! resample the source heightfield's height samples inside each polygon
//! (the original's `getHeightData`/sampling pass) — the excluded terrain
//! height detail is out of scope; each polygon's detail vertices are simply
//! its own base vertices, triangulated.

use glam::Vec3A;

use crate::poly_mesh::PolyMesh;

/// One polygon's detail triangulation: a vertex range into
/// [`DetailMesh::vertices`] and a triangle range into [`DetailMesh::triangles`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubMesh {
    /// First vertex index for this polygon in [`DetailMesh::vertices`].
    pub vertex_base: u32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// First triangle index for this polygon in [`DetailMesh::triangles`].
    pub triangle_base: u32,
    /// Number of triangles.
    pub triangle_count: u32,
}

/// Flattened per-polygon detail triangulation of a [`PolyMesh`].
#[derive(Debug, Clone, Default)]
pub struct DetailMesh {
    /// One entry per source polygon.
    pub sub_meshes: Vec<SubMesh>,
    /// World-space detail vertices, polygon-major.
    pub vertices: Vec<Vec3A>,
    /// Triangle indices, local to each polygon's vertex range (add
    /// `sub_meshes[p].vertex_base` to get a global index).
    pub triangles: Vec<[u8; 3]>,
}

impl DetailMesh {
    /// Builds a detail mesh by fan-triangulating each polygon's own vertices
    /// around its first vertex.
    ///
    /// Corresponds to the non-sampling path of `rcBuildPolyMeshDetail`.
    pub fn from_poly_mesh(mesh: &PolyMesh) -> Self {
        let mut sub_meshes = Vec::with_capacity(mesh.poly_count());
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();

        for p in 0..mesh.poly_count() {
            let poly = mesh.poly(p);
            let poly_verts: Vec<u16> = poly
                .iter()
                .copied()
                .take_while(|&v| v != u16::MAX)
                .collect();
            let vertex_base = vertices.len() as u32;
            let triangle_base = triangles.len() as u32;

            for &v in &poly_verts {
                let cell = mesh.vertices[v as usize];
                vertices.push(Vec3A::new(
                    mesh.aabb.min.x + cell.x as f32 * mesh.cell_size,
                    mesh.aabb.min.y + cell.y as f32 * mesh.cell_height,
                    mesh.aabb.min.z + cell.z as f32 * mesh.cell_size,
                ));
            }

            for i in 1..poly_verts.len().saturating_sub(1) {
                triangles.push([0u8, i as u8, (i + 1) as u8]);
            }

            sub_meshes.push(SubMesh {
                vertex_base,
                vertex_count: poly_verts.len() as u32,
                triangle_base,
                triangle_count: (triangles.len() as u32).saturating_sub(triangle_base),
            });
        }

        Self {
            sub_meshes,
            vertices,
            triangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionId;
    use crate::span::AreaType;
    use glam::IVec3;

    #[test]
    fn a_single_quad_polygon_becomes_two_triangles() {
        let mesh = PolyMesh {
            vertices: vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(1, 0, 1),
                IVec3::new(0, 0, 1),
            ],
            polys: vec![0, 1, 2, 3],
            neighbors: vec![u16::MAX; 4],
            regions: vec![RegionId::from(1)],
            areas: vec![AreaType::WALKABLE],
            max_verts_per_poly: 4,
            aabb: crate::math::Aabb3d::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        };
        let detail = DetailMesh::from_poly_mesh(&mesh);
        assert_eq!(detail.sub_meshes[0].triangle_count, 2);
    }
}
