//! Input geometry: a plain triangle soup the pipeline rasterizes into a [`Heightfield`](crate::heightfield::Heightfield).

use glam::{UVec3, Vec3A};

use crate::{math::Aabb3d, span::AreaType};

/// A triangle mesh used as input for [`Heightfield`](crate::heightfield::Heightfield) rasterization.
///
/// Triangles are one-sided; winding determines the normal direction used by
/// [`TriMesh::mark_walkable_triangles`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TriMesh {
    /// The mesh's vertices.
    pub vertices: Vec<Vec3A>,
    /// Triangle indices into [`TriMesh::vertices`].
    pub indices: Vec<UVec3>,
    /// The area type for each triangle. Indexed 1:1 with [`TriMesh::indices`].
    /// Starts out all [`AreaType::NOT_WALKABLE`] until [`TriMesh::mark_walkable_triangles`] runs.
    pub area_types: Vec<AreaType>,
}

impl TriMesh {
    /// Builds a trimesh from flat vertex and index buffers, with every
    /// triangle initially unwalkable.
    pub fn new(vertices: Vec<Vec3A>, indices: Vec<UVec3>) -> Self {
        let area_types = vec![AreaType::NOT_WALKABLE; indices.len()];
        Self {
            vertices,
            indices,
            area_types,
        }
    }

    /// Appends `other`'s geometry onto `self`, offsetting its indices.
    ///
    /// # Panics
    /// Panics if the combined vertex count would exceed `u32::MAX`.
    pub fn extend(&mut self, other: TriMesh) {
        assert!(
            self.vertices.len() + other.vertices.len() <= u32::MAX as usize,
            "cannot extend a trimesh past 2^32 vertices"
        );
        let next_vertex_index = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices
            .extend(other.indices.iter().map(|i| i + next_vertex_index));
        self.area_types.extend(other.area_types);
    }

    /// Computes the AABB of the trimesh. `None` if there are no vertices.
    pub fn compute_aabb(&self) -> Option<Aabb3d> {
        Aabb3d::from_verts(&self.vertices)
    }

    /// Marks each triangle walkable ([`AreaType::WALKABLE`]) if its normal's
    /// y-component exceeds `cos(walkable_slope_angle)`, leaving steeper
    /// triangles at [`AreaType::NOT_WALKABLE`].
    ///
    /// `threshold_rad` is the maximum walkable slope angle, in radians.
    pub fn mark_walkable_triangles(&mut self, threshold_rad: f32) {
        let threshold_cos = threshold_rad.cos();
        for (i, triangle) in self.indices.iter().enumerate() {
            let normal = triangle_normal(triangle, &self.vertices);
            if normal.y > threshold_cos {
                self.area_types[i] = AreaType::WALKABLE;
            }
        }
    }
}

/// Computes a triangle's (not necessarily unit) outward normal.
pub(crate) fn triangle_normal(indices: &UVec3, vertices: &[Vec3A]) -> Vec3A {
    let a = vertices[indices.x as usize];
    let b = vertices[indices.y as usize];
    let c = vertices[indices.z as usize];
    (b - a).cross(c - a).normalize_or_zero()
}

/// Computes a triangle's AABB.
pub(crate) fn triangle_aabb(verts: &[Vec3A; 3]) -> Aabb3d {
    Aabb3d {
        min: verts[0].min(verts[1]).min(verts[2]),
        max: verts[0].max(verts[1]).max(verts[2]),
    }
}
