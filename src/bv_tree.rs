//! A bounding-volume tree over a navmesh's polygons: a depth-first-ordered
//! array of AABB nodes, each leaf carrying a polygon index and each internal
//! node an "escape index" — the array offset to jump to when a query's box
//! misses the whole subtree, so traversal never needs a stack or recursion.
//!
//! Ported from `rcCreateBVTree` / `dtStatNavMesh::queryPolygons`'s box walk.

use glam::IVec3;

use crate::poly_mesh::PolyMesh;

/// One node in the flattened BV-tree array.
#[derive(Debug, Clone, Copy)]
pub struct BvNode {
    /// Minimum corner, in quantized cell-space.
    pub min: IVec3,
    /// Maximum corner, in quantized cell-space.
    pub max: IVec3,
    /// For a leaf: the polygon index. For an internal node: unused (`u32::MAX`).
    pub poly_index: u32,
    /// Positive: number of array slots to skip to leave this subtree
    /// (`1` for a leaf). Used to prune a miss without recursion.
    pub escape_index: i32,
}

impl BvNode {
    fn is_leaf(&self) -> bool {
        self.escape_index == 1
    }
}

/// A flattened bounding-volume tree over a [`PolyMesh`]'s polygons.
#[derive(Debug, Clone, Default)]
pub struct BvTree {
    /// DFS-ordered nodes; node 0 is the root.
    pub nodes: Vec<BvNode>,
}

struct Item {
    poly_index: u32,
    min: IVec3,
    max: IVec3,
}

impl BvTree {
    /// Builds a BV-tree over every polygon in `mesh`.
    pub fn build(mesh: &PolyMesh) -> Self {
        let mut items: Vec<Item> = Vec::with_capacity(mesh.poly_count());
        for p in 0..mesh.poly_count() {
            let poly = mesh.poly(p);
            let mut min = IVec3::splat(i32::MAX);
            let mut max = IVec3::splat(i32::MIN);
            for &v in poly {
                if v == u16::MAX {
                    break;
                }
                let vert = mesh.vertices[v as usize];
                min = min.min(vert);
                max = max.max(vert);
            }
            items.push(Item {
                poly_index: p as u32,
                min,
                max,
            });
        }

        let mut nodes = Vec::with_capacity(items.len() * 2);
        if !items.is_empty() {
            subdivide(&mut items, &mut nodes);
        }
        Self { nodes }
    }

    /// Calls `visit` for every leaf polygon whose node overlaps `query_min..=query_max`.
    pub fn query(&self, query_min: IVec3, query_max: IVec3, mut visit: impl FnMut(u32)) {
        let mut i = 0usize;
        while i < self.nodes.len() {
            let node = &self.nodes[i];
            let overlap = node.min.cmple(query_max).all() && node.max.cmpge(query_min).all();
            if !overlap {
                i += node.escape_index.max(1) as usize;
                continue;
            }
            if node.is_leaf() {
                visit(node.poly_index);
            }
            i += 1;
        }
    }
}

/// Recursively splits `items` along its longest axis at the median, writing
/// nodes in DFS pre-order with each subtree's escape index patched in after
/// its children are emitted.
fn subdivide(items: &mut [Item], nodes: &mut Vec<BvNode>) {
    let node_index = nodes.len();
    let (min, max) = bounds_of(items);
    nodes.push(BvNode {
        min,
        max,
        poly_index: u32::MAX,
        escape_index: 1,
    });

    if items.len() == 1 {
        nodes[node_index].poly_index = items[0].poly_index;
        nodes[node_index].escape_index = 1;
        return;
    }

    let extent = max - min;
    let axis = if extent.x > extent.z { 0 } else { 2 };
    items.sort_by_key(|item| match axis {
        0 => item.min.x + item.max.x,
        _ => item.min.z + item.max.z,
    });

    let mid = items.len() / 2;
    let (left, right) = items.split_at_mut(mid);
    subdivide(left, nodes);
    subdivide(right, nodes);

    nodes[node_index].escape_index = (nodes.len() - node_index) as i32;
}

fn bounds_of(items: &[Item]) -> (IVec3, IVec3) {
    let mut min = IVec3::splat(i32::MAX);
    let mut max = IVec3::splat(i32::MIN);
    for item in items {
        min = min.min(item.min);
        max = max.max(item.max);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionId;
    use crate::span::AreaType;

    fn two_quad_mesh() -> PolyMesh {
        PolyMesh {
            vertices: vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(1, 0, 1),
                IVec3::new(0, 0, 1),
                IVec3::new(2, 0, 0),
                IVec3::new(2, 0, 1),
            ],
            polys: vec![0, 1, 2, 3, 1, 4, 5, 2],
            neighbors: vec![u16::MAX; 8],
            regions: vec![RegionId::from(1), RegionId::from(2)],
            areas: vec![AreaType::WALKABLE; 2],
            max_verts_per_poly: 4,
            aabb: crate::math::Aabb3d::new([0.0, 0.0, 0.0], [2.0, 1.0, 1.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
    }

    #[test]
    fn every_polygon_is_reachable_via_a_full_range_query() {
        let mesh = two_quad_mesh();
        let tree = BvTree::build(&mesh);
        let mut found = Vec::new();
        tree.query(IVec3::splat(i32::MIN), IVec3::splat(i32::MAX), |p| found.push(p));
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn a_tight_query_box_finds_only_its_polygon() {
        let mesh = two_quad_mesh();
        let tree = BvTree::build(&mesh);
        let mut found = Vec::new();
        tree.query(IVec3::new(0, 0, 0), IVec3::new(1, 0, 1), |p| found.push(p));
        assert_eq!(found, vec![0]);
    }
}
