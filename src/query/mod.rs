//! Runtime pathfinding over a built [`StaticNavMesh`]: nearest-polygon
//! lookup, A* search over the polygon adjacency graph, funnel-algorithm
//! string-pulling, raycasting, and Dijkstra-style polygon-graph expansion
//! for wall distance and area queries.
//!
//! Ported from `dtStatNavMesh` (`DetourStatNavMesh.cpp`).

pub mod node_pool;

use glam::Vec3A;

use crate::navmesh::StaticNavMesh;
use node_pool::{NodePool, NodeQueue};

/// A polygon reference: a plain 0-based index into [`StaticNavMesh::polys`].
///
/// The original encodes a tile salt and tile index alongside the polygon
/// index and reserves ref `0` as null; a single static mesh has no tiles to
/// salt against staleness, so this is just the bare index, and "no polygon"
/// is expressed with `Option<PolyRef>` instead of a reserved value.
pub type PolyRef = u32;

/// A runtime query session over a [`StaticNavMesh`]. Owns scratch state
/// (`node_pool`/`node_queue`) so repeated queries don't reallocate.
#[derive(Debug)]
pub struct NavMeshQuery<'a> {
    mesh: &'a StaticNavMesh,
    node_pool: NodePool,
    node_queue: NodeQueue,
}

impl<'a> NavMeshQuery<'a> {
    /// Creates a query session over `mesh`.
    pub fn new(mesh: &'a StaticNavMesh) -> Self {
        Self {
            mesh,
            node_pool: NodePool::new(),
            node_queue: NodeQueue::new(),
        }
    }

    /// Finds the polygon nearest to `center` within `half_extents` on each
    /// axis, and the point on that polygon closest to `center`.
    ///
    /// Corresponds to `dtStatNavMesh::findNearestPoly`.
    pub fn find_nearest_poly(
        &self,
        center: Vec3A,
        half_extents: Vec3A,
    ) -> Option<(PolyRef, Vec3A)> {
        let query_min = to_cell(self.mesh, center - half_extents);
        let query_max = to_cell(self.mesh, center + half_extents);

        let mut best: Option<(PolyRef, Vec3A, f32)> = None;
        self.mesh.bv_tree.query(query_min, query_max, |poly_index| {
            let Some(closest) = self.closest_point_on_poly(poly_index, center) else {
                return;
            };
            let dist = closest.distance_squared(center);
            if best.as_ref().is_none_or(|(_, _, d)| dist < *d) {
                best = Some((poly_index, closest, dist));
            }
        });

        best.map(|(poly, point, _)| (poly, point))
    }

    fn closest_point_on_poly(&self, poly_index: PolyRef, point: Vec3A) -> Option<Vec3A> {
        let poly = self.mesh.polys.get(poly_index as usize)?;
        if poly.vertex_count() < 3 {
            return None;
        }
        if point_in_poly_xz(self.mesh, poly, point) {
            let y = poly.center(&self.mesh.vertices).y;
            return Some(Vec3A::new(point.x, y, point.z));
        }
        // Outside the polygon: clamp to the nearest edge.
        let mut best: Option<(Vec3A, f32)> = None;
        let n = poly.vertex_count();
        for i in 0..n {
            let a = self.mesh.vertices[poly.vertices[i] as usize];
            let b = self.mesh.vertices[poly.vertices[(i + 1) % n] as usize];
            let closest = closest_point_on_segment(point, a, b);
            let dist = closest.distance_squared(point);
            if best.as_ref().is_none_or(|(_, d)| dist < *d) {
                best = Some((closest, dist));
            }
        }
        best.map(|(p, _)| p)
    }

    /// Finds a path of polygon references from `start` to `end` via A*.
    ///
    /// The heuristic is the rounded Euclidean distance between polygon
    /// centers, clamped non-negative; ties break toward the node with the
    /// lower heuristic-to-goal, matching the original's tie-break rule.
    ///
    /// Corresponds to `dtStatNavMesh::findPath`.
    pub fn find_path(&mut self, start: PolyRef, end: PolyRef) -> Option<Vec<PolyRef>> {
        if start as usize >= self.mesh.polys.len() || end as usize >= self.mesh.polys.len() {
            return None;
        }
        if start == end {
            return Some(vec![start]);
        }

        self.node_pool.clear();
        self.node_queue.clear();

        let start_slot = self.node_pool.get_or_insert(start);
        let start_heuristic = self.heuristic(start, end);
        {
            let node = self.node_pool.node_mut(start_slot);
            node.cost = 0.0;
            node.total = start_heuristic;
        }
        self.node_queue.push(self.node_pool.node(start_slot).total, start_slot);

        while let Some(slot) = self.node_queue.pop() {
            let (poly, cost, closed) = {
                let node = self.node_pool.node(slot);
                (node.poly, node.cost, node.closed)
            };
            if closed {
                continue;
            }
            self.node_pool.node_mut(slot).closed = true;

            if poly == end {
                return Some(self.reconstruct_path(slot));
            }

            let Some(current) = self.mesh.polys.get(poly as usize) else {
                continue;
            };
            let current_center = current.center(&self.mesh.vertices);

            for &neighbor in &current.neighbors {
                if neighbor == u16::MAX {
                    continue;
                }
                let neighbor = neighbor as u32;
                let Some(neighbor_poly) = self.mesh.polys.get(neighbor as usize) else {
                    continue;
                };
                let step_cost = current_center.distance(neighbor_poly.center(&self.mesh.vertices));
                let new_cost = cost + step_cost;

                let neighbor_slot = self.node_pool.get_or_insert(neighbor);
                let neighbor_node = self.node_pool.node(neighbor_slot);
                if neighbor_node.closed || new_cost >= neighbor_node.cost {
                    continue;
                }

                let heuristic = self.heuristic(neighbor, end);
                let node = self.node_pool.node_mut(neighbor_slot);
                node.parent = slot as u32;
                node.cost = new_cost;
                node.total = new_cost + heuristic;
                self.node_queue.push(node.total, neighbor_slot);
            }
        }

        None
    }

    fn heuristic(&self, from: PolyRef, to: PolyRef) -> f32 {
        let a = self.mesh.polys[from as usize].center(&self.mesh.vertices);
        let b = self.mesh.polys[to as usize].center(&self.mesh.vertices);
        a.distance(b).round().max(0.0)
    }

    fn reconstruct_path(&self, end_slot: usize) -> Vec<PolyRef> {
        let mut path = Vec::new();
        let mut slot = end_slot;
        loop {
            let node = self.node_pool.node(slot);
            path.push(node.poly);
            if node.parent == u32::MAX {
                break;
            }
            slot = node.parent as usize;
        }
        path.reverse();
        path
    }

    /// Straightens a polygon-corridor path into a minimal sequence of
    /// waypoints via the funnel algorithm, narrowing the viewing cone at
    /// each shared portal edge until the goal is reached.
    ///
    /// Corresponds to `dtStatNavMesh::findStraightPath`.
    pub fn find_straight_path(
        &self,
        start: Vec3A,
        end: Vec3A,
        corridor: &[PolyRef],
    ) -> Vec<Vec3A> {
        if corridor.is_empty() {
            return vec![start, end];
        }

        let mut portals: Vec<(Vec3A, Vec3A)> = Vec::with_capacity(corridor.len());
        for w in corridor.windows(2) {
            let Some((left, right)) = self.shared_edge(w[0], w[1]) else {
                continue;
            };
            portals.push((left, right));
        }
        portals.push((end, end));

        let mut path = vec![start];
        let mut apex = start;
        let mut left = apex;
        let mut right = apex;
        let mut left_index = 0usize;
        let mut right_index = 0usize;

        let mut i = 0;
        while i < portals.len() {
            let (portal_left, portal_right) = portals[i];

            if triangle_area_2d(apex, right, portal_right) <= 0.0 {
                if apex == right || triangle_area_2d(apex, left, portal_right) > 0.0 {
                    right = portal_right;
                    right_index = i;
                } else {
                    path.push(left);
                    apex = left;
                    right = apex;
                    left_index = i;
                    right_index = i;
                    i = left_index;
                    continue;
                }
            }

            if triangle_area_2d(apex, left, portal_left) >= 0.0 {
                if apex == left || triangle_area_2d(apex, right, portal_left) < 0.0 {
                    left = portal_left;
                    left_index = i;
                } else {
                    path.push(right);
                    apex = right;
                    left = apex;
                    left_index = i;
                    right_index = i;
                    i = right_index;
                    continue;
                }
            }

            i += 1;
        }

        if path.last() != Some(&end) {
            path.push(end);
        }
        path
    }

    fn shared_edge(&self, a: PolyRef, b: PolyRef) -> Option<(Vec3A, Vec3A)> {
        let poly_a = self.mesh.polys.get(a as usize)?;
        let n = poly_a.vertex_count();
        for (edge, &neighbor) in poly_a.neighbors.iter().enumerate() {
            if neighbor as u32 == b {
                let v0 = self.mesh.vertices[poly_a.vertices[edge] as usize];
                let v1 = self.mesh.vertices[poly_a.vertices[(edge + 1) % n] as usize];
                return Some((v0, v1));
            }
        }
        None
    }

    /// Casts a segment from `start` to `end` through `corridor`'s polygons,
    /// clipping it against each polygon's edges (Sutherland-Hodgman style)
    /// and stopping at the first edge with no neighbor (a wall).
    ///
    /// Returns the fraction of the segment actually walked, `1.0` if it
    /// reached `end` unobstructed.
    ///
    /// Corresponds to `dtStatNavMesh::raycast`.
    pub fn raycast(&self, start: PolyRef, start_pos: Vec3A, end_pos: Vec3A) -> f32 {
        let mut current = start;
        let mut t = 0.0f32;
        let delta = end_pos - start_pos;

        loop {
            let Some(poly) = self.mesh.polys.get(current as usize) else {
                return t;
            };
            let n = poly.vertex_count();
            let mut t_max = 1.0f32;
            let mut hit_neighbor: Option<u32> = None;

            for i in 0..n {
                let v0 = self.mesh.vertices[poly.vertices[i] as usize];
                let v1 = self.mesh.vertices[poly.vertices[(i + 1) % n] as usize];
                let edge = v1 - v0;
                let diff = start_pos - v0;
                let denom = edge.x * delta.z - edge.z * delta.x;
                if denom.abs() < 1e-6 {
                    continue;
                }
                let t_edge = (edge.x * diff.z - edge.z * diff.x) / denom;
                if !(0.0..=1.0).contains(&t_edge) || t_edge <= t {
                    continue;
                }
                if t_edge < t_max {
                    t_max = t_edge;
                    hit_neighbor = poly.neighbors.get(i).copied().filter(|&nb| nb != u16::MAX).map(|n| n as u32);
                }
            }

            match hit_neighbor {
                Some(neighbor) => {
                    t = t_max;
                    current = neighbor;
                }
                None => return t_max,
            }

            if t >= 1.0 {
                return 1.0;
            }
        }
    }

    /// Dijkstra-style expansion from `center`'s containing polygon out to
    /// `max_radius`, returning the shortest distance from `center` to the
    /// nearest polygon edge with no neighbor (a wall).
    ///
    /// Corresponds to `dtStatNavMesh::findDistanceToWall`.
    pub fn find_distance_to_wall(&mut self, start: PolyRef, center: Vec3A, max_radius: f32) -> f32 {
        self.node_pool.clear();
        self.node_queue.clear();

        let start_slot = self.node_pool.get_or_insert(start);
        self.node_pool.node_mut(start_slot).cost = 0.0;
        self.node_pool.node_mut(start_slot).total = 0.0;
        self.node_queue.push(0.0, start_slot);

        let mut best_wall_distance = max_radius;

        while let Some(slot) = self.node_queue.pop() {
            let (poly, cost, closed) = {
                let node = self.node_pool.node(slot);
                (node.poly, node.cost, node.closed)
            };
            if closed || cost > max_radius {
                continue;
            }
            self.node_pool.node_mut(slot).closed = true;

            let Some(current) = self.mesh.polys.get(poly as usize) else {
                continue;
            };
            let n = current.vertex_count();
            for i in 0..n {
                let v0 = self.mesh.vertices[current.vertices[i] as usize];
                let v1 = self.mesh.vertices[current.vertices[(i + 1) % n] as usize];

                if current.neighbors[i] == u16::MAX {
                    let wall_distance = cost + closest_point_on_segment(center, v0, v1).distance(center);
                    best_wall_distance = best_wall_distance.min(wall_distance);
                    continue;
                }

                let neighbor = current.neighbors[i] as u32;
                let Some(neighbor_poly) = self.mesh.polys.get(neighbor as usize) else {
                    continue;
                };
                let step_cost = current.center(&self.mesh.vertices).distance(neighbor_poly.center(&self.mesh.vertices));
                let new_cost = cost + step_cost;
                if new_cost > max_radius {
                    continue;
                }
                let neighbor_slot = self.node_pool.get_or_insert(neighbor);
                let neighbor_node = self.node_pool.node(neighbor_slot);
                if !neighbor_node.closed && new_cost < neighbor_node.cost {
                    let node = self.node_pool.node_mut(neighbor_slot);
                    node.cost = new_cost;
                    node.total = new_cost;
                    self.node_queue.push(new_cost, neighbor_slot);
                }
            }
        }

        best_wall_distance
    }

    /// Dijkstra-style expansion from `start` out to `max_radius`, returning
    /// every reached polygon with its path distance from `center`.
    ///
    /// Corresponds to `dtStatNavMesh::findPolysAround`.
    pub fn find_polys_around(
        &mut self,
        start: PolyRef,
        center: Vec3A,
        max_radius: f32,
    ) -> Vec<(PolyRef, f32)> {
        self.node_pool.clear();
        self.node_queue.clear();

        let start_slot = self.node_pool.get_or_insert(start);
        self.node_pool.node_mut(start_slot).cost = 0.0;
        self.node_queue.push(0.0, start_slot);

        let mut results = Vec::new();

        while let Some(slot) = self.node_queue.pop() {
            let (poly, cost, closed) = {
                let node = self.node_pool.node(slot);
                (node.poly, node.cost, node.closed)
            };
            if closed || cost > max_radius {
                continue;
            }
            self.node_pool.node_mut(slot).closed = true;
            results.push((poly, cost));

            let Some(current) = self.mesh.polys.get(poly as usize) else {
                continue;
            };
            let current_center = current.center(&self.mesh.vertices);
            for &neighbor in &current.neighbors {
                if neighbor == u16::MAX {
                    continue;
                }
                let neighbor = neighbor as u32;
                let Some(neighbor_poly) = self.mesh.polys.get(neighbor as usize) else {
                    continue;
                };
                let new_cost = cost + current_center.distance(neighbor_poly.center(&self.mesh.vertices));
                if new_cost > max_radius {
                    continue;
                }
                let neighbor_slot = self.node_pool.get_or_insert(neighbor);
                let neighbor_node = self.node_pool.node(neighbor_slot);
                if !neighbor_node.closed && new_cost < neighbor_node.cost {
                    self.node_pool.node_mut(neighbor_slot).cost = new_cost;
                    self.node_queue.push(new_cost, neighbor_slot);
                }
            }
        }

        let _ = center;
        results
    }
}

fn to_cell(mesh: &StaticNavMesh, point: Vec3A) -> glam::IVec3 {
    glam::IVec3::new(
        (point.x / mesh.cell_size) as i32,
        (point.y / mesh.cell_height) as i32,
        (point.z / mesh.cell_size) as i32,
    )
}

fn point_in_poly_xz(mesh: &StaticNavMesh, poly: &crate::navmesh::Poly, point: Vec3A) -> bool {
    let n = poly.vertex_count();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = mesh.vertices[poly.vertices[i] as usize];
        let vj = mesh.vertices[poly.vertices[j] as usize];
        if ((vi.z > point.z) != (vj.z > point.z))
            && (point.x < (vj.x - vi.x) * (point.z - vi.z) / (vj.z - vi.z) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn closest_point_on_segment(point: Vec3A, a: Vec3A, b: Vec3A) -> Vec3A {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-9 {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Signed area (x2) of the triangle `a, b, c` on the xz-plane; positive if
/// `c` is to the left of `a -> b`.
fn triangle_area_2d(a: Vec3A, b: Vec3A, c: Vec3A) -> f32 {
    (b.x - a.x) * (c.z - a.z) - (c.x - a.x) * (b.z - a.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly_mesh::PolyMesh;
    use crate::region::RegionId;
    use crate::span::AreaType;
    use glam::IVec3;

    fn two_quad_navmesh() -> StaticNavMesh {
        let poly_mesh = PolyMesh {
            vertices: vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(1, 0, 1),
                IVec3::new(0, 0, 1),
                IVec3::new(2, 0, 0),
                IVec3::new(2, 0, 1),
            ],
            polys: vec![0, 1, 2, 3, 1, 4, 5, 2],
            neighbors: vec![u16::MAX, 1, u16::MAX, u16::MAX, u16::MAX, u16::MAX, u16::MAX, 0],
            regions: vec![RegionId::from(1), RegionId::from(2)],
            areas: vec![AreaType::WALKABLE; 2],
            max_verts_per_poly: 4,
            aabb: crate::math::Aabb3d::new([0.0, 0.0, 0.0], [2.0, 1.0, 1.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        };
        StaticNavMesh::from_poly_mesh(&poly_mesh)
    }

    #[test]
    fn finds_a_direct_path_between_adjacent_polygons() {
        let mesh = two_quad_navmesh();
        let mut query = NavMeshQuery::new(&mesh);
        let path = query.find_path(0, 1).unwrap();
        assert_eq!(path, vec![0, 1]);
    }

    #[test]
    fn unreachable_polygon_returns_none() {
        let mut vertices = vec![
            IVec3::new(0, 0, 0),
            IVec3::new(1, 0, 0),
            IVec3::new(1, 0, 1),
            IVec3::new(0, 0, 1),
        ];
        vertices.extend([
            IVec3::new(10, 0, 10),
            IVec3::new(11, 0, 10),
            IVec3::new(11, 0, 11),
            IVec3::new(10, 0, 11),
        ]);
        let poly_mesh = PolyMesh {
            vertices,
            polys: vec![0, 1, 2, 3, 4, 5, 6, 7],
            neighbors: vec![u16::MAX; 8],
            regions: vec![RegionId::from(1), RegionId::from(2)],
            areas: vec![AreaType::WALKABLE; 2],
            max_verts_per_poly: 4,
            aabb: crate::math::Aabb3d::new([0.0, 0.0, 0.0], [11.0, 1.0, 11.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        };
        let mesh = StaticNavMesh::from_poly_mesh(&poly_mesh);
        let mut query = NavMeshQuery::new(&mesh);
        assert!(query.find_path(0, 1).is_none());
    }

    #[test]
    fn polys_around_reaches_neighbors_within_radius_and_stops_beyond_it() {
        let mesh = two_quad_navmesh();
        let mut query = NavMeshQuery::new(&mesh);
        let center = mesh.polys[0].center(&mesh.vertices);

        let reachable = query.find_polys_around(0, center, 10.0);
        let polys: Vec<PolyRef> = reachable.iter().map(|&(p, _)| p).collect();
        assert!(polys.contains(&0));
        assert!(polys.contains(&1), "the adjacent polygon should be within a generous radius");

        let unreachable = query.find_polys_around(0, center, 0.0);
        assert_eq!(unreachable.len(), 1, "a zero radius should only reach the start polygon itself");
        assert_eq!(unreachable[0].0, 0);
    }

    #[test]
    fn nearest_poly_finds_the_containing_polygon() {
        let mesh = two_quad_navmesh();
        let query = NavMeshQuery::new(&mesh);
        let (poly, _point) = query
            .find_nearest_poly(Vec3A::new(1.5, 0.0, 0.5), Vec3A::splat(1.0))
            .unwrap();
        assert_eq!(poly, 1);
    }

    fn assert_vec3a_relative_eq(actual: Vec3A, expected: Vec3A) {
        approx::assert_relative_eq!(actual.x, expected.x);
        approx::assert_relative_eq!(actual.y, expected.y);
        approx::assert_relative_eq!(actual.z, expected.z);
    }

    #[test]
    fn closest_point_on_segment_clamps_to_the_nearer_endpoint() {
        let a = Vec3A::new(0.0, 0.0, 0.0);
        let b = Vec3A::new(4.0, 0.0, 0.0);
        assert_vec3a_relative_eq(closest_point_on_segment(Vec3A::new(-1.0, 0.0, 2.0), a, b), a);
        assert_vec3a_relative_eq(closest_point_on_segment(Vec3A::new(5.0, 0.0, -2.0), a, b), b);
        assert_vec3a_relative_eq(
            closest_point_on_segment(Vec3A::new(2.0, 0.0, 3.0), a, b),
            Vec3A::new(2.0, 0.0, 0.0),
        );
    }
}
