//! Polygon mesh construction: triangulates each contour by ear-clipping, then
//! greedily merges adjacent triangles/polygons back together wherever the
//! result stays convex and within `max_verts_per_poly`, producing the final
//! navigable polygon mesh.
//!
//! Ported from `rcBuildPolyMesh` (`RecastMesh.cpp`): `triangulate`,
//! `getPolyMergeValue`, `mergePolyVerts`.

use std::collections::HashMap;

use glam::IVec3;

use crate::contours::ContourSet;
use crate::region::RegionId;
use crate::span::AreaType;

/// The triangulated-and-merged polygon mesh produced by [`build_poly_mesh`].
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    /// Shared vertex pool, in cell-space coordinates.
    pub vertices: Vec<IVec3>,
    /// Each polygon's vertex indices, padded with `u16::MAX` up to
    /// `max_verts_per_poly`; the first `u16::MAX` entry (if any) ends the polygon.
    pub polys: Vec<u16>,
    /// Parallel to polygon slots: the neighbor polygon index across each
    /// edge, or `u16::MAX` if that edge borders unwalkable space/the mesh edge.
    pub neighbors: Vec<u16>,
    /// Per-polygon region id.
    pub regions: Vec<RegionId>,
    /// Per-polygon area type.
    pub areas: Vec<AreaType>,
    /// Maximum vertices any one polygon may have.
    pub max_verts_per_poly: usize,
    /// Bounds, carried through from the contour set.
    pub aabb: crate::math::Aabb3d,
    /// Cell size on the xz-plane.
    pub cell_size: f32,
    /// Cell size along the y-axis.
    pub cell_height: f32,
}

impl PolyMesh {
    /// Number of polygons in the mesh.
    pub fn poly_count(&self) -> usize {
        if self.max_verts_per_poly == 0 {
            0
        } else {
            self.polys.len() / self.max_verts_per_poly
        }
    }

    /// Returns polygon `index`'s vertex index slots, `u16::MAX`-padded.
    pub fn poly(&self, index: usize) -> &[u16] {
        let start = index * self.max_verts_per_poly;
        &self.polys[start..start + self.max_verts_per_poly]
    }

    /// Returns polygon `index`'s neighbor slots, `u16::MAX`-padded.
    pub fn poly_neighbors(&self, index: usize) -> &[u16] {
        let start = index * self.max_verts_per_poly;
        &self.neighbors[start..start + self.max_verts_per_poly]
    }
}

const MESH_NULL_IDX: u16 = u16::MAX;

/// Builds a polygon mesh from traced contours.
///
/// Triangles whose ear-clip would be degenerate are skipped with a warning
/// logged to `ctx`, rather than aborting the whole mesh.
pub fn build_poly_mesh(
    contours: &ContourSet,
    max_verts_per_poly: usize,
    ctx: &mut crate::context::BuildContext,
) -> PolyMesh {
    let mut vertex_lookup: HashMap<(i32, i32, i32), u16> = HashMap::new();
    let mut vertices: Vec<IVec3> = Vec::new();
    let mut polys: Vec<Vec<u16>> = Vec::new();
    let mut regions: Vec<RegionId> = Vec::new();
    let mut areas: Vec<AreaType> = Vec::new();

    for contour in &contours.contours {
        if contour.vertices.len() < 3 {
            continue;
        }
        let indices: Vec<u16> = contour
            .vertices
            .iter()
            .map(|v| intern_vertex(&mut vertex_lookup, &mut vertices, *v))
            .collect();

        let triangles = match triangulate(&contour.vertices, &indices) {
            Some(t) => t,
            None => {
                ctx.log_warning(
                    "poly_mesh",
                    format!("failed to triangulate region {:?}; skipping", contour.region),
                );
                continue;
            }
        };

        for triangle in triangles {
            polys.push(triangle.to_vec());
            regions.push(contour.region);
            areas.push(contour.area);
        }
    }

    merge_polys(&mut polys, &mut regions, &mut areas, &vertices, max_verts_per_poly);

    let poly_count = polys.len();
    let mut flat_polys = vec![MESH_NULL_IDX; poly_count * max_verts_per_poly];
    for (i, poly) in polys.iter().enumerate() {
        for (j, &v) in poly.iter().enumerate() {
            flat_polys[i * max_verts_per_poly + j] = v;
        }
    }

    let mut mesh = PolyMesh {
        vertices,
        polys: flat_polys,
        neighbors: vec![MESH_NULL_IDX; poly_count * max_verts_per_poly],
        regions,
        areas,
        max_verts_per_poly,
        aabb: contours.aabb,
        cell_size: contours.cell_size,
        cell_height: contours.cell_height,
    };
    compute_adjacency(&mut mesh);
    mesh
}

fn intern_vertex(
    lookup: &mut HashMap<(i32, i32, i32), u16>,
    vertices: &mut Vec<IVec3>,
    v: IVec3,
) -> u16 {
    let key = (v.x, v.y, v.z);
    if let Some(&idx) = lookup.get(&key) {
        return idx;
    }
    let idx = vertices.len() as u16;
    vertices.push(v);
    lookup.insert(key, idx);
    idx
}

/// Ear-clip triangulation with a shortest-diagonal heuristic: among all valid
/// ears, clips the one whose closing diagonal is shortest, which tends to
/// produce more regular triangles than always taking the first valid ear.
fn triangulate(points: &[IVec3], indices: &[u16]) -> Option<Vec<[u16; 3]>> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    let mut guard = 0usize;
    while remaining.len() > 3 {
        guard += 1;
        if guard > n * n + 16 {
            return None;
        }
        let m = remaining.len();
        let mut best: Option<(usize, i64)> = None;

        for k in 0..m {
            let prev = remaining[(k + m - 1) % m];
            let cur = remaining[k];
            let next = remaining[(k + 1) % m];
            if !is_ear(points, &remaining, prev, cur, next) {
                continue;
            }
            let a = points[prev];
            let b = points[next];
            let dx = (a.x - b.x) as i64;
            let dz = (a.z - b.z) as i64;
            let diagonal_len = dx * dx + dz * dz;
            if best.is_none_or_shorter(diagonal_len) {
                best = Some((k, diagonal_len));
            }
        }

        let (k, _) = best?;
        let prev = remaining[(k + m - 1) % m];
        let cur = remaining[k];
        let next = remaining[(k + 1) % m];
        triangles.push([indices[prev], indices[cur], indices[next]]);
        remaining.remove(k);
    }

    if remaining.len() == 3 {
        triangles.push([indices[remaining[0]], indices[remaining[1]], indices[remaining[2]]]);
    }
    Some(triangles)
}

trait ShorterOrNone {
    fn is_none_or_shorter(&self, candidate: i64) -> bool;
}
impl ShorterOrNone for Option<(usize, i64)> {
    fn is_none_or_shorter(&self, candidate: i64) -> bool {
        match self {
            None => true,
            Some((_, current)) => candidate < *current,
        }
    }
}

fn is_ear(points: &[IVec3], remaining: &[usize], prev: usize, cur: usize, next: usize) -> bool {
    let a = points[prev];
    let b = points[cur];
    let c = points[next];
    if cross2d(a, b, c) <= 0 {
        return false;
    }
    for &idx in remaining {
        if idx == prev || idx == cur || idx == next {
            continue;
        }
        if point_in_triangle(points[idx], a, b, c) {
            return false;
        }
    }
    true
}

fn cross2d(a: IVec3, b: IVec3, c: IVec3) -> i64 {
    let ab = (b.x - a.x, b.z - a.z);
    let ac = (c.x - a.x, c.z - a.z);
    ab.0 as i64 * ac.1 as i64 - ab.1 as i64 * ac.0 as i64
}

fn point_in_triangle(p: IVec3, a: IVec3, b: IVec3, c: IVec3) -> bool {
    let d1 = cross2d(a, b, p);
    let d2 = cross2d(b, c, p);
    let d3 = cross2d(c, a, p);
    let has_neg = d1 < 0 || d2 < 0 || d3 < 0;
    let has_pos = d1 > 0 || d2 > 0 || d3 > 0;
    !(has_neg && has_pos)
}

/// Greedily merges adjacent polygons that share an edge, as long as the
/// merged polygon stays convex and within `max_verts_per_poly` vertices.
///
/// Corresponds to `getPolyMergeValue` + `mergePolyVerts`.
fn merge_polys(
    polys: &mut Vec<Vec<u16>>,
    regions: &mut Vec<RegionId>,
    areas: &mut Vec<AreaType>,
    vertices: &[IVec3],
    max_verts_per_poly: usize,
) {
    if max_verts_per_poly < 4 {
        return;
    }

    loop {
        let mut best: Option<(usize, usize, usize, usize)> = None;
        let mut best_len = 0i64;

        for i in 0..polys.len() {
            for j in (i + 1)..polys.len() {
                if regions[i] != regions[j] || areas[i] != areas[j] {
                    continue;
                }
                if polys[i].len() + polys[j].len() - 2 > max_verts_per_poly {
                    continue;
                }
                let Some((ei, ej)) = shared_edge(&polys[i], &polys[j]) else {
                    continue;
                };
                // Convexity must gate candidate selection, not run after it:
                // rejecting post-selection would pick the same losing
                // candidate again next iteration and loop forever.
                let merged = merge_at_edge(&polys[i], &polys[j], ei, ej);
                if merged.len() > max_verts_per_poly || !is_convex(&merged, vertices) {
                    continue;
                }
                let a = vertices[polys[i][ei] as usize];
                let b = vertices[polys[i][(ei + 1) % polys[i].len()] as usize];
                let dx = (a.x - b.x) as i64;
                let dz = (a.z - b.z) as i64;
                let len = dx * dx + dz * dz;
                if len > best_len {
                    best_len = len;
                    best = Some((i, j, ei, ej));
                }
            }
        }

        let Some((i, j, ei, ej)) = best else {
            break;
        };

        let merged = merge_at_edge(&polys[i], &polys[j], ei, ej);
        polys[i] = merged;
        polys.remove(j);
        regions.remove(j);
        areas.remove(j);
    }
}

/// Finds an edge shared by `a` and `b` in opposite winding (a->b in one,
/// b->a in the other), returning the starting vertex-slot index in each.
fn shared_edge(a: &[u16], b: &[u16]) -> Option<(usize, usize)> {
    for ei in 0..a.len() {
        let a0 = a[ei];
        let a1 = a[(ei + 1) % a.len()];
        for ej in 0..b.len() {
            let b0 = b[ej];
            let b1 = b[(ej + 1) % b.len()];
            if a0 == b1 && a1 == b0 {
                return Some((ei, ej));
            }
        }
    }
    None
}

fn merge_at_edge(a: &[u16], b: &[u16], ei: usize, ej: usize) -> Vec<u16> {
    let mut merged = Vec::with_capacity(a.len() + b.len() - 2);
    for k in 0..a.len() - 1 {
        merged.push(a[(ei + 1 + k) % a.len()]);
    }
    for k in 0..b.len() - 1 {
        merged.push(b[(ej + 1 + k) % b.len()]);
    }
    merged
}

fn is_convex(poly: &[u16], vertices: &[IVec3]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a = vertices[poly[i] as usize];
        let b = vertices[poly[(i + 1) % n] as usize];
        let c = vertices[poly[(i + 2) % n] as usize];
        if cross2d(a, b, c) < 0 {
            return false;
        }
    }
    true
}

/// Fills each polygon's neighbor slots by matching shared edges across the
/// whole mesh; edges with no match (or shared by more than two polygons, which
/// should not happen in a manifold mesh) keep the `u16::MAX` "no neighbor"
/// sentinel.
fn compute_adjacency(mesh: &mut PolyMesh) {
    let poly_count = mesh.poly_count();
    let max_verts = mesh.max_verts_per_poly;

    // Each undirected edge is shared by at most two polygons; both of their
    // (poly, edge-slot) endpoints must be recorded, or the second registrant
    // silently overwrites the first and that polygon's neighbor slot across
    // the edge is never filled in.
    let mut edge_owners: HashMap<(u16, u16), Vec<(usize, usize)>> = HashMap::new();
    for p in 0..poly_count {
        let poly = mesh.poly(p).to_vec();
        let len = poly.iter().position(|&v| v == MESH_NULL_IDX).unwrap_or(max_verts);
        for e in 0..len {
            let v0 = poly[e];
            let v1 = poly[(e + 1) % len];
            edge_owners
                .entry((v0.min(v1), v0.max(v1)))
                .or_default()
                .push((p, e));
        }
    }

    for owners in edge_owners.values() {
        if owners.len() != 2 {
            continue;
        }
        let (poly_a, edge_a) = owners[0];
        let (poly_b, edge_b) = owners[1];
        mesh.neighbors[poly_a * max_verts + edge_a] = poly_b as u16;
        mesh.neighbors[poly_b * max_verts + edge_b] = poly_a as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact_heightfield::CompactHeightfield;
    use crate::context::BuildContext;
    use crate::contours::build_contours;
    use crate::distance_field::build_distance_field;
    use crate::heightfield::{HeightfieldBuilder, SpanInsertion};
    use crate::math::Aabb3d;
    use crate::region_postprocess::filter_and_merge_regions;
    use crate::span::SpanBuilder;
    use crate::watershed::build_regions;

    fn square_floor_mesh() -> PolyMesh {
        let mut hf = HeightfieldBuilder {
            aabb: Aabb3d::new([0.0, 0.0, 0.0], [6.0, 3.0, 6.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
        .build()
        .unwrap();
        for z in 0..6 {
            for x in 0..6 {
                hf.add_span(SpanInsertion {
                    x,
                    z,
                    flag_merge_threshold: 0,
                    span: SpanBuilder {
                        min: 0,
                        max: 1,
                        area: AreaType::WALKABLE,
                        next: None,
                    }
                    .build(),
                })
                .unwrap();
            }
        }
        let mut chf = CompactHeightfield::from_heightfield(&hf, 2, 1).unwrap();
        let (distances, _max) = build_distance_field(&chf);
        build_regions(&mut chf, &distances, 0);
        filter_and_merge_regions(&mut chf, 0, 0);
        let contour_set = build_contours(&chf, 1.0, 0);
        let mut ctx = BuildContext::new();
        build_poly_mesh(&contour_set, 6, &mut ctx)
    }

    #[test]
    fn a_square_floor_produces_at_least_one_polygon() {
        let mesh = square_floor_mesh();
        assert!(mesh.poly_count() >= 1);
    }

    #[test]
    fn every_polygon_vertex_index_is_in_range() {
        let mesh = square_floor_mesh();
        for p in 0..mesh.poly_count() {
            for &v in mesh.poly(p) {
                if v != MESH_NULL_IDX {
                    assert!((v as usize) < mesh.vertices.len());
                }
            }
        }
    }

    #[test]
    fn adjacency_is_symmetric_across_every_shared_edge() {
        // A 2x1 strip of two triangulated unit quads capped at
        // max_verts_per_poly=3 so they can't merge into one polygon, forcing
        // compute_adjacency to record a real cross-polygon edge.
        let vertices = vec![
            IVec3::new(0, 0, 0),
            IVec3::new(1, 0, 0),
            IVec3::new(2, 0, 0),
            IVec3::new(2, 0, 1),
            IVec3::new(1, 0, 1),
            IVec3::new(0, 0, 1),
        ];
        let polys = vec![vec![0, 1, 4, 5], vec![1, 2, 3, 4]];
        let poly_count = polys.len();
        let max_verts_per_poly = 4;
        let mut flat_polys = vec![MESH_NULL_IDX; poly_count * max_verts_per_poly];
        for (i, poly) in polys.iter().enumerate() {
            for (j, &v) in poly.iter().enumerate() {
                flat_polys[i * max_verts_per_poly + j] = v;
            }
        }
        let mut mesh = PolyMesh {
            vertices,
            polys: flat_polys,
            neighbors: vec![MESH_NULL_IDX; poly_count * max_verts_per_poly],
            regions: vec![RegionId::from(1); poly_count],
            areas: vec![AreaType::WALKABLE; poly_count],
            max_verts_per_poly,
            aabb: Aabb3d::new([0.0, 0.0, 0.0], [2.0, 1.0, 1.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        };
        compute_adjacency(&mut mesh);

        assert!(
            mesh.poly_neighbors(0).contains(&1),
            "poly 0 should see poly 1 across their shared edge"
        );
        assert!(
            mesh.poly_neighbors(1).contains(&0),
            "poly 1 should see poly 0 back: adjacency must be symmetric"
        );
    }

    #[test]
    fn merging_a_non_convex_candidate_does_not_hang() {
        // An L-shaped pair of triangles whose union is non-convex: the first
        // (and only) merge candidate must be rejected during selection, not
        // after, or the loop never terminates.
        let vertices = vec![
            IVec3::new(0, 0, 0),
            IVec3::new(2, 0, 0),
            IVec3::new(2, 0, 1),
            IVec3::new(1, 0, 1),
            IVec3::new(1, 0, 2),
            IVec3::new(0, 0, 2),
        ];
        let mut polys = vec![vec![0, 1, 2, 3], vec![0, 3, 4, 5]];
        let mut regions = vec![RegionId::from(1); 2];
        let mut areas = vec![AreaType::WALKABLE; 2];

        merge_polys(&mut polys, &mut regions, &mut areas, &vertices, 6);

        assert_eq!(polys.len(), 2, "a non-convex union must never be merged");
    }
}
