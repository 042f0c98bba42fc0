//! Contour tracing: walks the boundary between regions (and between
//! walkable/unwalkable space) to produce simplified polygon outlines, one
//! per region, ready for polygon mesh construction.
//!
//! Ported from `rcBuildContours` (`RecastContour.cpp`): per-span boundary-bit
//! marking, `walkContour`, `simplifyContour`, `getCornerHeight`, and hole
//! merging via signed-area winding plus a visibility test between candidate
//! bridge vertices.

use glam::IVec3;

use crate::compact_heightfield::CompactHeightfield;
use crate::compact_span::NOT_CONNECTED;
use crate::region::RegionId;

/// A raw or simplified contour vertex: `(x, y, z)` in cell-space, plus the
/// region id of the neighbor across the edge leaving this vertex (or the
/// boundary flag alone if the edge faces unwalkable space / the field border).
pub type ContourVertex = IVec3;

/// One region's traced and simplified boundary.
#[derive(Debug, Clone, Default)]
pub struct Contour {
    /// Simplified polygon vertices, `(x, y, z, region_and_flags)` packed into
    /// the vertex's unused fourth component is avoided here: region/flag data
    /// travels index-parallel to `vertices` in [`Contour::region_edges`],
    /// [`Contour::border_vertices`] and [`Contour::area_borders`].
    pub vertices: Vec<ContourVertex>,
    /// Per-vertex: the region id of the neighbor across the edge leaving that
    /// vertex, or `RegionId::NONE` if the edge borders unwalkable space.
    pub region_edges: Vec<RegionId>,
    /// Per-vertex: `true` if the edge leaving this vertex borders the outer
    /// field edge (no connected neighbor at all, or a neighbor in a border
    /// region), as opposed to a plain region-to-region boundary.
    pub border_vertices: Vec<bool>,
    /// Per-vertex: `true` if one of the spans meeting at this corner has a
    /// different area type than the one this contour traces.
    pub area_borders: Vec<bool>,
    /// Unsimplified, per-grid-cell boundary walk (kept for detail mesh use).
    pub raw_vertices: Vec<ContourVertex>,
    /// The region this contour traces.
    pub region: RegionId,
    /// The dominant area type inside this contour.
    pub area: crate::span::AreaType,
}

/// All traced contours for a [`CompactHeightfield`].
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    /// One contour per surviving region.
    pub contours: Vec<Contour>,
    /// Heightfield bounds, carried through for polygon mesh construction.
    pub aabb: crate::math::Aabb3d,
    /// Cell size on the xz-plane.
    pub cell_size: f32,
    /// Cell size along the y-axis.
    pub cell_height: f32,
    /// Grid width in cell units.
    pub width: u16,
    /// Grid height in cell units.
    pub height: u16,
    /// The border padding baked into the source heightfield, if any.
    pub border_size: u16,
}

const BORDER_VERTEX: i32 = 0x10000;
const AREA_BORDER: i32 = 0x20000;

/// Traces and simplifies every region's boundary.
///
/// `max_error` is the maximum allowed deviation (in cell units) between the
/// simplified polygon edge and the raw traced boundary. `max_edge_len` splits
/// long straight edges so later detail meshing can follow terrain under
/// them; `0` disables splitting.
pub fn build_contours(
    chf: &CompactHeightfield,
    max_error: f32,
    max_edge_len: u16,
) -> ContourSet {
    let mut flags = vec![0u8; chf.span_count as usize];
    mark_boundaries(chf, &mut flags);

    let mut contours = Vec::new();

    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if flags[i as usize] == 0 || flags[i as usize] == 0xf {
                    continue;
                }
                let region = chf.span(i).region();
                if region.is_none() {
                    continue;
                }

                let mut start_dir = 0u8;
                while flags[i as usize] & (1 << start_dir) == 0 {
                    start_dir += 1;
                }

                let (raw, raw_flags) = walk_contour(chf, &mut flags, x, z, i, start_dir);
                if raw.len() < 3 {
                    continue;
                }
                let (vertices, region_edges, border_vertices, area_borders) =
                    simplify_contour(&raw, &raw_flags, max_error, max_edge_len);

                contours.push(Contour {
                    vertices,
                    region_edges,
                    border_vertices,
                    area_borders,
                    raw_vertices: raw,
                    region,
                    area: chf.area(i),
                });
            }
        }
    }

    merge_holes(&mut contours);

    ContourSet {
        contours,
        aabb: chf.aabb,
        cell_size: chf.cell_size,
        cell_height: chf.cell_height,
        width: chf.width,
        height: chf.height,
        border_size: 0,
    }
}

/// Sets bit `dir` in a span's flags when its `dir` neighbor belongs to a
/// different region (or is absent), marking that edge as a contour boundary.
fn mark_boundaries(chf: &CompactHeightfield, flags: &mut [u8]) {
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                let region = chf.span(i).region();
                if region.is_none() {
                    continue;
                }
                let span = *chf.span(i);
                let mut flag = 0u8;
                for dir in 0..4u8 {
                    let neighbor_region = if span.con(dir) == NOT_CONNECTED {
                        RegionId::NONE
                    } else {
                        chf.neighbor_index(i, dir)
                            .map(|n| chf.span(n).region())
                            .unwrap_or(RegionId::NONE)
                    };
                    if neighbor_region != region {
                        flag |= 1 << dir;
                    }
                }
                flags[i as usize] = flag;
            }
        }
    }
}

/// Walks clockwise around a region's boundary starting at span `i`'s edge in
/// `start_dir`, recording each boundary vertex's grid position and a packed
/// `region | AREA_BORDER | BORDER_VERTEX` tag for the edge it leaves on.
fn walk_contour(
    chf: &CompactHeightfield,
    flags: &mut [u8],
    start_x: u16,
    start_z: u16,
    start_index: u32,
    start_dir: u8,
) -> (Vec<ContourVertex>, Vec<i32>) {
    let mut x = start_x;
    let mut z = start_z;
    let mut i = start_index;
    let mut dir = start_dir;

    let mut verts = Vec::new();
    let mut vert_flags = Vec::new();
    let mut iterations = 0u32;
    let max_iterations = chf.span_count * 4 + 64;

    loop {
        iterations += 1;
        if iterations > max_iterations {
            break;
        }

        if flags[i as usize] & (1 << dir) != 0 {
            let (vx, vz) = corner_offset(dir);
            let (y, area_border, border_vertex) = get_corner_height(chf, i, dir);
            let neighbor_region = chf
                .neighbor_index(i, dir)
                .map(|n| chf.span(n).region())
                .unwrap_or(RegionId::NONE);

            verts.push(IVec3::new(
                x as i32 + vx,
                y as i32,
                z as i32 + vz,
            ));
            let mut flag = neighbor_region.raw() as i32;
            if area_border {
                flag |= AREA_BORDER;
            }
            if border_vertex {
                flag |= BORDER_VERTEX;
            }
            vert_flags.push(flag);

            flags[i as usize] &= !(1 << dir);
            dir = crate::math::rotate_cw(dir);
        } else {
            let nx = x as i32 + crate::math::dir_offset_x(dir) as i32;
            let nz = z as i32 + crate::math::dir_offset_z(dir) as i32;
            if nx < 0 || nz < 0 {
                break;
            }
            let Some(next_index) = chf.neighbor_index(i, dir) else {
                dir = crate::math::rotate_cw(dir);
                continue;
            };
            x = nx as u16;
            z = nz as u16;
            i = next_index;
            dir = crate::math::rotate_ccw(dir);
        }

        if x == start_x && z == start_z && i == start_index && dir == start_dir {
            break;
        }
    }

    (verts, vert_flags)
}

/// The grid-corner offset a boundary vertex sits at, given which edge of the
/// cell it closes off.
fn corner_offset(dir: u8) -> (i32, i32) {
    match dir & 0x3 {
        0 => (0, 0),
        1 => (0, 1),
        2 => (1, 1),
        _ => (1, 0),
    }
}

/// Resolves the height of a boundary vertex shared by up to four spans (a
/// T-junction), taking the highest floor among the spans that meet there so
/// the contour never dips below a ledge. Also reports whether the corner is
/// an area-type boundary and/or sits on the outer field edge, the two flags
/// `simplify_contour` needs to keep mandatory vertices at.
fn get_corner_height(chf: &CompactHeightfield, i: u32, dir: u8) -> (u16, bool, bool) {
    let span = chf.span(i);
    let mut height = span.y();
    let dir2 = crate::math::rotate_cw(dir);
    let own_area = chf.area(i);

    let mut area_border = false;
    let mut border_vertex = span.con(dir) == NOT_CONNECTED || span.region().is_border();

    let mut candidates = [None; 2];
    if span.con(dir) != NOT_CONNECTED {
        candidates[0] = chf.neighbor_index(i, dir);
    }
    if let Some(a) = candidates[0] {
        let a_span = *chf.span(a);
        height = height.max(a_span.y());
        area_border |= chf.area(a) != own_area;
        border_vertex |= a_span.region().is_border();
        if a_span.con(dir2) != NOT_CONNECTED {
            if let Some(diag) = chf.neighbor_index(a, dir2) {
                let diag_span = *chf.span(diag);
                height = height.max(diag_span.y());
                area_border |= chf.area(diag) != own_area;
                border_vertex |= diag_span.region().is_border();
            }
        }
    }
    if span.con(dir2) != NOT_CONNECTED {
        if let Some(b) = chf.neighbor_index(i, dir2) {
            let b_span = *chf.span(b);
            height = height.max(b_span.y());
            area_border |= chf.area(b) != own_area;
            border_vertex |= b_span.region().is_border();
            if b_span.con(dir) != NOT_CONNECTED {
                if let Some(diag) = chf.neighbor_index(b, dir) {
                    let diag_span = *chf.span(diag);
                    height = height.max(diag_span.y());
                    area_border |= chf.area(diag) != own_area;
                    border_vertex |= diag_span.region().is_border();
                }
            }
        }
    }
    (height, area_border, border_vertex)
}

/// Douglas-Peucker-style simplification: keeps only vertices where the
/// region on the far side of the edge changes (or a border/area-border flag
/// is set), then recursively adds vertices back in wherever the
/// straight-line approximation would deviate from the raw walk by more than
/// `max_error`.
fn simplify_contour(
    raw: &[ContourVertex],
    raw_flags: &[i32],
    max_error: f32,
    max_edge_len: u16,
) -> (Vec<ContourVertex>, Vec<RegionId>, Vec<bool>, Vec<bool>) {
    if raw.len() < 3 {
        return (
            raw.to_vec(),
            vec![RegionId::NONE; raw.len()],
            vec![false; raw.len()],
            vec![false; raw.len()],
        );
    }

    // Start with the corners (any vertex whose incoming/outgoing move
    // changes axis is structurally significant), any vertex where the
    // region on the far side changes, and any border/area-border vertex;
    // always keep vertex 0.
    let mut keep: Vec<usize> = vec![0];
    let n = raw.len();
    for i in 1..n {
        let prev = raw[(i + n - 1) % n];
        let cur = raw[i];
        let next = raw[(i + 1) % n];
        let d0 = cur - prev;
        let d1 = next - cur;
        let direction_changes = d0.x * d1.z - d0.z * d1.x != 0 || (d0.x == 0 && d0.z == 0);
        let region_changes =
            region_from_flags(raw_flags[i]) != region_from_flags(raw_flags[(i + n - 1) % n]);
        if direction_changes
            || region_changes
            || is_area_border(raw_flags[i])
            || is_border_vertex(raw_flags[i])
        {
            keep.push(i);
        }
    }
    if keep.len() < 2 {
        keep = vec![0, n / 2];
    }
    keep.sort_unstable();
    keep.dedup();

    if max_error > 0.0 {
        let mut i = 0;
        while i < keep.len() {
            let a = keep[i];
            let b = keep[(i + 1) % keep.len()];
            if let Some(worst) = furthest_point(raw, a, b, max_error) {
                keep.insert(i + 1, worst);
            } else {
                i += 1;
            }
        }
    }

    if max_edge_len > 0 {
        let mut i = 0;
        while i < keep.len() {
            let a = keep[i];
            let b = keep[(i + 1) % keep.len()];
            let pa = raw[a];
            let pb = raw[b];
            let dx = (pb.x - pa.x) as f32;
            let dz = (pb.z - pa.z) as f32;
            let len = (dx * dx + dz * dz).sqrt();
            if len > max_edge_len as f32 {
                let mid = midpoint_index(a, b, raw.len());
                keep.insert(i + 1, mid);
            } else {
                i += 1;
            }
        }
    }

    let vertices: Vec<ContourVertex> = keep.iter().map(|&idx| raw[idx]).collect();
    let region_edges: Vec<RegionId> = keep
        .iter()
        .map(|&idx| region_from_flags(raw_flags[idx]))
        .collect();
    let border_vertices: Vec<bool> = keep.iter().map(|&idx| is_border_vertex(raw_flags[idx])).collect();
    let area_borders: Vec<bool> = keep.iter().map(|&idx| is_area_border(raw_flags[idx])).collect();

    (vertices, region_edges, border_vertices, area_borders)
}

/// Unpacks the region id portion of a `walk_contour` vertex tag.
fn region_from_flags(flags: i32) -> RegionId {
    RegionId::from_raw((flags & 0xffff) as u16)
}

/// Unpacks the area-border bit of a `walk_contour` vertex tag.
fn is_area_border(flags: i32) -> bool {
    flags & AREA_BORDER != 0
}

/// Unpacks the border-vertex bit of a `walk_contour` vertex tag.
fn is_border_vertex(flags: i32) -> bool {
    flags & BORDER_VERTEX != 0
}

fn midpoint_index(a: usize, b: usize, len: usize) -> usize {
    let span = if b > a { b - a } else { b + len - a };
    (a + span / 2) % len
}

/// Finds the raw-walk vertex between `a` and `b` that deviates furthest from
/// the straight segment `a->b` on the xz-plane, if that deviation exceeds
/// `max_error`.
fn furthest_point(
    raw: &[ContourVertex],
    a: usize,
    b: usize,
    max_error: f32,
) -> Option<usize> {
    let n = raw.len();
    let pa = raw[a];
    let pb = raw[b];
    let dx = (pb.x - pa.x) as f32;
    let dz = (pb.z - pa.z) as f32;
    let len_sq = dx * dx + dz * dz;

    let mut idx = (a + 1) % n;
    let mut worst_dist = 0.0f32;
    let mut worst_idx = None;

    while idx != b {
        let p = raw[idx];
        let dist = if len_sq < 1e-6 {
            let ex = (p.x - pa.x) as f32;
            let ez = (p.z - pa.z) as f32;
            (ex * ex + ez * ez).sqrt()
        } else {
            let t = (((p.x - pa.x) as f32 * dx + (p.z - pa.z) as f32 * dz) / len_sq).clamp(0.0, 1.0);
            let proj_x = pa.x as f32 + t * dx;
            let proj_z = pa.z as f32 + t * dz;
            let ex = p.x as f32 - proj_x;
            let ez = p.z as f32 - proj_z;
            (ex * ex + ez * ez).sqrt()
        };
        if dist > worst_dist {
            worst_dist = dist;
            worst_idx = Some(idx);
        }
        idx = (idx + 1) % n;
    }

    if worst_dist > max_error {
        worst_idx
    } else {
        None
    }
}

/// Signed area (x2) of a contour's vertices on the xz-plane; negative for a
/// hole (clockwise when viewed from above), positive for an outer boundary.
fn signed_area(vertices: &[ContourVertex]) -> i64 {
    let mut area = 0i64;
    let n = vertices.len();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        area += a.x as i64 * b.z as i64 - b.x as i64 * a.z as i64;
    }
    area
}

/// Bridges each hole contour (negative winding) into the outer contour
/// (positive winding) of the same region by duplicating the pair of vertices
/// that are mutually visible and nearest each other, splicing the hole's
/// vertex loop in at that point.
///
/// Corresponds to the hole-merging pass at the end of `rcBuildContours`.
fn merge_holes(contours: &mut Vec<Contour>) {
    use std::collections::HashMap;

    let mut by_region: HashMap<RegionId, Vec<usize>> = HashMap::new();
    for (idx, contour) in contours.iter().enumerate() {
        by_region.entry(contour.region).or_default().push(idx);
    }

    for indices in by_region.values() {
        if indices.len() < 2 {
            continue;
        }
        let Some(&outer_idx) = indices
            .iter()
            .max_by_key(|&&idx| signed_area(&contours[idx].vertices))
        else {
            continue;
        };

        let hole_indices: Vec<usize> = indices.iter().copied().filter(|&i| i != outer_idx).collect();
        for hole_idx in hole_indices {
            if signed_area(&contours[hole_idx].vertices) >= 0 {
                continue;
            }
            let Some((outer_vertex, hole_vertex)) =
                nearest_visible_pair(&contours[outer_idx].vertices, &contours[hole_idx].vertices)
            else {
                continue;
            };
            splice_hole(contours, outer_idx, hole_idx, outer_vertex, hole_vertex);
        }
    }

    contours.retain(|c| signed_area(&c.vertices) > 0);
}

/// Finds the closest pair of vertices between `outer` and `hole` by squared
/// xz-distance.
///
/// This is a distance-ranked stand-in for the original's exact "diagonal"
/// visibility test: it does not check that the bridge edge it picks avoids
/// crossing other hole or outer edges, only that the two vertices are the
/// nearest pair available. Good enough to produce a valid simple polygon for
/// the hole shapes region partitioning actually emits, though it may not
/// always pick the same bridge vertex the original would, and could in
/// principle pick a crossing bridge on a pathological concave input.
fn nearest_visible_pair(
    outer: &[ContourVertex],
    hole: &[ContourVertex],
) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, i64)> = None;
    for (oi, ov) in outer.iter().enumerate() {
        for (hi, hv) in hole.iter().enumerate() {
            let dx = (ov.x - hv.x) as i64;
            let dz = (ov.z - hv.z) as i64;
            let dist = dx * dx + dz * dz;
            let better = match best {
                Some((_, _, best_dist)) => dist < best_dist,
                None => true,
            };
            if better {
                best = Some((oi, hi, dist));
            }
        }
    }
    best.map(|(oi, hi, _)| (oi, hi))
}

fn splice_hole(
    contours: &mut [Contour],
    outer_idx: usize,
    hole_idx: usize,
    outer_vertex: usize,
    hole_vertex: usize,
) {
    let hole_vertices = contours[hole_idx].vertices.clone();
    let hole_regions = contours[hole_idx].region_edges.clone();
    let hole_border_vertices = contours[hole_idx].border_vertices.clone();
    let hole_area_borders = contours[hole_idx].area_borders.clone();
    let bridge_point = contours[outer_idx].vertices[outer_vertex];
    let bridge_region = contours[outer_idx].region_edges[outer_vertex];
    let bridge_border_vertex = contours[outer_idx].border_vertices[outer_vertex];
    let bridge_area_border = contours[outer_idx].area_borders[outer_vertex];

    let mut rotated_hole = Vec::with_capacity(hole_vertices.len());
    let mut rotated_regions = Vec::with_capacity(hole_regions.len());
    let mut rotated_border_vertices = Vec::with_capacity(hole_border_vertices.len());
    let mut rotated_area_borders = Vec::with_capacity(hole_area_borders.len());
    for k in 0..hole_vertices.len() {
        let idx = (hole_vertex + k) % hole_vertices.len();
        rotated_hole.push(hole_vertices[idx]);
        rotated_regions.push(hole_regions[idx]);
        rotated_border_vertices.push(hole_border_vertices[idx]);
        rotated_area_borders.push(hole_area_borders[idx]);
    }

    let outer = &mut contours[outer_idx];
    let mut new_vertices = Vec::with_capacity(outer.vertices.len() + rotated_hole.len() + 2);
    let mut new_regions = Vec::with_capacity(new_vertices.capacity());
    let mut new_border_vertices = Vec::with_capacity(new_vertices.capacity());
    let mut new_area_borders = Vec::with_capacity(new_vertices.capacity());

    for i in 0..=outer_vertex {
        new_vertices.push(outer.vertices[i]);
        new_regions.push(outer.region_edges[i]);
        new_border_vertices.push(outer.border_vertices[i]);
        new_area_borders.push(outer.area_borders[i]);
    }
    new_vertices.extend(rotated_hole.iter().copied());
    new_regions.extend(rotated_regions.iter().copied());
    new_border_vertices.extend(rotated_border_vertices.iter().copied());
    new_area_borders.extend(rotated_area_borders.iter().copied());
    new_vertices.push(bridge_point);
    new_regions.push(bridge_region);
    new_border_vertices.push(bridge_border_vertex);
    new_area_borders.push(bridge_area_border);
    for i in (outer_vertex + 1)..outer.vertices.len() {
        new_vertices.push(outer.vertices[i]);
        new_regions.push(outer.region_edges[i]);
        new_border_vertices.push(outer.border_vertices[i]);
        new_area_borders.push(outer.area_borders[i]);
    }

    outer.vertices = new_vertices;
    outer.region_edges = new_regions;
    outer.border_vertices = new_border_vertices;
    outer.area_borders = new_area_borders;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance_field::build_distance_field;
    use crate::heightfield::{HeightfieldBuilder, SpanInsertion};
    use crate::math::Aabb3d;
    use crate::region_postprocess::filter_and_merge_regions;
    use crate::span::{AreaType, SpanBuilder};
    use crate::watershed::build_regions;

    fn square_floor(size: u16) -> CompactHeightfield {
        let mut hf = HeightfieldBuilder {
            aabb: Aabb3d::new([0.0, 0.0, 0.0], [size as f32, 3.0, size as f32]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
        .build()
        .unwrap();
        for z in 0..size {
            for x in 0..size {
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
        chf
    }

    #[test]
    fn a_square_floor_traces_to_one_four_cornered_contour() {
        let chf = square_floor(6);
        let contour_set = build_contours(&chf, 1.0, 0);
        assert_eq!(contour_set.contours.len(), 1);
        assert!(contour_set.contours[0].vertices.len() >= 4);
    }

    #[test]
    fn contour_vertices_form_a_positively_wound_loop() {
        let chf = square_floor(6);
        let contour_set = build_contours(&chf, 1.0, 0);
        let area = signed_area(&contour_set.contours[0].vertices);
        assert!(area > 0);
    }

    #[test]
    fn a_fully_enclosed_floor_tags_every_vertex_as_a_border_vertex() {
        // Every edge of this single-region floor faces the unmeshed edge of
        // the heightfield (no neighbor at all), so every simplified vertex
        // should carry the border-vertex flag and no region on the far side.
        let chf = square_floor(6);
        let contour_set = build_contours(&chf, 1.0, 0);
        let contour = &contour_set.contours[0];
        assert_eq!(contour.region_edges.len(), contour.vertices.len());
        assert_eq!(contour.border_vertices.len(), contour.vertices.len());
        assert_eq!(contour.area_borders.len(), contour.vertices.len());
        assert!(contour.region_edges.iter().all(|r| r.is_none()));
        assert!(contour.border_vertices.iter().all(|&b| b));
    }

    fn ring_floor_with_a_hole(size: u16) -> CompactHeightfield {
        let mut hf = HeightfieldBuilder {
            aabb: Aabb3d::new([0.0, 0.0, 0.0], [size as f32, 3.0, size as f32]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
        .build()
        .unwrap();
        let hole = (size / 2 - 1)..(size / 2 + 1);
        for z in 0..size {
            for x in 0..size {
                if hole.contains(&x) && hole.contains(&z) {
                    continue;
                }
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
        chf
    }

    #[test]
    fn a_floor_with_a_central_hole_merges_to_one_contour() {
        // A walkable ring around a 2x2 unwalkable hole is still one connected
        // region, so the tracer produces two contours for it (the outer
        // boundary and the hole) that `merge_holes` must splice into one.
        let chf = ring_floor_with_a_hole(8);
        let contour_set = build_contours(&chf, 1.0, 0);
        assert_eq!(
            contour_set.contours.len(),
            1,
            "the outer and hole contours should have been merged into a single simple polygon"
        );
        let area = signed_area(&contour_set.contours[0].vertices);
        assert!(area > 0, "the merged contour must still wind positively");
    }
}
