//! Chamfer distance field: for every walkable span, the cost-weighted
//! distance to the nearest non-walkable or border span. Orthogonal steps
//! cost 2, diagonal steps cost 3 — an integer approximation of Euclidean
//! distance good enough to drive watershed partitioning.
//!
//! Ported from `calculateDistanceField` / `boxBlurDistanceField` (`rcBuildDistanceField`).

use crate::compact_heightfield::CompactHeightfield;
use crate::compact_span::NOT_CONNECTED;

const ORTHOGONAL_COST: u16 = 2;
const DIAGONAL_COST: u16 = 3;

/// Computes the chamfer distance field for `chf`'s spans and the maximum
/// distance found (used by watershed to choose its starting level).
///
/// Corresponds to `rcBuildDistanceField`.
pub fn build_distance_field(chf: &CompactHeightfield) -> (Vec<u16>, u16) {
    let mut dist = border_distances(chf);
    chamfer_pass(chf, &mut dist);
    let blurred = box_blur(chf, &dist, 1);
    let max_distance = blurred.iter().copied().max().unwrap_or(0);
    (blurred, max_distance)
}

/// Seeds distance 0 for any span not fully surrounded by connected neighbors
/// (i.e. touches the heightfield border or an unwalkable/disconnected span).
fn border_distances(chf: &CompactHeightfield) -> Vec<u16> {
    let mut dist = vec![u16::MAX; chf.span_count as usize];
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                let span = chf.span(i);
                let connected_count = (0..4u8).filter(|&dir| span.is_connected(dir)).count();
                if connected_count != 4 {
                    dist[i as usize] = 0;
                }
            }
        }
    }
    dist
}

/// Two-pass chamfer propagation: forward pass looks back/up-left, backward
/// pass looks forward/down-right, each combining an orthogonal neighbor's
/// distance (+2) with that neighbor's diagonal neighbor's distance (+3).
pub(crate) fn chamfer_pass(chf: &CompactHeightfield, dist: &mut [u16]) {
    // Forward pass: directions 0 (-x) and 3 (-z), diagonals via 3's dir-0 and
    // 0's dir-3 neighbor.
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                let span = *chf.span(i);

                if span.con(0) != NOT_CONNECTED {
                    let ax = x as i32 + crate::math::dir_offset_x(0) as i32;
                    let az = z as i32 + crate::math::dir_offset_z(0) as i32;
                    let ai = chf.cell(ax as u16, az as u16).index + span.con(0) as u32;
                    relax(dist, i, ai, ORTHOGONAL_COST);

                    let a_span = *chf.span(ai);
                    if a_span.con(3) != NOT_CONNECTED {
                        let aax = ax + crate::math::dir_offset_x(3) as i32;
                        let aaz = az + crate::math::dir_offset_z(3) as i32;
                        let aai = chf.cell(aax as u16, aaz as u16).index + a_span.con(3) as u32;
                        relax(dist, i, aai, DIAGONAL_COST);
                    }
                }
                if span.con(3) != NOT_CONNECTED {
                    let ax = x as i32 + crate::math::dir_offset_x(3) as i32;
                    let az = z as i32 + crate::math::dir_offset_z(3) as i32;
                    let ai = chf.cell(ax as u16, az as u16).index + span.con(3) as u32;
                    relax(dist, i, ai, ORTHOGONAL_COST);

                    let a_span = *chf.span(ai);
                    if a_span.con(2) != NOT_CONNECTED {
                        let aax = ax + crate::math::dir_offset_x(2) as i32;
                        let aaz = az + crate::math::dir_offset_z(2) as i32;
                        let aai = chf.cell(aax as u16, aaz as u16).index + a_span.con(2) as u32;
                        relax(dist, i, aai, DIAGONAL_COST);
                    }
                }
            }
        }
    }

    // Backward pass: directions 2 (+x) and 1 (+z).
    for z in (0..chf.height).rev() {
        for x in (0..chf.width).rev() {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                let span = *chf.span(i);

                if span.con(2) != NOT_CONNECTED {
                    let ax = x as i32 + crate::math::dir_offset_x(2) as i32;
                    let az = z as i32 + crate::math::dir_offset_z(2) as i32;
                    let ai = chf.cell(ax as u16, az as u16).index + span.con(2) as u32;
                    relax(dist, i, ai, ORTHOGONAL_COST);

                    let a_span = *chf.span(ai);
                    if a_span.con(1) != NOT_CONNECTED {
                        let aax = ax + crate::math::dir_offset_x(1) as i32;
                        let aaz = az + crate::math::dir_offset_z(1) as i32;
                        let aai = chf.cell(aax as u16, aaz as u16).index + a_span.con(1) as u32;
                        relax(dist, i, aai, DIAGONAL_COST);
                    }
                }
                if span.con(1) != NOT_CONNECTED {
                    let ax = x as i32 + crate::math::dir_offset_x(1) as i32;
                    let az = z as i32 + crate::math::dir_offset_z(1) as i32;
                    let ai = chf.cell(ax as u16, az as u16).index + span.con(1) as u32;
                    relax(dist, i, ai, ORTHOGONAL_COST);

                    let a_span = *chf.span(ai);
                    if a_span.con(0) != NOT_CONNECTED {
                        let aax = ax + crate::math::dir_offset_x(0) as i32;
                        let aaz = az + crate::math::dir_offset_z(0) as i32;
                        let aai = chf.cell(aax as u16, aaz as u16).index + a_span.con(0) as u32;
                        relax(dist, i, aai, DIAGONAL_COST);
                    }
                }
            }
        }
    }
}

#[inline]
fn relax(dist: &mut [u16], i: u32, neighbor: u32, cost: u16) {
    let candidate = dist[neighbor as usize].saturating_add(cost);
    if candidate < dist[i as usize] {
        dist[i as usize] = candidate;
    }
}

/// A 9-tap box blur over each span's 4-connected and diagonal neighbors,
/// smoothing the distance field so regions grow with rounder boundaries.
/// `threshold` skips blurring spans whose distance is already at or below it
/// (their value is load-bearing for erosion/region seeding).
fn box_blur(chf: &CompactHeightfield, dist: &[u16], threshold: u16) -> Vec<u16> {
    let mut out = dist.to_vec();
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                let d = dist[i as usize];
                if d <= threshold {
                    continue;
                }
                let mut total = d as u32 * 4;
                let span = *chf.span(i);
                for dir in 0..4u8 {
                    if span.con(dir) == NOT_CONNECTED {
                        total += d as u32 * 2;
                        continue;
                    }
                    let ax = x as i32 + crate::math::dir_offset_x(dir) as i32;
                    let az = z as i32 + crate::math::dir_offset_z(dir) as i32;
                    let ai = chf.cell(ax as u16, az as u16).index + span.con(dir) as u32;
                    total += dist[ai as usize] as u32 * 2;

                    let a_span = *chf.span(ai);
                    let next_dir = crate::math::rotate_cw(dir);
                    if a_span.con(next_dir) != NOT_CONNECTED {
                        let aax = ax + crate::math::dir_offset_x(next_dir) as i32;
                        let aaz = az + crate::math::dir_offset_z(next_dir) as i32;
                        let aai = chf.cell(aax as u16, aaz as u16).index
                            + a_span.con(next_dir) as u32;
                        total += dist[aai as usize] as u32;
                    } else {
                        total += d as u32;
                    }
                }
                out[i as usize] = ((total + 5) / 12) as u16;
            }
        }
    }
    out
}
