//! Watershed region partitioning: floods walkable area outward from local
//! distance-field maxima, producing regions whose boundaries naturally follow
//! terrain features instead of an arbitrary grid.
//!
//! Ported from `rcBuildRegions` (`RecastRegion.cpp`): level stepping down from
//! the distance field's maximum in steps of 2, alternating `expand_regions`
//! (grow existing regions into newly-unlocked cells) and `flood_region`
//! (seed a brand new region from an unclaimed local maximum).

use crate::compact_heightfield::CompactHeightfield;
use crate::compact_span::NOT_CONNECTED;
use crate::region::RegionId;

/// Bucket count for the level stacks; cells are distributed across buckets by
/// a spatial hash so each `sort_cells_by_level` pass stays cache-friendly.
const NB_STACKS: usize = 8;
const LOG_NB_STACKS: u32 = 3;

#[derive(Clone, Copy)]
struct LevelStackEntry {
    index: u32,
}

/// Runs watershed partitioning over every walkable span in `chf`, assigning
/// each a [`RegionId`]. Returns the highest region id assigned.
///
/// `border_size` pads a border region around the whole field (0 disables
/// it); spans within `min_region_area` of a region too small to be useful
/// and isolated small regions are handled by the caller via
/// [`crate::region_postprocess`].
pub fn build_regions(chf: &mut CompactHeightfield, distances: &[u16], border_size: u16) -> u16 {
    let w = chf.width;
    let h = chf.height;
    let span_count = chf.span_count as usize;

    let mut region_ids = vec![RegionId::NONE; span_count];
    let mut dirty_distances = distances.to_vec();

    if border_size > 0 {
        paint_rect_region(
            chf,
            &mut region_ids,
            0,
            border_size.min(w),
            0,
            h,
            RegionId::from(1).with_border_flag(),
        );
        paint_rect_region(
            chf,
            &mut region_ids,
            w.saturating_sub(border_size),
            w,
            0,
            h,
            RegionId::from(1).with_border_flag(),
        );
        paint_rect_region(
            chf,
            &mut region_ids,
            0,
            w,
            0,
            border_size.min(h),
            RegionId::from(1).with_border_flag(),
        );
        paint_rect_region(
            chf,
            &mut region_ids,
            0,
            w,
            h.saturating_sub(border_size),
            h,
            RegionId::from(1).with_border_flag(),
        );
    }

    let mut region_id: u16 = if border_size > 0 { 1 } else { 0 };
    let max_distance = distances.iter().copied().max().unwrap_or(0);
    let mut level = (max_distance + 1) & !1;

    let mut stacks: Vec<Vec<LevelStackEntry>> = vec![Vec::new(); NB_STACKS];

    while level > 0 {
        level = level.saturating_sub(2);

        sort_cells_by_level(chf, &region_ids, distances, level, &mut stacks);

        for stack in stacks.iter_mut() {
            expand_regions(chf, &mut region_ids, &mut dirty_distances, stack, 4);

            for entry in stack.drain(..) {
                if region_ids[entry.index as usize] != RegionId::NONE {
                    continue;
                }
                if distances[entry.index as usize] < level {
                    continue;
                }
                region_id += 1;
                flood_region(
                    chf,
                    &mut region_ids,
                    distances,
                    entry.index,
                    level,
                    RegionId::from(region_id),
                );
            }
        }
    }

    // Final expansion pass mops up any spans a rounding level never claimed.
    let mut leftover_stack: Vec<LevelStackEntry> = (0..span_count as u32)
        .filter(|&i| region_ids[i as usize] == RegionId::NONE && chf.area(i).is_walkable())
        .map(|index| LevelStackEntry { index })
        .collect();
    expand_regions(chf, &mut region_ids, &mut dirty_distances, &mut leftover_stack, 8);

    for (i, region) in region_ids.iter().enumerate() {
        chf.span_mut(i as u32).set_region(*region);
    }

    region_id
}

fn paint_rect_region(
    chf: &CompactHeightfield,
    region_ids: &mut [RegionId],
    x0: u16,
    x1: u16,
    z0: u16,
    z1: u16,
    region: RegionId,
) {
    for z in z0..z1 {
        for x in x0..x1 {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                region_ids[i as usize] = region;
            }
        }
    }
}

fn spatial_bucket(x: u16, z: u16) -> usize {
    debug_assert_eq!(NB_STACKS, 1 << LOG_NB_STACKS);
    (x as usize ^ z as usize) & (NB_STACKS - 1)
}

fn sort_cells_by_level(
    chf: &CompactHeightfield,
    region_ids: &[RegionId],
    distances: &[u16],
    level: u16,
    stacks: &mut [Vec<LevelStackEntry>],
) {
    for stack in stacks.iter_mut() {
        stack.clear();
    }
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if !chf.area(i).is_walkable() || region_ids[i as usize] != RegionId::NONE {
                    continue;
                }
                if distances[i as usize] < level {
                    continue;
                }
                let bucket = spatial_bucket(x, z) % stacks.len();
                stacks[bucket].push(LevelStackEntry { index: i });
            }
        }
    }
}

/// Grows existing regions into neighboring unclaimed spans at the current
/// level, iterating until nothing changes or `max_iterations` is reached.
/// Spans bordering two different regions are left unclaimed (they become
/// contour boundaries).
fn expand_regions(
    chf: &CompactHeightfield,
    region_ids: &mut [RegionId],
    distances: &mut [u16],
    stack: &mut Vec<LevelStackEntry>,
    max_iterations: u32,
) {
    if stack.is_empty() {
        return;
    }
    for _ in 0..max_iterations {
        let mut changed = false;
        let mut still_unclaimed = Vec::with_capacity(stack.len());

        for entry in stack.iter() {
            let i = entry.index;
            if region_ids[i as usize] != RegionId::NONE {
                continue;
            }

            let mut assigned = RegionId::NONE;
            let mut assigned_distance = 0u16;
            let span = *chf.span(i);
            for dir in 0..4u8 {
                if span.con(dir) == NOT_CONNECTED {
                    continue;
                }
                let Some(neighbor) = chf.neighbor_index(i, dir) else {
                    continue;
                };
                let neighbor_region = region_ids[neighbor as usize];
                if neighbor_region == RegionId::NONE {
                    continue;
                }
                if assigned == RegionId::NONE {
                    assigned = neighbor_region;
                    assigned_distance = distances[neighbor as usize];
                } else if assigned != neighbor_region {
                    // Touches two distinct regions: leave unclaimed so the
                    // boundary lands here rather than being swallowed by
                    // whichever region happened to run first.
                    assigned = RegionId::NONE;
                    break;
                } else {
                    assigned_distance = assigned_distance.max(distances[neighbor as usize]);
                }
            }

            if assigned != RegionId::NONE {
                region_ids[i as usize] = assigned;
                distances[i as usize] = assigned_distance;
                changed = true;
            } else {
                still_unclaimed.push(*entry);
            }
        }

        *stack = still_unclaimed;
        if !changed || stack.is_empty() {
            break;
        }
    }
}

/// Breadth-first flood from `seed`, claiming every connected span at or above
/// `level` that has no region yet. This is how a brand-new region is born.
fn flood_region(
    chf: &CompactHeightfield,
    region_ids: &mut [RegionId],
    distances: &[u16],
    seed: u32,
    level: u16,
    region: RegionId,
) {
    let mut queue = std::collections::VecDeque::new();
    region_ids[seed as usize] = region;
    queue.push_back(seed);

    while let Some(i) = queue.pop_front() {
        let span = *chf.span(i);
        for dir in 0..4u8 {
            if span.con(dir) == NOT_CONNECTED {
                continue;
            }
            let Some(neighbor) = chf.neighbor_index(i, dir) else {
                continue;
            };
            if region_ids[neighbor as usize] != RegionId::NONE {
                continue;
            }
            if !chf.area(neighbor).is_walkable() {
                continue;
            }
            if distances[neighbor as usize] < level {
                continue;
            }
            region_ids[neighbor as usize] = region;
            queue.push_back(neighbor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance_field::build_distance_field;
    use crate::heightfield::{HeightfieldBuilder, SpanInsertion};
    use crate::math::Aabb3d;
    use crate::span::{AreaType, SpanBuilder};

    fn flat_heightfield(size: u16) -> CompactHeightfield {
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
        CompactHeightfield::from_heightfield(&hf, 2, 1).unwrap()
    }

    #[test]
    fn a_single_open_floor_becomes_one_region() {
        let mut chf = flat_heightfield(10);
        let (distances, _max) = build_distance_field(&chf);
        build_regions(&mut chf, &distances, 0);
        let first_region = chf.span(0).region();
        assert_ne!(first_region, RegionId::NONE);
        for i in 0..chf.span_count {
            assert_eq!(chf.span(i).region(), first_region);
        }
    }

    #[test]
    fn every_span_gets_a_region_assigned() {
        let mut chf = flat_heightfield(6);
        let (distances, _max) = build_distance_field(&chf);
        build_regions(&mut chf, &distances, 0);
        for i in 0..chf.span_count {
            assert_ne!(chf.span(i).region(), RegionId::NONE);
        }
    }
}
