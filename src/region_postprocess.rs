//! Cleans up a raw region partitioning: drops regions too small to be
//! useful, merges small-but-connected regions into their largest neighbor,
//! and compresses the surviving ids into a dense `1..=n` range.
//!
//! Ported from the post-processing tail of `rcBuildRegions`
//! (`mergeAndFilterRegions` / `filterSmallRegions` / `compressRegionIds`).

use std::collections::{HashMap, HashSet};

use crate::compact_heightfield::CompactHeightfield;
use crate::compact_span::NOT_CONNECTED;
use crate::region::RegionId;

#[derive(Default, Clone)]
struct RegionInfo {
    span_count: u32,
    connections: Vec<u16>,
    touches_border: bool,
}

/// Removes regions with fewer than `min_region_area` spans (resetting their
/// spans to [`RegionId::NONE`]), merges regions with fewer than
/// `merge_region_area` spans into their largest same-boundary neighbor, and
/// compresses the surviving ids to a dense range starting at 1.
///
/// Returns the number of distinct regions remaining.
pub fn filter_and_merge_regions(
    chf: &mut CompactHeightfield,
    min_region_area: u32,
    merge_region_area: u32,
) -> u16 {
    let initial_infos = collect_region_info(chf);

    // Drop tiny isolated regions outright; a region touching the border is
    // kept regardless of size since it still carries the boundary.
    let to_clear: Vec<RegionId> = initial_infos
        .iter()
        .filter(|(&id, info)| !id.is_none() && !info.touches_border && info.span_count < min_region_area)
        .map(|(&id, _)| id)
        .collect();
    for id in to_clear {
        clear_region(chf, id);
    }

    let mut infos = collect_region_info(chf);

    // Merge small regions into whichever neighbor they share the most border with.
    let mut changed = true;
    while changed {
        changed = false;
        let small: Vec<RegionId> = infos
            .iter()
            .filter(|(&id, info)| {
                !id.is_none() && !info.touches_border && info.span_count < merge_region_area
            })
            .map(|(&id, _)| id)
            .collect();

        for id in small {
            let Some(info) = infos.get(&id).cloned() else {
                continue;
            };
            let Some(&target) = info
                .connections
                .iter()
                .map(|&raw| RegionId::from(raw))
                .filter(|n| *n != id)
                .collect::<Vec<_>>()
                .iter()
                .max_by_key(|n| infos.get(n).map(|i| i.span_count).unwrap_or(0))
            else {
                continue;
            };

            merge_region(chf, id, target);
            if let Some(target_info) = infos.get(&target).cloned() {
                let merged_span_count = target_info.span_count + info.span_count;
                infos.insert(
                    target,
                    RegionInfo {
                        span_count: merged_span_count,
                        connections: target_info.connections,
                        touches_border: target_info.touches_border,
                    },
                );
            }
            infos.remove(&id);
            changed = true;
        }
    }

    compress_region_ids(chf)
}

fn collect_region_info(chf: &CompactHeightfield) -> HashMap<RegionId, RegionInfo> {
    let mut infos: HashMap<RegionId, RegionInfo> = HashMap::new();
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                let region = chf.span(i).region();
                let entry = infos.entry(region).or_default();
                entry.span_count += 1;
                if region.is_border() {
                    entry.touches_border = true;
                }

                let span = *chf.span(i);
                for dir in 0..4u8 {
                    if span.con(dir) == NOT_CONNECTED {
                        continue;
                    }
                    if let Some(neighbor) = chf.neighbor_index(i, dir) {
                        let neighbor_region = chf.span(neighbor).region();
                        if neighbor_region != region && !entry.connections.contains(&neighbor_region.raw())
                        {
                            entry.connections.push(neighbor_region.raw());
                        }
                    }
                }
            }
        }
    }
    infos
}

fn clear_region(chf: &mut CompactHeightfield, id: RegionId) {
    for i in 0..chf.span_count {
        if chf.span(i).region() == id {
            chf.span_mut(i).set_region(RegionId::NONE);
        }
    }
}

fn merge_region(chf: &mut CompactHeightfield, from: RegionId, into: RegionId) {
    for i in 0..chf.span_count {
        if chf.span(i).region() == from {
            chf.span_mut(i).set_region(into);
        }
    }
}

fn compress_region_ids(chf: &mut CompactHeightfield) -> u16 {
    let mut seen: HashSet<RegionId> = HashSet::new();
    for i in 0..chf.span_count {
        let region = chf.span(i).region();
        if !region.is_none() {
            seen.insert(region);
        }
    }
    let mut ordered: Vec<RegionId> = seen.into_iter().collect();
    ordered.sort_by_key(|r| r.raw());

    let mut remap: HashMap<RegionId, RegionId> = HashMap::new();
    for (new_id, old_id) in ordered.iter().enumerate() {
        let mut remapped = RegionId::from(new_id as u16 + 1);
        if old_id.is_border() {
            remapped = remapped.with_border_flag();
        }
        remap.insert(*old_id, remapped);
    }

    for i in 0..chf.span_count {
        let region = chf.span(i).region();
        if let Some(&new_region) = remap.get(&region) {
            chf.span_mut(i).set_region(new_region);
        }
    }

    ordered.len() as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance_field::build_distance_field;
    use crate::heightfield::{HeightfieldBuilder, SpanInsertion};
    use crate::math::Aabb3d;
    use crate::span::{AreaType, SpanBuilder};
    use crate::watershed::build_regions;

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
    fn region_ids_are_compressed_to_a_dense_range() {
        let mut chf = flat_heightfield(10);
        let (distances, _max) = build_distance_field(&chf);
        build_regions(&mut chf, &distances, 0);
        let count = filter_and_merge_regions(&mut chf, 0, 0);
        assert!(count >= 1);
        for i in 0..chf.span_count {
            let region = chf.span(i).region();
            assert!(region.is_none() || region.id() <= count);
        }
    }
}
