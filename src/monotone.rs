//! Monotone region partitioning: a cheaper alternative to [`crate::watershed`]
//! that sweeps rows and merges same-row runs with the row above, without
//! regard to the distance field. Produces regions with straighter, more
//! rectangular boundaries and runs faster, at the cost of sometimes
//! over-segmenting open areas watershed would keep as one region.

use crate::compact_heightfield::CompactHeightfield;
use crate::compact_span::NOT_CONNECTED;
use crate::region::RegionId;

struct SweepSpan {
    row_id: u16,
    region_id: RegionId,
    neighbor: RegionId,
    count: u32,
}

/// Partitions `chf` into regions via row-sweep, assigning each walkable span
/// a [`RegionId`]. Returns the highest region id assigned.
pub fn build_regions_monotone(chf: &mut CompactHeightfield, border_size: u16) -> u16 {
    let w = chf.width;
    let h = chf.height;
    let span_count = chf.span_count as usize;
    let mut region_ids = vec![RegionId::NONE; span_count];
    let mut next_region_id: u16 = 1;

    if border_size > 0 {
        for z in 0..h {
            for x in 0..w {
                if x < border_size || x >= w.saturating_sub(border_size) {
                    mark(chf, &mut region_ids, x, z, RegionId::from(1).with_border_flag());
                }
                if z < border_size || z >= h.saturating_sub(border_size) {
                    mark(chf, &mut region_ids, x, z, RegionId::from(1).with_border_flag());
                }
            }
        }
        next_region_id = 2;
    }

    for z in 0..h {
        let mut sweeps: Vec<SweepSpan> = Vec::new();
        let mut row_ids = vec![0u16; w as usize];

        for x in 0..w {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if !chf.area(i).is_walkable() || region_ids[i as usize] != RegionId::NONE {
                    continue;
                }

                let span = *chf.span(i);
                let mut previous_row_id: u16 = 0;
                if span.con(0) != NOT_CONNECTED {
                    if let Some(left) = chf.neighbor_index(i, 0) {
                        if region_ids[left as usize] == RegionId::NONE
                            && chf.area(left).is_walkable()
                        {
                            previous_row_id = row_ids[x.saturating_sub(1) as usize];
                        }
                    }
                }

                let mut above_row_id: u16 = 0;
                if span.con(3) != NOT_CONNECTED {
                    if let Some(above) = chf.neighbor_index(i, 3) {
                        if chf.area(above).is_walkable() {
                            above_row_id = region_ids[above as usize].id();
                        }
                    }
                }

                let row_id = if previous_row_id != 0 {
                    previous_row_id
                } else {
                    sweeps.push(SweepSpan {
                        row_id: sweeps.len() as u16 + 1,
                        region_id: RegionId::NONE,
                        neighbor: RegionId::NONE,
                        count: 0,
                    });
                    sweeps.len() as u16
                };

                if above_row_id != 0 {
                    let sweep = &mut sweeps[row_id as usize - 1];
                    if sweep.neighbor == RegionId::NONE || sweep.neighbor.id() == above_row_id {
                        sweep.neighbor = RegionId::from(above_row_id);
                        sweep.count += 1;
                    } else {
                        sweep.neighbor = RegionId::from(u16::MAX);
                    }
                }

                row_ids[x as usize] = row_id;
            }
        }

        for sweep in sweeps.iter_mut() {
            sweep.region_id = if sweep.neighbor != RegionId::NONE && sweep.neighbor.id() != u16::MAX
            {
                sweep.neighbor
            } else {
                let id = next_region_id;
                next_region_id += 1;
                RegionId::from(id)
            };
        }

        for x in 0..w {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if !chf.area(i).is_walkable() || region_ids[i as usize] != RegionId::NONE {
                    continue;
                }
                let row_id = row_ids[x as usize];
                if row_id != 0 {
                    region_ids[i as usize] = sweeps[row_id as usize - 1].region_id;
                }
            }
        }
    }

    for (i, region) in region_ids.iter().enumerate() {
        chf.span_mut(i as u32).set_region(*region);
    }

    next_region_id.saturating_sub(1)
}

fn mark(chf: &CompactHeightfield, region_ids: &mut [RegionId], x: u16, z: u16, region: RegionId) {
    let cell = chf.cell(x, z);
    for i in cell.index..cell.index + cell.count {
        region_ids[i as usize] = region;
    }
}
