//! Post-rasterization span filters that reclassify spans the build should not
//! treat as walkable: obstacles short enough to hop over, ledges too tall to
//! step down from safely, and spans too short to stand in.
//!
//! Ported from `rcFilterLowHangingWalkableObstacles`, `rcFilterLedgeSpans`,
//! and `rcFilterWalkableLowHeightSpans`.

use crate::{heightfield::Heightfield, span::AreaType};

/// Ceiling used in place of "no span above" when walking a column upward.
const MAX_HEIGHT: i32 = 0xffff;

impl Heightfield {
    /// Reclassifies unwalkable spans as walkable when they sit directly on
    /// top of a walkable span and the step up is within `walkable_climb`.
    ///
    /// This catches low obstacles (tree roots, curbs) that would otherwise
    /// needlessly fragment a walkable floor into separate spans.
    pub fn filter_low_hanging_walkable_obstacles(&mut self, walkable_climb: u16) {
        for z in 0..self.height {
            for x in 0..self.width {
                let mut iter = self.span_key_at(x, z);
                let mut previous_was_walkable = false;
                let mut previous_area = AreaType::NOT_WALKABLE;
                let mut previous_max: u16 = 0;

                while let Some(key) = iter {
                    let next = self.span(key).next();
                    let walkable = self.span(key).area().is_walkable();
                    if !walkable
                        && previous_was_walkable
                        && (self.span(key).max() as i32 - previous_max as i32)
                            <= walkable_climb as i32
                    {
                        self.span_mut(key).set_area(previous_area);
                    }
                    previous_was_walkable = self.span(key).area().is_walkable();
                    previous_area = self.span(key).area();
                    previous_max = self.span(key).max();
                    iter = next;
                }
            }
        }
    }

    /// Marks a walkable span unwalkable if it sits on a ledge: its floor
    /// differs from its most divergent traversable neighbor floor by more
    /// than `walkable_climb`, or it drops off the heightfield edge, or it
    /// borders a neighbor column whose opening is too low to pass through.
    pub fn filter_ledge_spans(&mut self, walkable_height: u16, walkable_climb: u16) {
        for z in 0..self.height {
            for x in 0..self.width {
                let mut iter = self.span_key_at(x, z);
                while let Some(key) = iter {
                    let span = self.span(key);
                    let next = span.next();
                    if !span.area().is_walkable() {
                        iter = next;
                        continue;
                    }

                    let floor = span.max() as i32;
                    let ceiling = next
                        .map(|n| self.span(n).min() as i32)
                        .unwrap_or(MAX_HEIGHT);

                    let mut lowest_neighbor_floor_diff = MAX_HEIGHT;
                    let mut lowest_traversable_neighbor_floor = floor;
                    let mut highest_traversable_neighbor_floor = floor;

                    'dirs: for dir in 0..4u8 {
                        let nx = x as i32 + crate::math::dir_offset_x(dir) as i32;
                        let nz = z as i32 + crate::math::dir_offset_z(dir) as i32;
                        if !self.contains(nx, nz) {
                            lowest_neighbor_floor_diff = -(walkable_climb as i32) - 1;
                            break;
                        }
                        let (nx, nz) = (nx as u16, nz as u16);
                        let mut neighbor_iter = self.span_key_at(nx, nz);
                        let neighbor_ceiling = neighbor_iter
                            .map(|k| self.span(k).min() as i32)
                            .unwrap_or(MAX_HEIGHT);
                        if floor.min(ceiling).min(neighbor_ceiling) == ceiling
                            && ceiling.min(neighbor_ceiling) - floor >= walkable_height as i32
                        {
                            lowest_neighbor_floor_diff = -(walkable_climb as i32) - 1;
                            break 'dirs;
                        }

                        while let Some(nkey) = neighbor_iter {
                            let nspan = self.span(nkey);
                            let neighbor_floor = nspan.max() as i32;
                            let neighbor_ceiling = nspan
                                .next()
                                .map(|k| self.span(k).min() as i32)
                                .unwrap_or(MAX_HEIGHT);

                            if ceiling.min(neighbor_ceiling) - floor.max(neighbor_floor)
                                < walkable_height as i32
                            {
                                neighbor_iter = nspan.next();
                                continue;
                            }

                            let diff = neighbor_floor - floor;
                            lowest_neighbor_floor_diff = lowest_neighbor_floor_diff.min(diff);

                            if diff.abs() <= walkable_climb as i32 {
                                lowest_traversable_neighbor_floor =
                                    lowest_traversable_neighbor_floor.min(neighbor_floor);
                                highest_traversable_neighbor_floor =
                                    highest_traversable_neighbor_floor.max(neighbor_floor);
                            } else if diff < -(walkable_climb as i32) {
                                break;
                            }
                            neighbor_iter = nspan.next();
                        }
                    }

                    if lowest_neighbor_floor_diff < -(walkable_climb as i32)
                        || highest_traversable_neighbor_floor - lowest_traversable_neighbor_floor
                            > walkable_climb as i32
                    {
                        self.span_mut(key).set_area(AreaType::NOT_WALKABLE);
                    }

                    iter = next;
                }
            }
        }
    }

    /// Marks a span unwalkable if the clearance above its floor (to the next
    /// span's ceiling) is less than `walkable_height`.
    pub fn filter_walkable_low_height_spans(&mut self, walkable_height: u16) {
        for z in 0..self.height {
            for x in 0..self.width {
                let mut iter = self.span_key_at(x, z);
                while let Some(key) = iter {
                    let span = self.span(key);
                    let next = span.next();
                    let floor = span.max() as i32;
                    let ceiling = next
                        .map(|n| self.span(n).min() as i32)
                        .unwrap_or(MAX_HEIGHT);
                    if ceiling - floor < walkable_height as i32 {
                        self.span_mut(key).set_area(AreaType::NOT_WALKABLE);
                    }
                    iter = next;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::heightfield::{HeightfieldBuilder, SpanInsertion};
    use crate::math::Aabb3d;
    use crate::span::{AreaType, SpanBuilder};

    fn heightfield() -> super::Heightfield {
        HeightfieldBuilder {
            aabb: Aabb3d::new([0.0, 0.0, 0.0], [3.0, 10.0, 3.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn low_hanging_obstacle_becomes_walkable() {
        let mut hf = heightfield();
        hf.add_span(SpanInsertion {
            x: 1,
            z: 1,
            flag_merge_threshold: 0,
            span: SpanBuilder {
                min: 0,
                max: 2,
                area: AreaType::WALKABLE,
                next: None,
            }
            .build(),
        })
        .unwrap();
        hf.add_span(SpanInsertion {
            x: 1,
            z: 1,
            flag_merge_threshold: 0,
            span: SpanBuilder {
                min: 2,
                max: 3,
                area: AreaType::NOT_WALKABLE,
                next: None,
            }
            .build(),
        })
        .unwrap();

        hf.filter_low_hanging_walkable_obstacles(1);
        let spans: Vec<_> = hf.column(1, 1).map(|(_, s)| s.area()).collect();
        assert_eq!(spans, vec![AreaType::WALKABLE, AreaType::WALKABLE]);
    }

    #[test]
    fn low_clearance_span_is_filtered() {
        let mut hf = heightfield();
        hf.add_span(SpanInsertion {
            x: 1,
            z: 1,
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
        hf.add_span(SpanInsertion {
            x: 1,
            z: 1,
            flag_merge_threshold: 0,
            span: SpanBuilder {
                min: 2,
                max: 3,
                area: AreaType::WALKABLE,
                next: None,
            }
            .build(),
        })
        .unwrap();

        hf.filter_walkable_low_height_spans(2);
        let span = hf.span_at(1, 1).unwrap();
        assert_eq!(span.area(), AreaType::NOT_WALKABLE);
    }
}
