//! The compact heightfield collapses each column's spans down to just their
//! walkable surfaces, then links each surface to the (up to 4) neighbor
//! surfaces a character could step across to. This is the representation
//! every later build stage — distance field, region partitioning, contour
//! tracing — operates on.

use thiserror::Error;

use crate::{
    compact_cell::CompactCell,
    compact_span::{CompactSpan, NOT_CONNECTED},
    heightfield::Heightfield,
    math::Aabb3d,
    span::AreaType,
};

/// A column-major collapse of a [`Heightfield`]'s walkable span surfaces,
/// each linked to its traversable neighbors. Build with [`CompactHeightfield::from_heightfield`].
#[derive(Debug, Clone)]
pub struct CompactHeightfield {
    /// Width along the x-axis, in cell units.
    pub width: u16,
    /// Height along the z-axis, in cell units.
    pub height: u16,
    /// Total walkable span count.
    pub span_count: u32,
    /// Cells used to build the field, in cell units.
    pub walkable_height: u16,
    /// Maximum climbable ledge height, in cell units.
    pub walkable_climb: u16,
    /// Bounding box.
    pub aabb: Aabb3d,
    /// Cell size on the xz-plane.
    pub cell_size: f32,
    /// Cell size along the y-axis.
    pub cell_height: f32,
    pub(crate) cells: Vec<CompactCell>,
    pub(crate) spans: Vec<CompactSpan>,
    /// Per-span area types, parallel to `spans`.
    pub(crate) areas: Vec<AreaType>,
}

/// Errors that can occur building a [`CompactHeightfield`] from a [`Heightfield`].
#[derive(Error, Debug)]
pub enum CompactHeightfieldError {
    /// A single column held more walkable spans than fit the compact
    /// representation's 24-bit span-count budget.
    #[error("column ({x}, {z}) has too many walkable layers ({count})")]
    TooManyLayers {
        /// The offending column's x-coordinate.
        x: u16,
        /// The offending column's z-coordinate.
        z: u16,
        /// The number of walkable spans found in that column.
        count: usize,
    },
}

impl CompactHeightfield {
    /// Collapses `heightfield` to its walkable surfaces and links neighbors.
    ///
    /// Corresponds to `rcBuildCompactHeightfield`.
    pub fn from_heightfield(
        heightfield: &Heightfield,
        walkable_height: u16,
        walkable_climb: u16,
    ) -> Result<Self, CompactHeightfieldError> {
        let width = heightfield.width;
        let height = heightfield.height;
        let column_count = width as usize * height as usize;

        let mut walkable_span_count = 0usize;
        for z in 0..height {
            for x in 0..width {
                for (_, span) in heightfield.column(x, z) {
                    if span.area().is_walkable() {
                        walkable_span_count += 1;
                    }
                }
            }
        }

        let mut cells = vec![CompactCell::default(); column_count];
        let mut spans = Vec::with_capacity(walkable_span_count);
        let mut areas = Vec::with_capacity(walkable_span_count);

        let mut current_index = 0u32;
        for z in 0..height {
            for x in 0..width {
                let column_index = x as usize + z as usize * width as usize;
                let start_index = current_index;
                let mut count = 0u32;

                let mut iter = heightfield.column(x, z).peekable();
                while let Some((_, span)) = iter.next() {
                    if !span.area().is_walkable() {
                        continue;
                    }
                    let floor = span.max();
                    let ceiling = iter
                        .peek()
                        .map(|(_, next)| next.min())
                        .unwrap_or(crate::span::Span::MAX_HEIGHT);
                    let open_height = (ceiling.saturating_sub(floor)).min(u8::MAX as u16) as u8;
                    spans.push(CompactSpan::new(floor, open_height));
                    areas.push(span.area());
                    count += 1;
                }

                if count as usize > NOT_CONNECTED as usize {
                    return Err(CompactHeightfieldError::TooManyLayers {
                        x,
                        z,
                        count: count as usize,
                    });
                }

                cells[column_index] = CompactCell::new(start_index, count);
                current_index += count;
            }
        }

        let mut compact = Self {
            width,
            height,
            span_count: current_index,
            walkable_height,
            walkable_climb,
            aabb: heightfield.aabb,
            cell_size: heightfield.cell_size,
            cell_height: heightfield.cell_height,
            cells,
            spans,
            areas,
        };
        compact.connect_neighbors();
        Ok(compact)
    }

    fn connect_neighbors(&mut self) {
        for z in 0..self.height {
            for x in 0..self.width {
                let cell = self.cell(x, z);
                for span_index in cell.index..cell.index + cell.count {
                    for dir in 0..4u8 {
                        self.spans[span_index as usize].disconnect(dir);

                        let nx = x as i32 + crate::math::dir_offset_x(dir) as i32;
                        let nz = z as i32 + crate::math::dir_offset_z(dir) as i32;
                        if nx < 0 || nz < 0 || nx >= self.width as i32 || nz >= self.height as i32
                        {
                            continue;
                        }
                        let (nx, nz) = (nx as u16, nz as u16);
                        let neighbor_cell = self.cell(nx, nz);

                        let span = self.spans[span_index as usize];
                        for k in neighbor_cell.index..neighbor_cell.index + neighbor_cell.count {
                            let neighbor = self.spans[k as usize];
                            let bottom = span.y().max(neighbor.y());
                            let top = (span.y() as i32 + span.height() as i32)
                                .min(neighbor.y() as i32 + neighbor.height() as i32);
                            if (top - bottom as i32) >= self.walkable_height as i32
                                && (neighbor.y() as i32 - span.y() as i32).unsigned_abs()
                                    <= self.walkable_climb as u32
                            {
                                let local_index = k - neighbor_cell.index;
                                if local_index as usize <= NOT_CONNECTED as usize {
                                    self.spans[span_index as usize]
                                        .set_con(dir, local_index as u8);
                                }
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    #[inline]
    pub(crate) fn cell(&self, x: u16, z: u16) -> CompactCell {
        self.cells[x as usize + z as usize * self.width as usize]
    }

    /// Returns the span at the given flat span index.
    #[inline]
    pub fn span(&self, index: u32) -> &CompactSpan {
        &self.spans[index as usize]
    }

    #[inline]
    pub(crate) fn span_mut(&mut self, index: u32) -> &mut CompactSpan {
        &mut self.spans[index as usize]
    }

    /// Returns the area type at the given flat span index.
    #[inline]
    pub fn area(&self, index: u32) -> AreaType {
        self.areas[index as usize]
    }

    /// The neighbor span's flat index in direction `dir` from `index`, if connected.
    pub fn neighbor_index(&self, index: u32, dir: u8) -> Option<u32> {
        let span = self.span(index);
        if !span.is_connected(dir) {
            return None;
        }
        let (x, z) = self.column_of(index);
        let nx = x as i32 + crate::math::dir_offset_x(dir) as i32;
        let nz = z as i32 + crate::math::dir_offset_z(dir) as i32;
        let neighbor_cell = self.cell(nx as u16, nz as u16);
        Some(neighbor_cell.index + span.con(dir) as u32)
    }

    /// Finds the `(x, z)` column a flat span index belongs to by scanning cells.
    ///
    /// O(width*height); intended for occasional diagnostic use, not hot loops.
    pub fn column_of(&self, index: u32) -> (u16, u16) {
        for z in 0..self.height {
            for x in 0..self.width {
                let cell = self.cell(x, z);
                if index >= cell.index && index < cell.index + cell.count {
                    return (x, z);
                }
            }
        }
        unreachable!("span index {index} not owned by any column")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::{HeightfieldBuilder, SpanInsertion};
    use crate::span::SpanBuilder;

    fn flat_heightfield() -> Heightfield {
        let mut hf = HeightfieldBuilder {
            aabb: Aabb3d::new([0.0, 0.0, 0.0], [3.0, 5.0, 3.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
        .build()
        .unwrap();
        for z in 0..3 {
            for x in 0..3 {
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
        hf
    }

    #[test]
    fn compacting_a_flat_floor_keeps_every_column() {
        let hf = flat_heightfield();
        let compact = CompactHeightfield::from_heightfield(&hf, 2, 1).unwrap();
        assert_eq!(compact.span_count, 9);
    }

    #[test]
    fn interior_spans_connect_to_all_four_neighbors() {
        let hf = flat_heightfield();
        let compact = CompactHeightfield::from_heightfield(&hf, 2, 1).unwrap();
        let center_cell = compact.cell(1, 1);
        let center = compact.span(center_cell.index);
        for dir in 0..4 {
            assert!(center.is_connected(dir), "direction {dir} should connect");
        }
    }

    #[test]
    fn corner_spans_have_only_two_neighbors() {
        let hf = flat_heightfield();
        let compact = CompactHeightfield::from_heightfield(&hf, 2, 1).unwrap();
        let corner_cell = compact.cell(0, 0);
        let corner = compact.span(corner_cell.index);
        let connected = (0..4).filter(|&d| corner.is_connected(d)).count();
        assert_eq!(connected, 2);
    }
}
