//! The heightfield module contains the types and functions for working with [`Heightfield`]s.
//!
//! A heightfield is a 3D grid of [`Span`]s, where each column contains 0, 1, or more spans.

use thiserror::Error;

use crate::{
    math::Aabb3d,
    span::{Span, SpanKey, Spans},
};

/// A solid voxel representation of the input geometry: `width × height` xz
/// columns, each holding an ascending, non-overlapping list of [`Span`]s.
/// Build with [`HeightfieldBuilder`].
#[derive(Debug, Clone)]
pub struct Heightfield {
    /// The width of the heightfield along the x-axis in cell units.
    pub width: u16,
    /// The height of the heightfield along the z-axis in cell units.
    pub height: u16,
    /// The AABB of the heightfield.
    pub aabb: Aabb3d,
    /// The size of each cell on the xz-plane.
    pub cell_size: f32,
    /// The size of each cell along the y-axis.
    pub cell_height: f32,
    /// The lowest span's key for each column, in width*height order.
    pub spans: Vec<Option<SpanKey>>,
    /// All spans in the heightfield.
    pub allocated_spans: Spans,
}

impl Heightfield {
    /// Inserts a span into the column at `(insertion.x, insertion.z)`,
    /// merging it with any existing overlapping or touching spans.
    ///
    /// Corresponds to `rcAddSpan` in the original implementation.
    #[inline]
    pub(crate) fn add_span(&mut self, insertion: SpanInsertion) -> Result<(), SpanInsertionError> {
        let column_index = self.column_index(insertion.x, insertion.z);
        if column_index >= self.spans.len() {
            return Err(SpanInsertionError::ColumnIndexOutOfBounds {
                x: insertion.x,
                y: insertion.z,
            });
        }

        let mut new_span = insertion.span;
        let mut previous_span_key = None;
        let mut current_span_key_iter = self.spans[column_index];
        while let Some(current_span_key) = current_span_key_iter {
            let current_span = self.span_mut(current_span_key);
            current_span_key_iter = current_span.next();
            if current_span.min() > new_span.max() {
                break;
            }
            if current_span.max() < new_span.min() {
                previous_span_key.replace(current_span_key);
                continue;
            }
            if current_span.min() < new_span.min() {
                new_span.set_min(current_span.min());
            }
            if current_span.max() > new_span.max() {
                new_span.set_max(current_span.max());
            }

            if (new_span.max() as i32 - current_span.max() as i32).unsigned_abs()
                <= insertion.flag_merge_threshold as u32
            {
                let area = new_span.area().max(current_span.area());
                new_span.set_area(area);
            }

            let next_key = current_span.next();
            self.allocated_spans.remove(current_span_key);
            if let Some(previous_span_key) = previous_span_key {
                self.span_mut(previous_span_key).set_next(next_key);
            } else {
                self.spans[column_index] = next_key;
            }
        }

        if let Some(previous_span_key) = previous_span_key {
            new_span.set_next(self.span(previous_span_key).next());
            let new_span_key = self.allocated_spans.insert(new_span);
            self.span_mut(previous_span_key).set_next(new_span_key);
        } else {
            let lowest_span_key = self.spans[column_index];
            new_span.set_next(lowest_span_key);
            let new_span_key = self.allocated_spans.insert(new_span);
            self.spans[column_index] = Some(new_span_key);
        }

        Ok(())
    }

    #[inline]
    pub(crate) fn column_index(&self, x: u16, z: u16) -> usize {
        x as usize + z as usize * self.width as usize
    }

    #[inline]
    pub(crate) fn contains(&self, x: i32, z: i32) -> bool {
        x >= 0 && x < self.width as i32 && z >= 0 && z < self.height as i32
    }

    /// Returns the key of the lowest span in the column at the given
    /// coordinates, or `None` if out of bounds or empty.
    #[inline]
    pub fn span_key_at(&self, x: u16, z: u16) -> Option<SpanKey> {
        let column_index = self.column_index(x, z);
        *self.spans.get(column_index)?
    }

    /// Returns the lowest span in the column at the given coordinates.
    #[inline]
    pub fn span_at(&self, x: u16, z: u16) -> Option<&Span> {
        Some(self.span(self.span_key_at(x, z)?))
    }

    /// Returns a mutable reference to the lowest span in the column at the given coordinates.
    #[inline]
    pub fn span_at_mut(&mut self, x: u16, z: u16) -> Option<&mut Span> {
        let key = self.span_key_at(x, z)?;
        Some(self.span_mut(key))
    }

    /// Returns a reference to the span with the given key.
    /// # Panics
    /// Panics if the key is not found.
    #[inline]
    pub fn span(&self, key: SpanKey) -> &Span {
        &self.allocated_spans[key]
    }

    /// Returns a mutable reference to the span with the given key.
    /// # Panics
    /// Panics if the key is not found.
    #[inline]
    pub fn span_mut(&mut self, key: SpanKey) -> &mut Span {
        &mut self.allocated_spans[key]
    }

    /// Iterates all spans in a column, in ascending order, as `(key, span)` pairs.
    pub fn column(&self, x: u16, z: u16) -> impl Iterator<Item = (SpanKey, &Span)> {
        let mut next = self.span_key_at(x, z);
        std::iter::from_fn(move || {
            let key = next?;
            let span = self.span(key);
            next = span.next();
            Some((key, span))
        })
    }
}

/// A builder for [`Heightfield`]s.
pub struct HeightfieldBuilder {
    /// The AABB of the heightfield.
    pub aabb: Aabb3d,
    /// The size of each cell on the xz-plane.
    pub cell_size: f32,
    /// The size of each cell along the y-axis.
    pub cell_height: f32,
}

impl HeightfieldBuilder {
    /// Builds the heightfield, computing `width`/`height` from the AABB and cell size.
    pub fn build(self) -> Result<Heightfield, HeightfieldBuilderError> {
        if self.cell_size <= 0.0 || self.cell_height <= 0.0 {
            return Err(HeightfieldBuilderError::NonPositiveCellSize {
                cell_size: self.cell_size,
                cell_height: self.cell_height,
            });
        }
        let width = (self.aabb.max.x - self.aabb.min.x) / self.cell_size + 0.5;
        let height = (self.aabb.max.z - self.aabb.min.z) / self.cell_size + 0.5;
        if width <= 0.0 || height <= 0.0 {
            return Err(HeightfieldBuilderError::DegenerateBounds { width, height });
        }
        let column_count = width as u128 * height as u128;
        if column_count > usize::MAX as u128 || width >= u16::MAX as f32 || height >= u16::MAX as f32
        {
            return Err(HeightfieldBuilderError::ColumnCountTooLarge { width, height });
        }
        let column_count = column_count as usize;
        Ok(Heightfield {
            width: width as u16,
            height: height as u16,
            aabb: self.aabb,
            cell_size: self.cell_size,
            cell_height: self.cell_height,
            spans: vec![None; column_count],
            allocated_spans: Spans::with_min_capacity(column_count),
        })
    }
}

/// Errors that can occur when building a [`Heightfield`] with [`HeightfieldBuilder::build`].
#[derive(Error, Debug)]
pub enum HeightfieldBuilderError {
    /// The cell size or cell height was not positive.
    #[error("cell_size and cell_height must be positive, got cell_size={cell_size}, cell_height={cell_height}")]
    NonPositiveCellSize {
        /// The offending cell size.
        cell_size: f32,
        /// The offending cell height.
        cell_height: f32,
    },
    /// The AABB collapsed to a zero or negative footprint.
    #[error("the heightfield bounds produced a degenerate grid: width={width}, height={height}")]
    DegenerateBounds {
        /// The computed grid width.
        width: f32,
        /// The computed grid height.
        height: f32,
    },
    /// The column count (width*height) is too large to address.
    #[error("column count (width*height) is too large, got {width}*{height}")]
    ColumnCountTooLarge {
        /// The width of the heightfield along the x-axis in cell units.
        width: f32,
        /// The height of the heightfield along the z-axis in cell units.
        height: f32,
    },
}

/// Errors that can occur when inserting a span into a [`Heightfield`].
#[derive(Error, Debug)]
pub enum SpanInsertionError {
    /// The column index is out of bounds.
    #[error("column index out of bounds: x={x}, y={y}")]
    ColumnIndexOutOfBounds {
        /// The x-coordinate of the span.
        x: u16,
        /// The z-coordinate of the span.
        y: u16,
    },
}

pub(crate) struct SpanInsertion {
    pub(crate) x: u16,
    pub(crate) z: u16,
    pub(crate) flag_merge_threshold: u16,
    pub(crate) span: Span,
}

#[cfg(test)]
mod tests {
    use glam::Vec3A;

    use crate::span::{AreaType, SpanBuilder};

    use super::*;

    fn height_field() -> Heightfield {
        HeightfieldBuilder {
            aabb: Aabb3d::new(Vec3A::ZERO, [5.0, 5.0, 5.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
        .build()
        .unwrap()
    }

    fn span_low() -> SpanBuilder {
        SpanBuilder {
            min: 2,
            max: 4,
            area: AreaType(2),
            next: None,
        }
    }

    fn span_high() -> SpanBuilder {
        SpanBuilder {
            min: 7,
            max: 10,
            area: AreaType(2),
            next: None,
        }
    }

    #[test]
    fn can_add_span() {
        let mut heightfield = height_field();
        let expected_span = span_low().build();
        heightfield
            .add_span(SpanInsertion {
                x: 1,
                z: 3,
                flag_merge_threshold: 0,
                span: expected_span.clone(),
            })
            .unwrap();
        let span = heightfield.span_at(1, 3).unwrap();
        assert_eq!(*span, expected_span);
        assert_eq!(heightfield.span_at(3, 1), None);
    }

    #[test]
    fn can_merge_overlapping_spans() {
        let mut heightfield = height_field();
        heightfield
            .add_span(SpanInsertion {
                x: 1,
                z: 3,
                flag_merge_threshold: 0,
                span: span_low().build(),
            })
            .unwrap();
        heightfield
            .add_span(SpanInsertion {
                x: 1,
                z: 3,
                flag_merge_threshold: 0,
                span: SpanBuilder {
                    min: 4,
                    max: 7,
                    area: AreaType(2),
                    next: None,
                }
                .build(),
            })
            .unwrap();

        let span = heightfield.span_at(1, 3).unwrap();
        assert_eq!(span.min(), 2);
        assert_eq!(span.max(), 7);
    }

    #[test]
    fn non_overlapping_spans_stay_in_ascending_order() {
        let mut heightfield = height_field();
        heightfield
            .add_span(SpanInsertion {
                x: 1,
                z: 3,
                flag_merge_threshold: 0,
                span: span_high().build(),
            })
            .unwrap();
        heightfield
            .add_span(SpanInsertion {
                x: 1,
                z: 3,
                flag_merge_threshold: 0,
                span: span_low().build(),
            })
            .unwrap();

        let mut mins: Vec<u16> = heightfield.column(1, 3).map(|(_, s)| s.min()).collect();
        let sorted = {
            mins.sort_unstable();
            mins.clone()
        };
        assert_eq!(mins, sorted, "column must stay sorted by smin ascending");
        assert_eq!(mins, vec![2, 7]);
    }

    #[test]
    fn span_at_mut_edits_the_lowest_span_in_place() {
        let mut heightfield = height_field();
        heightfield
            .add_span(SpanInsertion {
                x: 1,
                z: 3,
                flag_merge_threshold: 0,
                span: span_low().build(),
            })
            .unwrap();

        heightfield.span_at_mut(1, 3).unwrap().set_area(AreaType(9));
        assert_eq!(heightfield.span_at(1, 3).unwrap().area(), AreaType(9));
    }
}
