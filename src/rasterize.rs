//! Triangle rasterization: clips each triangle against the heightfield's row
//! and column grid lines (Sutherland–Hodgman style) and inserts the resulting
//! vertical extent as a span.

use glam::Vec3A;
use thiserror::Error;

use crate::{
    heightfield::{Heightfield, SpanInsertion, SpanInsertionError},
    span::{AreaType, SpanBuilder},
    trimesh::{triangle_aabb, TriMesh},
};

/// Maximum vertices kept for a single row/column clip slice. Triangles that
/// would need more are dropped (this can only happen for degenerate input).
const MAX_SLICE_VERTS: usize = 12;

/// Errors that can occur while rasterizing a [`TriMesh`] into a [`Heightfield`].
#[derive(Error, Debug)]
pub enum RasterizeError {
    /// Span insertion failed (out-of-bounds column).
    #[error(transparent)]
    SpanInsertion(#[from] SpanInsertionError),
}

/// Which of the three post-rasterization filter passes to run. Each mirrors
/// one of the original's `rcFilter*` entry points and can be toggled
/// independently by [`crate::config::NavmeshConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterToggles {
    /// Run the low-hanging walkable obstacle pass.
    pub low_hanging_obstacles: bool,
    /// Run the ledge span pass.
    pub ledge_spans: bool,
    /// Run the low-clearance span pass.
    pub walkable_low_height_spans: bool,
}

impl Heightfield {
    /// Rasterizes every triangle of `trimesh` into this heightfield, then
    /// runs whichever of the three `rcFilter*`-equivalent passes `filters`
    /// enables.
    pub fn populate_from_trimesh(
        &mut self,
        trimesh: &TriMesh,
        walkable_height: u16,
        walkable_climb: u16,
        filters: FilterToggles,
    ) -> Result<(), RasterizeError> {
        for (i, triangle) in trimesh.indices.iter().enumerate() {
            let verts = [
                trimesh.vertices[triangle.x as usize],
                trimesh.vertices[triangle.y as usize],
                trimesh.vertices[triangle.z as usize],
            ];
            let area = trimesh.area_types[i];
            self.rasterize_triangle(verts, area, walkable_climb)?;
        }
        if filters.low_hanging_obstacles {
            self.filter_low_hanging_walkable_obstacles(walkable_climb);
        }
        if filters.ledge_spans {
            self.filter_ledge_spans(walkable_height, walkable_climb);
        }
        if filters.walkable_low_height_spans {
            self.filter_walkable_low_height_spans(walkable_height);
        }
        Ok(())
    }

    /// Rasterizes a single triangle, inserting spans for every column it covers.
    pub(crate) fn rasterize_triangle(
        &mut self,
        verts: [Vec3A; 3],
        area: AreaType,
        flag_merge_threshold: u16,
    ) -> Result<(), RasterizeError> {
        let triangle_aabb = triangle_aabb(&verts);
        if !self.aabb.intersects(&triangle_aabb) {
            return Ok(());
        }

        let cs = self.cell_size;
        let ics = 1.0 / cs;
        let ich = 1.0 / self.cell_height;
        let by = self.aabb.max.y - self.aabb.min.y;

        let z0 = (((triangle_aabb.min.z - self.aabb.min.z) * ics) as i32).clamp(
            0,
            self.height as i32 - 1,
        );
        let z1 = (((triangle_aabb.max.z - self.aabb.min.z) * ics) as i32).clamp(
            0,
            self.height as i32 - 1,
        );

        let mut in_poly: Vec<Vec3A> = verts.to_vec();

        for z in z0..=z1 {
            let cell_z = self.aabb.min.z + z as f32 * cs;
            let Some((row, rest)) = divide_poly(&in_poly, 2, cell_z + cs) else {
                continue;
            };
            in_poly = rest;
            if row.len() < 3 {
                continue;
            }

            let min_x = row.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
            let max_x = row.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max);
            let x0 = (((min_x - self.aabb.min.x) * ics) as i32).clamp(0, self.width as i32 - 1);
            let x1 = (((max_x - self.aabb.min.x) * ics) as i32).clamp(0, self.width as i32 - 1);

            let mut row_poly = row;
            for x in x0..=x1 {
                let cell_x = self.aabb.min.x + x as f32 * cs;
                let Some((cell_poly, rest)) = divide_poly(&row_poly, 0, cell_x + cs) else {
                    continue;
                };
                row_poly = rest;
                if cell_poly.len() < 3 {
                    continue;
                }

                let mut y_min = cell_poly[0].y;
                let mut y_max = cell_poly[0].y;
                for v in &cell_poly[1..] {
                    y_min = y_min.min(v.y);
                    y_max = y_max.max(v.y);
                }
                y_min -= self.aabb.min.y;
                y_max -= self.aabb.min.y;

                if y_max < 0.0 || y_min > by {
                    continue;
                }
                let y_min = y_min.max(0.0);
                let y_max = y_max.min(by);

                let smin = (y_min * ich).floor().max(-1.0) as i32;
                let smax = ((y_max * ich).ceil() as i32).max(smin + 1);
                let smin = smin.clamp(0, (1 << 13) - 1) as u16;
                let smax = smax.clamp(smin as i32 + 1, (1 << 13) - 1) as u16;

                self.add_span(SpanInsertion {
                    x: x as u16,
                    z: z as u16,
                    flag_merge_threshold,
                    span: SpanBuilder {
                        min: smin,
                        max: smax,
                        area,
                        next: None,
                    }
                    .build(),
                })?;
            }
        }
        Ok(())
    }

}

/// Clips a convex polygon by the half-space `coord[axis] < offset`, returning
/// `(below, above)`. Mirrors the original's `dividePoly`. Returns `None` if
/// either side would exceed [`MAX_SLICE_VERTS`] (degenerate input only).
fn divide_poly(verts: &[Vec3A], axis: usize, offset: f32) -> Option<(Vec<Vec3A>, Vec<Vec3A>)> {
    let n = verts.len();
    let d: Vec<f32> = verts.iter().map(|v| offset - v[axis]).collect();

    let mut below = Vec::with_capacity(n + 1);
    let mut above = Vec::with_capacity(n + 1);

    let mut j = n - 1;
    for i in 0..n {
        let in_a = d[j] >= 0.0;
        let in_b = d[i] >= 0.0;
        if in_a != in_b {
            let s = d[j] / (d[j] - d[i]);
            let intersection = verts[j] + (verts[i] - verts[j]) * s;
            below.push(intersection);
            above.push(intersection);
            if d[i] > 0.0 {
                below.push(verts[i]);
            } else if d[i] < 0.0 {
                above.push(verts[i]);
            }
        } else if d[i] >= 0.0 {
            below.push(verts[i]);
            if d[i] == 0.0 {
                above.push(verts[i]);
            }
        } else {
            above.push(verts[i]);
        }
        j = i;
        if below.len() > MAX_SLICE_VERTS || above.len() > MAX_SLICE_VERTS {
            return None;
        }
    }
    Some((below, above))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::HeightfieldBuilder;
    use crate::math::Aabb3d;
    use glam::UVec3;

    fn flat_quad_heightfield() -> Heightfield {
        let mut hf = HeightfieldBuilder {
            aabb: Aabb3d::new([0.0, -1.0, 0.0], [4.0, 1.0, 4.0]),
            cell_size: 1.0,
            cell_height: 1.0,
        }
        .build()
        .unwrap();
        let mesh = TriMesh {
            vertices: vec![
                Vec3A::new(0.0, 0.0, 0.0),
                Vec3A::new(4.0, 0.0, 0.0),
                Vec3A::new(4.0, 0.0, 4.0),
                Vec3A::new(0.0, 0.0, 4.0),
            ],
            indices: vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
            area_types: vec![AreaType::WALKABLE, AreaType::WALKABLE],
        };
        hf.populate_from_trimesh(
            &mesh,
            1,
            0,
            FilterToggles {
                low_hanging_obstacles: true,
                ledge_spans: true,
                walkable_low_height_spans: true,
            },
        )
        .unwrap();
        hf
    }

    #[test]
    fn rasterizing_a_flat_quad_fills_every_column() {
        let hf = flat_quad_heightfield();
        for z in 0..hf.height {
            for x in 0..hf.width {
                assert!(
                    hf.span_at(x, z).is_some(),
                    "expected a span at ({x}, {z})"
                );
            }
        }
    }

    #[test]
    fn rasterized_spans_are_walkable() {
        let hf = flat_quad_heightfield();
        let span = hf.span_at(2, 2).unwrap();
        assert!(span.area().is_walkable());
    }
}
