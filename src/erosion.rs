//! Area erosion and area marking.
//!
//! Erosion pulls walkable area in from unwalkable boundaries by `radius`
//! cells, so a character's collision radius never clips through a wall.
//! Area marking stamps extra area types (mud, water, a scripted trigger
//! volume) onto whatever walkable spans fall inside a shape, without
//! affecting which spans are walkable.
//!
//! Ported from `rcErodeWalkableArea` and `rcMarkConvexPolyArea` /
//! `rcMarkBoxArea` / `rcMarkCylinderArea`.

use glam::Vec3A;

use crate::compact_heightfield::CompactHeightfield;
use crate::distance_field::chamfer_pass;
use crate::math::Aabb3d;
use crate::span::AreaType;

/// Erodes walkable area inward from unwalkable/border spans by `radius` cells
/// (`walkable_radius`, in cell units), setting eroded spans to [`AreaType::NOT_WALKABLE`].
///
/// Corresponds to `rcErodeWalkableArea`.
pub fn erode_walkable_area(chf: &mut CompactHeightfield, radius: u16) {
    if radius == 0 {
        return;
    }
    let mut dist = vec![u16::MAX; chf.span_count as usize];
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if !chf.area(i).is_walkable() {
                    dist[i as usize] = 0;
                    continue;
                }
                let span = *chf.span(i);
                let connected_walkable = (0..4u8)
                    .filter(|&dir| {
                        span.is_connected(dir)
                            && chf
                                .neighbor_index(i, dir)
                                .is_some_and(|n| chf.area(n).is_walkable())
                    })
                    .count();
                if connected_walkable != 4 {
                    dist[i as usize] = 0;
                }
            }
        }
    }

    chamfer_pass(chf, &mut dist);

    let threshold = radius * 2;
    for i in 0..chf.span_count {
        if dist[i as usize] < threshold {
            set_area(chf, i, AreaType::NOT_WALKABLE);
        }
    }
}

fn set_area(chf: &mut CompactHeightfield, index: u32, area: AreaType) {
    chf.areas[index as usize] = area;
}

/// An axis-aligned box area stamp.
#[derive(Debug, Clone, Copy)]
pub struct BoxVolume {
    /// The box's bounds.
    pub aabb: Aabb3d,
    /// The area type assigned to spans inside the box.
    pub area: AreaType,
}

/// A vertical cylinder area stamp.
#[derive(Debug, Clone, Copy)]
pub struct CylinderVolume {
    /// World-space position of the cylinder's base center.
    pub center: Vec3A,
    /// Radius on the xz-plane.
    pub radius: f32,
    /// Height along the y-axis.
    pub height: f32,
    /// The area type assigned to spans inside the cylinder.
    pub area: AreaType,
}

/// A convex polygon area stamp, extruded along y between `min_y` and `max_y`.
#[derive(Debug, Clone)]
pub struct ConvexVolume {
    /// Polygon vertices on the xz-plane, in order (winding does not matter).
    pub vertices: Vec<Vec3A>,
    /// Lower y bound of the extrusion.
    pub min_y: f32,
    /// Upper y bound of the extrusion.
    pub max_y: f32,
    /// The area type assigned to spans inside the volume.
    pub area: AreaType,
}

/// Marks every span whose center falls inside `volume`'s box with its area type.
///
/// Corresponds to `rcMarkBoxArea`.
pub fn mark_box_area(chf: &mut CompactHeightfield, volume: &BoxVolume) {
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if !chf.area(i).is_walkable() {
                    continue;
                }
                let world = span_center(chf, x, z, i);
                if world.x >= volume.aabb.min.x
                    && world.x <= volume.aabb.max.x
                    && world.y >= volume.aabb.min.y
                    && world.y <= volume.aabb.max.y
                    && world.z >= volume.aabb.min.z
                    && world.z <= volume.aabb.max.z
                {
                    set_area(chf, i, volume.area);
                }
            }
        }
    }
}

/// Marks every span whose center falls inside `volume`'s cylinder with its area type.
///
/// Corresponds to `rcMarkCylinderArea`.
pub fn mark_cylinder_area(chf: &mut CompactHeightfield, volume: &CylinderVolume) {
    let radius_sq = volume.radius * volume.radius;
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if !chf.area(i).is_walkable() {
                    continue;
                }
                let world = span_center(chf, x, z, i);
                if world.y < volume.center.y || world.y > volume.center.y + volume.height {
                    continue;
                }
                let dx = world.x - volume.center.x;
                let dz = world.z - volume.center.z;
                if dx * dx + dz * dz <= radius_sq {
                    set_area(chf, i, volume.area);
                }
            }
        }
    }
}

/// Marks every span whose center falls inside `volume`'s convex polygon (xz)
/// and y extrusion with its area type.
///
/// Corresponds to `rcMarkConvexPolyArea`.
pub fn mark_convex_poly_area(chf: &mut CompactHeightfield, volume: &ConvexVolume) {
    for z in 0..chf.height {
        for x in 0..chf.width {
            let cell = chf.cell(x, z);
            for i in cell.index..cell.index + cell.count {
                if !chf.area(i).is_walkable() {
                    continue;
                }
                let world = span_center(chf, x, z, i);
                if world.y < volume.min_y || world.y > volume.max_y {
                    continue;
                }
                if point_in_poly(world.x, world.z, &volume.vertices) {
                    set_area(chf, i, volume.area);
                }
            }
        }
    }
}

fn span_center(chf: &CompactHeightfield, x: u16, z: u16, index: u32) -> Vec3A {
    let span = chf.span(index);
    Vec3A::new(
        chf.aabb.min.x + (x as f32 + 0.5) * chf.cell_size,
        chf.aabb.min.y + span.y() as f32 * chf.cell_height,
        chf.aabb.min.z + (z as f32 + 0.5) * chf.cell_size,
    )
}

/// Ray-casting point-in-polygon test on the xz-plane.
fn point_in_poly(x: f32, z: f32, verts: &[Vec3A]) -> bool {
    let mut inside = false;
    let mut j = verts.len() - 1;
    for i in 0..verts.len() {
        let vi = verts[i];
        let vj = verts[j];
        if ((vi.z > z) != (vj.z > z))
            && (x < (vj.x - vi.x) * (z - vi.z) / (vj.z - vi.z) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
