//! Build configuration: every tunable the pipeline reads, validated once up
//! front by [`NavmeshConfigBuilder::build`] rather than scattered across each
//! stage.

use glam::Vec3A;
use thiserror::Error;

use crate::math::Aabb3d;

/// Which region-partitioning algorithm a build should use.
///
/// `Layered` exists for API parity with the source library's multi-layer
/// tile meshes, but is rejected at build time: see
/// [`crate::build::NavmeshBuildError::UnsupportedPartitionType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionType {
    /// Watershed partitioning: slower, produces fewer/larger regions with
    /// smooth boundaries.
    #[default]
    Watershed,
    /// Monotone row-sweep partitioning: faster, more regions, some
    /// axis-aligned tessellation artifacts.
    Monotone,
    /// Multi-layer tile partitioning. Not implemented.
    Layered,
}

/// Every tunable of the navmesh build pipeline. Build with [`NavmeshConfigBuilder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavmeshConfig {
    /// World AABB to voxelize.
    pub bounds: Aabb3d,
    /// World-unit cell size on the xz-plane.
    pub cell_size: f32,
    /// World-unit cell height.
    pub cell_height: f32,
    /// Triangles steeper than this (in radians) are non-walkable.
    pub walkable_slope_angle: f32,
    /// Minimum floor-to-ceiling clearance for a span to be walkable, in voxel units.
    pub walkable_height: u16,
    /// Maximum ledge height a character can step up, in voxel units.
    pub walkable_climb: u16,
    /// Minimum distance from unwalkable terrain a character's center can be, in voxel units.
    pub walkable_radius: u16,
    /// Maximum contour edge length before subdivision, in voxel units. `0` disables.
    pub max_edge_len: u16,
    /// Maximum Douglas-Peucker contour simplification deviation, in world units.
    pub max_simplification_error: f32,
    /// Regions smaller than this (in voxels²) are dropped entirely.
    pub min_region_area: u32,
    /// Regions smaller than this (in voxels²) are merged into a neighbor.
    pub merge_region_area: u32,
    /// Maximum vertices per output polygon, `3..=12`.
    pub max_verts_per_poly: u8,
    /// Sampling distance for detail mesh height resampling, in world units.
    /// Accepted and stored for forward compatibility; unused since this
    /// build does not layer a height-resampling detail mesh stage on top.
    pub detail_sample_dist: f32,
    /// Maximum detail mesh sampling error, in world units. Unused for the
    /// same reason as `detail_sample_dist`.
    pub detail_sample_max_error: f32,
    /// Padding baked around tile bounds, in voxel units.
    pub border_size: u16,
    /// Which region-partitioning algorithm to use.
    pub partition_type: PartitionType,
    /// Whether to run `rcFilterLowHangingWalkableObstacles`'s equivalent pass.
    pub filter_low_hanging_obstacles: bool,
    /// Whether to run `rcFilterLedgeSpans`'s equivalent pass.
    pub filter_ledge_spans: bool,
    /// Whether to run `rcFilterWalkableLowHeightSpans`'s equivalent pass.
    pub filter_walkable_low_height_spans: bool,
}

/// Errors from [`NavmeshConfigBuilder::build`]: the config is internally
/// inconsistent and the build should never be attempted.
#[derive(Error, Debug, PartialEq)]
pub enum NavmeshConfigError {
    /// `cell_size` or `cell_height` was not positive.
    #[error("cell_size and cell_height must be positive, got cell_size={cell_size}, cell_height={cell_height}")]
    NonPositiveCellSize {
        /// The offending cell size.
        cell_size: f32,
        /// The offending cell height.
        cell_height: f32,
    },
    /// The voxelization bounds had zero or negative volume on some axis.
    #[error("bounds must have positive volume, got min={min:?} max={max:?}")]
    DegenerateBounds {
        /// The bounds' minimum corner.
        min: Vec3A,
        /// The bounds' maximum corner.
        max: Vec3A,
    },
    /// `max_verts_per_poly` fell outside `3..=12`.
    #[error("max_verts_per_poly must be in 3..=12, got {0}")]
    InvalidMaxVertsPerPoly(u8),
    /// `walkable_slope_angle` fell outside `0..90` degrees.
    #[error("walkable_slope_angle must be in 0..90 degrees, got {0}")]
    InvalidSlopeAngle(f32),
}

/// Builder for [`NavmeshConfig`], with the same defaults the reference
/// tooling ships (a 0.3 world-unit cell size, a 45 degree walkable slope,
/// watershed partitioning).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavmeshConfigBuilder {
    /// See [`NavmeshConfig::bounds`].
    pub bounds: Aabb3d,
    /// See [`NavmeshConfig::cell_size`].
    pub cell_size: f32,
    /// See [`NavmeshConfig::cell_height`].
    pub cell_height: f32,
    /// Maximum walkable slope, in degrees.
    pub walkable_slope_angle_degrees: f32,
    /// See [`NavmeshConfig::walkable_height`].
    pub walkable_height: u16,
    /// See [`NavmeshConfig::walkable_climb`].
    pub walkable_climb: u16,
    /// See [`NavmeshConfig::walkable_radius`].
    pub walkable_radius: u16,
    /// See [`NavmeshConfig::max_edge_len`].
    pub max_edge_len: u16,
    /// See [`NavmeshConfig::max_simplification_error`].
    pub max_simplification_error: f32,
    /// See [`NavmeshConfig::min_region_area`].
    pub min_region_area: u32,
    /// See [`NavmeshConfig::merge_region_area`].
    pub merge_region_area: u32,
    /// See [`NavmeshConfig::max_verts_per_poly`].
    pub max_verts_per_poly: u8,
    /// See [`NavmeshConfig::detail_sample_dist`].
    pub detail_sample_dist: f32,
    /// See [`NavmeshConfig::detail_sample_max_error`].
    pub detail_sample_max_error: f32,
    /// See [`NavmeshConfig::border_size`].
    pub border_size: u16,
    /// See [`NavmeshConfig::partition_type`].
    pub partition_type: PartitionType,
    /// See [`NavmeshConfig::filter_low_hanging_obstacles`].
    pub filter_low_hanging_obstacles: bool,
    /// See [`NavmeshConfig::filter_ledge_spans`].
    pub filter_ledge_spans: bool,
    /// See [`NavmeshConfig::filter_walkable_low_height_spans`].
    pub filter_walkable_low_height_spans: bool,
}

impl Default for NavmeshConfigBuilder {
    fn default() -> Self {
        Self {
            bounds: Aabb3d::new(Vec3A::ZERO, Vec3A::ONE),
            cell_size: 0.3,
            cell_height: 0.2,
            walkable_slope_angle_degrees: 45.0,
            walkable_height: 10,
            walkable_climb: 4,
            walkable_radius: 2,
            max_edge_len: 40,
            max_simplification_error: 1.3,
            min_region_area: 64,
            merge_region_area: 400,
            max_verts_per_poly: 6,
            detail_sample_dist: 6.0,
            detail_sample_max_error: 1.0,
            border_size: 0,
            partition_type: PartitionType::Watershed,
            filter_low_hanging_obstacles: true,
            filter_ledge_spans: true,
            filter_walkable_low_height_spans: true,
        }
    }
}

impl NavmeshConfigBuilder {
    /// Creates a builder pre-filled with the reference defaults, targeting
    /// `bounds`.
    pub fn new(bounds: Aabb3d) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Validates the configuration and produces a [`NavmeshConfig`].
    pub fn build(self) -> Result<NavmeshConfig, NavmeshConfigError> {
        if self.cell_size <= 0.0 || self.cell_height <= 0.0 {
            return Err(NavmeshConfigError::NonPositiveCellSize {
                cell_size: self.cell_size,
                cell_height: self.cell_height,
            });
        }
        if self.bounds.max.x <= self.bounds.min.x
            || self.bounds.max.y <= self.bounds.min.y
            || self.bounds.max.z <= self.bounds.min.z
        {
            return Err(NavmeshConfigError::DegenerateBounds {
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }
        if !(3..=12).contains(&self.max_verts_per_poly) {
            return Err(NavmeshConfigError::InvalidMaxVertsPerPoly(
                self.max_verts_per_poly,
            ));
        }
        if !(0.0..90.0).contains(&self.walkable_slope_angle_degrees) {
            return Err(NavmeshConfigError::InvalidSlopeAngle(
                self.walkable_slope_angle_degrees,
            ));
        }

        Ok(NavmeshConfig {
            bounds: self.bounds,
            cell_size: self.cell_size,
            cell_height: self.cell_height,
            walkable_slope_angle: self.walkable_slope_angle_degrees.to_radians(),
            walkable_height: self.walkable_height,
            walkable_climb: self.walkable_climb,
            walkable_radius: self.walkable_radius,
            max_edge_len: self.max_edge_len,
            max_simplification_error: self.max_simplification_error,
            min_region_area: self.min_region_area,
            merge_region_area: self.merge_region_area,
            max_verts_per_poly: self.max_verts_per_poly,
            detail_sample_dist: self.detail_sample_dist,
            detail_sample_max_error: self.detail_sample_max_error,
            border_size: self.border_size,
            partition_type: self.partition_type,
            filter_low_hanging_obstacles: self.filter_low_hanging_obstacles,
            filter_ledge_spans: self.filter_ledge_spans,
            filter_walkable_low_height_spans: self.filter_walkable_low_height_spans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_successfully() {
        let bounds = Aabb3d::new(Vec3A::ZERO, Vec3A::new(10.0, 10.0, 10.0));
        let config = NavmeshConfigBuilder::new(bounds).build().unwrap();
        assert_eq!(config.partition_type, PartitionType::Watershed);
        assert!(config.walkable_slope_angle > 0.0);
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let bounds = Aabb3d::new(Vec3A::ZERO, Vec3A::ONE);
        let err = NavmeshConfigBuilder {
            cell_size: 0.0,
            ..NavmeshConfigBuilder::new(bounds)
        }
        .build()
        .unwrap_err();
        assert!(matches!(err, NavmeshConfigError::NonPositiveCellSize { .. }));
    }

    #[test]
    fn out_of_range_max_verts_per_poly_is_rejected() {
        let bounds = Aabb3d::new(Vec3A::ZERO, Vec3A::ONE);
        let err = NavmeshConfigBuilder {
            max_verts_per_poly: 20,
            ..NavmeshConfigBuilder::new(bounds)
        }
        .build()
        .unwrap_err();
        assert!(matches!(err, NavmeshConfigError::InvalidMaxVertsPerPoly(20)));
    }
}
