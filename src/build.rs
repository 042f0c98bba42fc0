//! Top-level build orchestration: wires every pipeline stage together in
//! order and translates each stage's error into one [`NavmeshBuildError`].
//!
//! Corresponds to the `rcContext`-driven build sequence samples built around
//! `Sample_SoloMesh::handleBuild` in the original tooling.

use thiserror::Error;

use crate::compact_heightfield::{CompactHeightfield, CompactHeightfieldError};
use crate::config::{NavmeshConfig, PartitionType};
use crate::context::BuildContext;
use crate::contours::build_contours;
use crate::distance_field::build_distance_field;
use crate::erosion::erode_walkable_area;
use crate::heightfield::{HeightfieldBuilder, HeightfieldBuilderError};
use crate::monotone::build_regions_monotone;
use crate::navmesh::StaticNavMesh;
use crate::poly_mesh::build_poly_mesh;
use crate::rasterize::{FilterToggles, RasterizeError};
use crate::region_postprocess::filter_and_merge_regions;
use crate::trimesh::TriMesh;
use crate::watershed::build_regions;

/// Every error a navmesh build can fail with, one variant per stage.
#[derive(Error, Debug)]
pub enum NavmeshBuildError {
    /// The heightfield's bounds/cell size were invalid.
    #[error(transparent)]
    Heightfield(#[from] HeightfieldBuilderError),
    /// Rasterizing the input geometry failed.
    #[error(transparent)]
    Rasterize(#[from] RasterizeError),
    /// Collapsing to a compact heightfield failed.
    #[error(transparent)]
    CompactHeightfield(#[from] CompactHeightfieldError),
    /// `config.partition_type` was [`PartitionType::Layered`]; multi-layer
    /// tile meshes are not implemented.
    #[error("layered partitioning is not implemented")]
    UnsupportedPartitionType,
}

/// Runs the full build pipeline: rasterization, filtering, compaction,
/// erosion, region partitioning, contour tracing, polygon meshing, and
/// finally BV-tree construction, producing a queryable [`StaticNavMesh`].
pub fn build_navmesh(
    trimesh: &TriMesh,
    config: &NavmeshConfig,
    ctx: &mut BuildContext,
) -> Result<StaticNavMesh, NavmeshBuildError> {
    if config.partition_type == PartitionType::Layered {
        ctx.log_error("build", "layered partitioning was requested but is not implemented");
        return Err(NavmeshBuildError::UnsupportedPartitionType);
    }

    let mut trimesh = trimesh.clone();
    trimesh.mark_walkable_triangles(config.walkable_slope_angle);
    ctx.log_progress(
        "build",
        format!("marked {} triangles walkable", trimesh.area_types.iter().filter(|a| a.is_walkable()).count()),
    );

    let mut heightfield = HeightfieldBuilder {
        aabb: config.bounds,
        cell_size: config.cell_size,
        cell_height: config.cell_height,
    }
    .build()?;
    ctx.log_progress(
        "build",
        format!("voxelized to a {}x{} heightfield", heightfield.width, heightfield.height),
    );

    heightfield.populate_from_trimesh(
        &trimesh,
        config.walkable_height,
        config.walkable_climb,
        FilterToggles {
            low_hanging_obstacles: config.filter_low_hanging_obstacles,
            ledge_spans: config.filter_ledge_spans,
            walkable_low_height_spans: config.filter_walkable_low_height_spans,
        },
    )?;

    let mut chf =
        CompactHeightfield::from_heightfield(&heightfield, config.walkable_height, config.walkable_climb)?;
    ctx.log_progress("build", format!("compacted to {} walkable spans", chf.span_count));

    if config.walkable_radius > 0 {
        erode_walkable_area(&mut chf, config.walkable_radius);
        ctx.log_progress("build", format!("eroded {} voxels from walkable edges", config.walkable_radius));
    }

    let region_count = match config.partition_type {
        PartitionType::Watershed => {
            let (distances, _max_distance) = build_distance_field(&chf);
            build_regions(&mut chf, &distances, config.border_size)
        }
        PartitionType::Monotone => build_regions_monotone(&mut chf, config.border_size),
        PartitionType::Layered => unreachable!("checked above"),
    };
    ctx.log_progress("build", format!("partitioned into {region_count} raw regions"));

    let region_count = filter_and_merge_regions(&mut chf, config.min_region_area, config.merge_region_area);
    ctx.log_progress("build", format!("{region_count} regions after filter/merge"));

    let max_error_voxels = config.max_simplification_error / config.cell_size;
    let contour_set = build_contours(&chf, max_error_voxels, config.max_edge_len);
    ctx.log_progress("build", format!("traced {} contours", contour_set.contours.len()));

    let poly_mesh = build_poly_mesh(&contour_set, config.max_verts_per_poly as usize, ctx);
    ctx.log_progress("build", format!("meshed {} polygons", poly_mesh.poly_count()));

    let navmesh = StaticNavMesh::from_poly_mesh(&poly_mesh);
    ctx.log_progress("build", format!("built navmesh with {} vertices", navmesh.vertices.len()));

    Ok(navmesh)
}

/// Same as [`build_navmesh`], but erases the error type. For callers (an
/// editor tool, a CLI) that just want to report a failure, not match on its
/// category.
pub fn build_navmesh_dyn(
    trimesh: &TriMesh,
    config: &NavmeshConfig,
    ctx: &mut BuildContext,
) -> anyhow::Result<StaticNavMesh> {
    Ok(build_navmesh(trimesh, config, ctx)?)
}
