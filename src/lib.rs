//! A navigation mesh build pipeline and runtime A* query engine, ported from
//! the Recast & Detour C++ libraries.
//!
//! The build pipeline turns an arbitrary triangle soup into a walkable
//! polygon mesh in a sequence of stages (see [`build`]); [`query`] then
//! answers pathfinding queries against the result.

#![warn(missing_docs)]

pub mod bv_tree;
pub mod compact_heightfield;
pub mod compact_span;
pub mod config;
pub mod context;
pub mod contours;
pub mod detail_mesh;
pub mod distance_field;
pub mod erosion;
pub mod filters;
pub mod heightfield;
pub mod math;
pub mod monotone;
pub mod navmesh;
pub mod poly_mesh;
pub mod query;
pub mod rasterize;
pub mod region;
pub mod region_postprocess;
pub mod span;
pub mod trimesh;
pub mod watershed;

mod build;
mod compact_cell;

pub use build::{build_navmesh, build_navmesh_dyn, NavmeshBuildError};
pub use config::{NavmeshConfig, NavmeshConfigBuilder};
pub use navmesh::StaticNavMesh;
pub use query::NavMeshQuery;
