//! End-to-end scenarios exercising the build pipeline and query engine
//! together, as opposed to the per-stage unit tests living alongside each
//! module.

use glam::{UVec3, Vec3A};

use wayfield::config::NavmeshConfigBuilder;
use wayfield::context::BuildContext;
use wayfield::math::Aabb3d;
use wayfield::trimesh::TriMesh;
use wayfield::{build_navmesh, NavMeshQuery};

fn quad(min: Vec3A, max: Vec3A) -> (Vec<Vec3A>, Vec<UVec3>) {
    let verts = vec![
        Vec3A::new(min.x, min.y, min.z),
        Vec3A::new(max.x, min.y, min.z),
        Vec3A::new(max.x, min.y, max.z),
        Vec3A::new(min.x, min.y, max.z),
    ];
    (verts, vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)])
}

fn padded_bounds(min: Vec3A, max: Vec3A) -> Aabb3d {
    Aabb3d::new(min - Vec3A::new(0.0, 1.0, 0.0), max + Vec3A::new(0.0, 1.0, 0.0))
}

fn push_quad(vertices: &mut Vec<Vec3A>, indices: &mut Vec<UVec3>, min: Vec3A, max: Vec3A) {
    let base = vertices.len() as u32;
    let (q_verts, q_indices) = quad(min, max);
    vertices.extend(q_verts);
    indices.extend(q_indices.iter().map(|i| i + base));
}

#[test]
fn unit_quad_floor_becomes_one_polygon() {
    let (verts, indices) = quad(Vec3A::ZERO, Vec3A::new(4.0, 0.0, 4.0));
    let trimesh = TriMesh::new(verts, indices);
    let bounds = padded_bounds(Vec3A::ZERO, Vec3A::new(4.0, 0.0, 4.0));

    let config = NavmeshConfigBuilder {
        cell_size: 1.0,
        cell_height: 1.0,
        walkable_height: 1,
        walkable_climb: 0,
        walkable_radius: 0,
        max_verts_per_poly: 6,
        max_simplification_error: 1.3,
        min_region_area: 0,
        merge_region_area: 0,
        ..NavmeshConfigBuilder::new(bounds)
    }
    .build()
    .unwrap();

    let mut ctx = BuildContext::new();
    let navmesh = build_navmesh(&trimesh, &config, &mut ctx).unwrap();

    assert_eq!(navmesh.polys.len(), 1, "a single flat 4x4 floor should mesh to one polygon");
    let poly = &navmesh.polys[0];
    assert!(poly.vertex_count() >= 4);
    assert!(poly.neighbors.iter().all(|&n| n == u16::MAX), "an isolated floor has no neighbors");
}

fn two_floors_with_step(walkable_climb: u16) -> wayfield::StaticNavMesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    push_quad(&mut vertices, &mut indices, Vec3A::ZERO, Vec3A::new(4.0, 0.0, 4.0));
    push_quad(&mut vertices, &mut indices, Vec3A::new(4.0, 1.0, 0.0), Vec3A::new(8.0, 1.0, 4.0));

    let trimesh = TriMesh::new(vertices, indices);
    let bounds = padded_bounds(Vec3A::new(0.0, 0.0, 0.0), Vec3A::new(8.0, 1.0, 4.0));

    let config = NavmeshConfigBuilder {
        cell_size: 1.0,
        cell_height: 1.0,
        walkable_height: 1,
        walkable_climb,
        walkable_radius: 0,
        max_verts_per_poly: 6,
        max_simplification_error: 1.3,
        min_region_area: 0,
        merge_region_area: 0,
        ..NavmeshConfigBuilder::new(bounds)
    }
    .build()
    .unwrap();

    let mut ctx = BuildContext::new();
    build_navmesh(&trimesh, &config, &mut ctx).unwrap()
}

#[test]
fn a_step_within_walkable_climb_connects_the_two_floors() {
    let navmesh = two_floors_with_step(1);
    let total_neighbors: usize = navmesh
        .polys
        .iter()
        .flat_map(|p| p.neighbors.iter())
        .filter(|&&n| n != u16::MAX)
        .count();
    assert!(total_neighbors > 0, "a 1-voxel step within walkable_climb=1 should leave the floors connected");
}

#[test]
fn a_step_beyond_walkable_climb_leaves_the_two_floors_disconnected() {
    let navmesh = two_floors_with_step(0);
    let total_neighbors: usize = navmesh
        .polys
        .iter()
        .flat_map(|p| p.neighbors.iter())
        .filter(|&&n| n != u16::MAX)
        .count();
    assert_eq!(total_neighbors, 0, "a 1-voxel step beyond walkable_climb=0 must not connect across the ledge");
}

#[test]
fn raycast_stops_at_an_unconnected_ledge() {
    let navmesh = two_floors_with_step(0);
    let query = NavMeshQuery::new(&navmesh);
    let (start_ref, _) = query
        .find_nearest_poly(Vec3A::new(1.0, 0.0, 2.0), Vec3A::splat(1.0))
        .expect("the lower floor should contain this point");

    let t = query.raycast(start_ref, Vec3A::new(1.0, 0.0, 2.0), Vec3A::new(7.0, 0.0, 2.0));
    assert!(t > 0.0 && t < 1.0, "the raycast should stop at the unconnected ledge, got t={t}");
}

#[test]
fn distance_to_wall_on_a_square_floor_is_roughly_half_its_width() {
    let (verts, indices) = quad(Vec3A::ZERO, Vec3A::new(10.0, 0.0, 10.0));
    let trimesh = TriMesh::new(verts, indices);
    let bounds = padded_bounds(Vec3A::ZERO, Vec3A::new(10.0, 0.0, 10.0));

    let config = NavmeshConfigBuilder {
        cell_size: 1.0,
        cell_height: 1.0,
        walkable_height: 1,
        walkable_climb: 0,
        walkable_radius: 0,
        max_verts_per_poly: 6,
        min_region_area: 0,
        merge_region_area: 0,
        ..NavmeshConfigBuilder::new(bounds)
    }
    .build()
    .unwrap();

    let mut ctx = BuildContext::new();
    let navmesh = build_navmesh(&trimesh, &config, &mut ctx).unwrap();
    let mut query = NavMeshQuery::new(&navmesh);

    let center = Vec3A::new(5.0, 0.0, 5.0);
    let (start_ref, _) = query
        .find_nearest_poly(center, Vec3A::splat(1.0))
        .expect("the center of the floor should contain a polygon");

    let distance = query.find_distance_to_wall(start_ref, center, 10.0);
    assert!((3.5..=6.5).contains(&distance), "expected roughly half the floor width, got {distance}");
}

#[test]
fn a_path_detours_around_a_central_obstacle() {
    // Four L-shaped strips tiling a 10x10 floor around a 2x2 hole at
    // x in [4,6], z in [4,6] instead of one solid quad.
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    push_quad(&mut vertices, &mut indices, Vec3A::new(0.0, 0.0, 0.0), Vec3A::new(4.0, 0.0, 10.0));
    push_quad(&mut vertices, &mut indices, Vec3A::new(6.0, 0.0, 0.0), Vec3A::new(10.0, 0.0, 10.0));
    push_quad(&mut vertices, &mut indices, Vec3A::new(4.0, 0.0, 0.0), Vec3A::new(6.0, 0.0, 4.0));
    push_quad(&mut vertices, &mut indices, Vec3A::new(4.0, 0.0, 6.0), Vec3A::new(6.0, 0.0, 10.0));

    let trimesh = TriMesh::new(vertices, indices);
    let bounds = padded_bounds(Vec3A::ZERO, Vec3A::new(10.0, 0.0, 10.0));

    let config = NavmeshConfigBuilder {
        cell_size: 1.0,
        cell_height: 1.0,
        walkable_height: 1,
        walkable_climb: 0,
        walkable_radius: 0,
        max_verts_per_poly: 6,
        min_region_area: 0,
        merge_region_area: 0,
        ..NavmeshConfigBuilder::new(bounds)
    }
    .build()
    .unwrap();

    let mut ctx = BuildContext::new();
    let navmesh = build_navmesh(&trimesh, &config, &mut ctx).unwrap();
    let mut query = NavMeshQuery::new(&navmesh);

    let start = Vec3A::new(1.0, 0.0, 5.0);
    let end = Vec3A::new(9.0, 0.0, 5.0);
    let (start_ref, _) = query.find_nearest_poly(start, Vec3A::splat(1.0)).unwrap();
    let (end_ref, _) = query.find_nearest_poly(end, Vec3A::splat(1.0)).unwrap();

    let corridor = query.find_path(start_ref, end_ref).expect("a path around the obstacle should exist");
    assert!(corridor.len() >= 2, "reaching around the hole should cross more than one polygon");

    let straight = query.find_straight_path(start, end, &corridor);
    let length: f32 = straight.windows(2).map(|w| w[0].distance(w[1])).sum();
    let direct = start.distance(end);
    assert!(length >= direct, "detouring around the hole cannot be shorter than the direct line");
    assert!(length < direct * 2.5, "the detour should not be wildly longer than the direct line, got {length}");
}

#[test]
fn building_the_same_input_twice_is_deterministic() {
    let (verts, indices) = quad(Vec3A::ZERO, Vec3A::new(4.0, 0.0, 4.0));
    let trimesh = TriMesh::new(verts, indices);
    let bounds = padded_bounds(Vec3A::ZERO, Vec3A::new(4.0, 0.0, 4.0));

    let config = NavmeshConfigBuilder {
        cell_size: 1.0,
        cell_height: 1.0,
        walkable_height: 1,
        walkable_climb: 0,
        walkable_radius: 0,
        max_verts_per_poly: 6,
        min_region_area: 0,
        merge_region_area: 0,
        ..NavmeshConfigBuilder::new(bounds)
    }
    .build()
    .unwrap();

    let mut ctx_a = BuildContext::new();
    let navmesh_a = build_navmesh(&trimesh, &config, &mut ctx_a).unwrap();
    let mut ctx_b = BuildContext::new();
    let navmesh_b = build_navmesh(&trimesh, &config, &mut ctx_b).unwrap();

    assert_eq!(navmesh_a.to_blob(), navmesh_b.to_blob(), "identical input/config must produce identical blobs");
}
