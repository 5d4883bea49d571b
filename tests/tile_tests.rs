mod support;

use bspmesh::float_types::Real;
use bspmesh::float_types::parry3d::bounding_volume::Aabb;
use bspmesh::tiles::{TILE_SIZE, partition_into_tiles};
use nalgebra::Point3;
use support::{CollectTiles, square_mesh, total_area};

#[test]
fn mesh_spanning_two_tiles_splits_without_losing_area() {
    // A rectangle straddling the x = 1024 tile boundary.
    let (mesh, _) = square_mesh([
        Point3::new(512.0, 0.0, 0.0),
        Point3::new(1536.0, 0.0, 0.0),
        Point3::new(1536.0, 512.0, 0.0),
        Point3::new(512.0, 512.0, 0.0),
    ]);
    let source_area = total_area(&mesh);
    let bounds = Aabb::new(Point3::new(512.0, 0.0, -16.0), Point3::new(1536.0, 512.0, 16.0));

    let mut sink = CollectTiles::default();
    let submitted = partition_into_tiles(&mesh, &bounds, &mut sink);

    assert_eq!(submitted, 2);
    assert_eq!(sink.tiles.len(), 2);
    let coordinates: Vec<(i32, i32)> = sink.tiles.iter().map(|t| (t.x, t.y)).collect();
    assert!(coordinates.contains(&(0, 0)));
    assert!(coordinates.contains(&(1, 0)));

    let tiled_area: Real = sink.tiles.iter().map(|tile| total_area(&tile.mesh)).sum();
    assert!((tiled_area - source_area).abs() < 1e-6);

    // Each tile's geometry stays inside its own bounds.
    for tile in &sink.tiles {
        let x0 = tile.x as Real * TILE_SIZE;
        let x1 = (tile.x + 1) as Real * TILE_SIZE;
        for vertex in tile.mesh.vertex_ids() {
            let position = tile.mesh[vertex].position;
            assert!(position.x >= x0 - 1e-6 && position.x <= x1 + 1e-6);
        }
    }
}

#[test]
fn tiles_with_no_geometry_are_dropped() {
    // Small square well inside one tile; the covering range still probes
    // several tiles but only one survives.
    let (mesh, _) = square_mesh([
        Point3::new(100.0, 100.0, 0.0),
        Point3::new(200.0, 100.0, 0.0),
        Point3::new(200.0, 200.0, 0.0),
        Point3::new(100.0, 200.0, 0.0),
    ]);
    let bounds = Aabb::new(Point3::new(0.0, 0.0, -16.0), Point3::new(2100.0, 2100.0, 16.0));

    let mut sink = CollectTiles::default();
    let submitted = partition_into_tiles(&mesh, &bounds, &mut sink);

    assert_eq!(submitted, 1);
    assert_eq!(sink.tiles[0].x, 0);
    assert_eq!(sink.tiles[0].y, 0);
    assert!((total_area(&sink.tiles[0].mesh) - 10_000.0).abs() < 1e-6);
}

#[test]
fn tile_boundary_geometry_is_identical_on_both_sides() {
    let (mesh, _) = square_mesh([
        Point3::new(512.0, 0.0, 0.0),
        Point3::new(1536.0, 0.0, 0.0),
        Point3::new(1536.0, 512.0, 0.0),
        Point3::new(512.0, 512.0, 0.0),
    ]);
    let bounds = Aabb::new(Point3::new(512.0, 0.0, -16.0), Point3::new(1536.0, 512.0, 16.0));

    let mut sink = CollectTiles::default();
    let _ = partition_into_tiles(&mesh, &bounds, &mut sink);

    let boundary_positions = |tile: &bspmesh::tiles::TileMesh| {
        let mut positions: Vec<[i64; 2]> = tile
            .mesh
            .vertex_ids()
            .filter(|&v| (tile.mesh[v].position.x - TILE_SIZE).abs() < 1e-6)
            .map(|v| {
                let p = tile.mesh[v].position;
                [(p.y * 1000.0).round() as i64, (p.z * 1000.0).round() as i64]
            })
            .collect();
        positions.sort_unstable();
        positions
    };

    let left = sink.tiles.iter().find(|t| t.x == 0).unwrap();
    let right = sink.tiles.iter().find(|t| t.x == 1).unwrap();
    assert_eq!(boundary_positions(left), boundary_positions(right));
    assert!(!boundary_positions(left).is_empty());
}
