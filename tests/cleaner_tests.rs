mod support;

use bspmesh::MeshDescription;
use bspmesh::float_types::Real;
use nalgebra::Point3;
use support::{position_set, total_area};

/// A polygon whose loop revisits a position, the shape clipping leaves behind.
fn pentagon_with_duplicate() -> MeshDescription {
    let mut mesh = MeshDescription::new();
    let group = mesh.find_or_create_polygon_group("brick/wall01");
    let corners: [Point3<Real>; 5] = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0), // coincides with the previous corner
        Point3::new(2.0, 2.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    ];
    let perimeter: Vec<_> = corners
        .iter()
        .map(|&corner| {
            let vertex = mesh.create_vertex(corner);
            mesh.create_vertex_instance(vertex)
        })
        .collect();
    let _ = mesh.create_polygon(group, perimeter);
    mesh
}

#[test]
fn duplicate_positions_are_removed_from_the_loop() {
    let mut mesh = pentagon_with_duplicate();
    mesh.clean();

    assert_eq!(mesh.polygon_count(), 1);
    let polygon = mesh.polygon_ids().next().unwrap();
    assert_eq!(mesh[polygon].perimeter().len(), 4);
    assert_eq!(mesh.vertex_instance_count(), 4);
    assert_eq!(mesh.vertex_count(), 4);
    assert!((total_area(&mesh) - 4.0).abs() < 1e-9);
}

#[test]
fn cleanup_is_idempotent() {
    let mut mesh = pentagon_with_duplicate();
    mesh.clean();

    let positions = position_set(&mesh);
    let counts = (
        mesh.vertex_count(),
        mesh.vertex_instance_count(),
        mesh.edge_count(),
        mesh.polygon_count(),
        mesh.polygon_group_count(),
    );

    mesh.clean();

    assert_eq!(position_set(&mesh), positions);
    assert_eq!(
        counts,
        (
            mesh.vertex_count(),
            mesh.vertex_instance_count(),
            mesh.edge_count(),
            mesh.polygon_count(),
            mesh.polygon_group_count(),
        )
    );
}

#[test]
fn polygon_collapsing_below_three_corners_is_deleted() {
    let mut mesh = MeshDescription::new();
    let group = mesh.find_or_create_polygon_group("brick/wall01");
    let corners: [Point3<Real>; 3] = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
    ];
    let perimeter: Vec<_> = corners
        .iter()
        .map(|&corner| {
            let vertex = mesh.create_vertex(corner);
            mesh.create_vertex_instance(vertex)
        })
        .collect();
    let _ = mesh.create_polygon(group, perimeter);

    mesh.clean();

    assert_eq!(mesh.polygon_count(), 0);
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.vertex_instance_count(), 0);
    assert_eq!(mesh.edge_count(), 0);
    assert_eq!(mesh.polygon_group_count(), 0);
}

#[test]
fn clean_retriangulates_surviving_polygons() {
    let mut mesh = pentagon_with_duplicate();
    mesh.clean();
    let polygon = mesh.polygon_ids().next().unwrap();
    assert_eq!(mesh[polygon].triangles().len(), 2);
}
