//! Shared fixtures for the integration tests: hand-built BSP source data and
//! small mesh/sink helpers.
#![allow(dead_code)]

use bspmesh::bsp::{
    BspBrush, BspBrushSide, BspEdge, BspFace, BspFile, BspLeaf, BspModel, BspNode, BspPlane,
    BspTexData, BspTexInfo,
};
use bspmesh::collision::{CollisionSink, ConvexHull};
use bspmesh::float_types::Real;
use bspmesh::importer::{BrushGeometry, BrushSink};
use bspmesh::mesh::{MeshDescription, PolygonId};
use bspmesh::tiles::{MeshSink, TileMesh};
use nalgebra::{Point3, Vector3};

/// Collects submitted tiles.
#[derive(Default)]
pub struct CollectTiles {
    pub tiles: Vec<TileMesh>,
}

impl MeshSink for CollectTiles {
    fn submit_tile(&mut self, tile: TileMesh) {
        self.tiles.push(tile);
    }
}

/// Collects submitted hull batches, one entry per sink call.
#[derive(Default)]
pub struct CollectHulls {
    pub batches: Vec<Vec<ConvexHull>>,
}

impl CollisionSink for CollectHulls {
    fn submit_hulls(&mut self, hulls: &[ConvexHull]) {
        self.batches.push(hulls.to_vec());
    }
}

/// Collects submitted brushes.
#[derive(Default)]
pub struct CollectBrushes {
    pub brushes: Vec<BrushGeometry>,
}

impl BrushSink for CollectBrushes {
    fn submit_brush(&mut self, brush: BrushGeometry) {
        self.brushes.push(brush);
    }
}

/// One square polygon with the given corners, in a single group.
pub fn square_mesh(corners: [Point3<Real>; 4]) -> (MeshDescription, PolygonId) {
    let mut mesh = MeshDescription::new();
    let group = mesh.find_or_create_polygon_group("brick/wall01");
    let perimeter: Vec<_> = corners
        .iter()
        .map(|&corner| {
            let vertex = mesh.create_vertex(corner);
            mesh.create_vertex_instance(vertex)
        })
        .collect();
    let polygon = mesh.create_polygon(group, perimeter);
    (mesh, polygon)
}

/// Area of one polygon from its perimeter contour (half the Newell norm).
pub fn polygon_area(mesh: &MeshDescription, polygon: PolygonId) -> Real {
    let positions: Vec<_> = mesh[polygon]
        .perimeter()
        .iter()
        .map(|&instance| mesh.instance_position(instance))
        .collect();
    let normal = positions
        .iter()
        .zip(positions.iter().cycle().skip(1))
        .fold(Vector3::zeros(), |acc: Vector3<Real>, (current, next)| {
            acc + current.coords.cross(&next.coords)
        });
    normal.norm() * 0.5
}

/// Total polygon area of a mesh.
pub fn total_area(mesh: &MeshDescription) -> Real {
    mesh.polygon_ids().map(|polygon| polygon_area(mesh, polygon)).sum()
}

/// Sorted, deduplicated vertex positions of a mesh, for set comparison.
pub fn position_set(mesh: &MeshDescription) -> Vec<[i64; 3]> {
    let mut positions: Vec<[i64; 3]> = mesh
        .vertex_ids()
        .map(|vertex| {
            let p = mesh[vertex].position;
            [
                (p.x * 1000.0).round() as i64,
                (p.y * 1000.0).round() as i64,
                (p.z * 1000.0).round() as i64,
            ]
        })
        .collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

/// A one-node, two-leaf level containing a single 64×64 square face textured
/// with `texture` and one six-sided box brush.
pub fn square_level(texture: &str) -> BspFile {
    let mut string_data = texture.as_bytes().to_vec();
    string_data.push(0);

    BspFile {
        nodes: vec![BspNode {
            plane_num: 0,
            children: [-1, -2],
            mins: [0.0, 0.0, -16.0],
            maxs: [64.0, 64.0, 16.0],
        }],
        leaves: vec![
            BspLeaf {
                cluster: 0,
                first_leaf_face: 0,
                num_leaf_faces: 1,
                first_leaf_brush: 0,
                num_leaf_brushes: 1,
            },
            BspLeaf {
                cluster: 1,
                ..Default::default()
            },
        ],
        leaf_faces: vec![0],
        leaf_brushes: vec![0],
        faces: vec![BspFace {
            first_edge: 0,
            num_edges: 4,
            tex_info: 0,
            smoothing_groups: 1,
        }],
        // Edge 0 is reserved; the face walks edges 1..=4 forwards.
        surf_edges: vec![1, 2, 3, 4],
        edges: vec![
            BspEdge { vertices: [0, 0] },
            BspEdge { vertices: [0, 1] },
            BspEdge { vertices: [1, 2] },
            BspEdge { vertices: [2, 3] },
            BspEdge { vertices: [3, 0] },
        ],
        vertices: vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(64.0, 0.0, 0.0),
            Point3::new(64.0, 64.0, 0.0),
            Point3::new(0.0, 64.0, 0.0),
        ],
        tex_infos: vec![BspTexInfo {
            texture_vecs: [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]],
            tex_data: 0,
        }],
        tex_datas: vec![BspTexData {
            name_string_table_id: 0,
            width: 64,
            height: 64,
        }],
        tex_data_string_table: vec![0],
        tex_data_string_data: string_data,
        planes: vec![
            BspPlane { normal: Vector3::x(), distance: 0.0 },
            BspPlane { normal: -Vector3::x(), distance: -64.0 },
            BspPlane { normal: Vector3::y(), distance: 0.0 },
            BspPlane { normal: -Vector3::y(), distance: -64.0 },
            BspPlane { normal: Vector3::z(), distance: -16.0 },
            BspPlane { normal: -Vector3::z(), distance: -16.0 },
        ],
        brushes: vec![BspBrush {
            first_side: 0,
            num_sides: 6,
            contents: 1,
        }],
        brush_sides: (0..6u16).map(|i| BspBrushSide { plane_num: i }).collect(),
        models: vec![BspModel {
            mins: Vector3::new(0.0, 0.0, -16.0),
            maxs: Vector3::new(64.0, 64.0, 16.0),
            head_node: 0,
        }],
    }
}

/// Triangle soup of an axis-aligned box, wound for the collision path's corner
/// reversal (the decomposer flips each triple back to outward winding).
pub fn box_soup(origin: Point3<Real>, size: Real) -> (Vec<Point3<Real>>, Vec<u32>) {
    let positions: Vec<Point3<Real>> = (0..8)
        .map(|i| {
            Point3::new(
                origin.x + if i & 1 != 0 { size } else { 0.0 },
                origin.y + if i & 2 != 0 { size } else { 0.0 },
                origin.z + if i & 4 != 0 { size } else { 0.0 },
            )
        })
        .collect();
    // Outward-wound quads of the box in the +x/-x, +y/-y, +z/-z order.
    let quads: [[u32; 4]; 6] = [
        [1, 3, 7, 5],
        [0, 4, 6, 2],
        [2, 6, 7, 3],
        [0, 1, 5, 4],
        [4, 5, 7, 6],
        [0, 2, 3, 1],
    ];
    let mut indices = Vec::with_capacity(quads.len() * 6);
    for quad in &quads {
        for triangle in [[quad[0], quad[1], quad[2]], [quad[0], quad[2], quad[3]]] {
            // Emit reversed so the decomposer's flip restores outward winding.
            indices.extend([triangle[2], triangle[1], triangle[0]]);
        }
    }
    (positions, indices)
}
