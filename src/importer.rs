//! Top-level import orchestration.
//!
//! [`import_geometry`] drives the render path: gather the world model's faces,
//! rebuild them into one mesh, and partition it into spatial tiles for the
//! [`MeshSink`]. [`import_brushes`] drives the brush path: gather the world
//! model's brush indices, resolve each brush's bounding half-spaces, and hand
//! them to a [`BrushSink`]. Both paths treat the consuming side as an opaque
//! collaborator and hold no reference to anything it creates.

use crate::bsp::{BspFile, traverse};
use crate::errors::BspError;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::mesh::MeshDescription;
use crate::mesh::build::build_faces;
use crate::mesh::clip::ClipPlane;
use crate::tiles::partition_into_tiles;
use log::info;
use nalgebra::Point3;

pub use crate::collision::{CollisionSink, ConvexHull, decompose_triangle_soup};
pub use crate::tiles::{MeshSink, TileMesh};

/// Counts reported by a completed geometry import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometrySummary {
    pub faces: usize,
    pub polygons: usize,
    pub tiles: usize,
}

/// Counts reported by a completed brush import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushSummary {
    pub brushes: usize,
    /// Brushes referenced only by sub-models (brush entities); not imported.
    pub skipped_submodel_brushes: usize,
}

/// A brush as an intersection of half-spaces, ready for a solid-geometry
/// builder on the consuming side.
#[derive(Debug, Clone)]
pub struct BrushGeometry {
    pub index: u16,
    pub contents: i32,
    pub planes: Vec<ClipPlane>,
}

/// Consumer of reconstructed brushes.
pub trait BrushSink {
    fn submit_brush(&mut self, brush: BrushGeometry);
}

/// Rebuild the world model's static geometry and hand it to `sink` one spatial
/// tile at a time.
pub fn import_geometry<S: MeshSink>(
    bsp: &BspFile,
    sink: &mut S,
) -> Result<GeometrySummary, BspError> {
    info!("importing geometry...");
    let world = bsp.models.first().ok_or(BspError::NoModels)?;
    let head_node = world.head_node as usize;

    let faces = traverse::gather_faces(bsp, head_node, None)?;
    let mut mesh = MeshDescription::new();
    build_faces(bsp, &faces, &mut mesh)?;
    let polygons = mesh.polygon_count();

    let node = bsp.node(head_node)?;
    let bounds = Aabb::new(
        Point3::new(node.mins[0], node.mins[1], node.mins[2]),
        Point3::new(node.maxs[0], node.maxs[1], node.maxs[2]),
    );
    let tiles = partition_into_tiles(&mesh, &bounds, sink);

    info!(
        "imported {} faces into {} polygons across {} tiles",
        faces.len(),
        polygons,
        tiles
    );
    Ok(GeometrySummary {
        faces: faces.len(),
        polygons,
        tiles,
    })
}

/// Reconstruct the world model's brushes as half-space intersections, in
/// ascending brush-index order.
pub fn import_brushes<S: BrushSink>(
    bsp: &BspFile,
    sink: &mut S,
) -> Result<BrushSummary, BspError> {
    info!("importing brushes...");
    let mut brushes = 0;
    let mut skipped_submodel_brushes = 0;

    for (model_index, model) in bsp.models.iter().enumerate() {
        let mut brush_indices = traverse::gather_brushes(bsp, model.head_node as usize)?;
        brush_indices.sort_unstable();

        for brush_index in brush_indices {
            if model_index != 0 {
                // Brush entities hang off sub-models; they are not static world
                // geometry and are left to an entity importer.
                skipped_submodel_brushes += 1;
                continue;
            }
            let brush = bsp.brush(brush_index as usize)?;
            let mut planes = Vec::with_capacity(brush.num_sides as usize);
            for side in 0..brush.num_sides {
                let brush_side = bsp.brush_side((brush.first_side + side) as usize)?;
                let plane = bsp.plane(brush_side.plane_num as usize)?;
                planes.push(ClipPlane::from_normal(plane.normal, plane.distance));
            }
            sink.submit_brush(BrushGeometry {
                index: brush_index,
                contents: brush.contents,
                planes,
            });
            brushes += 1;
        }
    }

    info!("imported {} brushes ({} sub-model brushes skipped)", brushes, skipped_submodel_brushes);
    Ok(BrushSummary {
        brushes,
        skipped_submodel_brushes,
    })
}
