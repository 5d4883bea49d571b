//! Splits one whole-level mesh into a grid of bounded tiles by repeated plane
//! clipping.
//!
//! Tiles cover the two horizontal axes in [`TILE_SIZE`] steps. Each tile clips
//! a fresh copy of the source mesh against its four inward-facing boundary
//! planes and is kept only if any polygon survives. Tiles are fully independent
//! outputs: coincident boundary geometry is reproduced exactly on both sides by
//! the clip, and nothing is shared between tile meshes, which also makes the
//! per-tile clip the natural unit of parallelism (`parallel` feature).

use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::mesh::MeshDescription;
use crate::mesh::clip::ClipPlane;
use log::debug;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Edge length of one spatial tile, in world units.
pub const TILE_SIZE: Real = 1024.0;

/// One surviving tile: its integer grid coordinates and the clipped mesh.
#[derive(Debug, Clone)]
pub struct TileMesh {
    pub x: i32,
    pub y: i32,
    pub mesh: MeshDescription,
}

/// Consumer of finished tile meshes (engine mesh construction, serialization…).
/// Implementations resolve polygon-group material names themselves; an
/// unresolvable name must not reject the tile.
pub trait MeshSink {
    fn submit_tile(&mut self, tile: TileMesh);
}

fn tile_planes(x: i32, y: i32) -> [ClipPlane; 4] {
    let x0 = x as Real * TILE_SIZE;
    let x1 = (x + 1) as Real * TILE_SIZE;
    let y0 = y as Real * TILE_SIZE;
    let y1 = (y + 1) as Real * TILE_SIZE;
    [
        ClipPlane::new(Point3::new(x0, 0.0, 0.0), Vector3::x()),
        ClipPlane::new(Point3::new(x1, 0.0, 0.0), -Vector3::x()),
        ClipPlane::new(Point3::new(0.0, y0, 0.0), Vector3::y()),
        ClipPlane::new(Point3::new(0.0, y1, 0.0), -Vector3::y()),
    ]
}

fn clip_tile(mesh: &MeshDescription, x: i32, y: i32) -> Option<TileMesh> {
    let mut tile_mesh = mesh.clone();
    tile_mesh.clip(&tile_planes(x, y));
    if tile_mesh.polygon_count() > 0 {
        Some(TileMesh { x, y, mesh: tile_mesh })
    } else {
        None
    }
}

/// Partition `mesh` into tiles covering `bounds` and hand every surviving tile
/// to `sink` in (x, y) order. Returns the number of tiles submitted.
pub fn partition_into_tiles<S: MeshSink>(
    mesh: &MeshDescription,
    bounds: &Aabb,
    sink: &mut S,
) -> usize {
    let cell_min_x = (bounds.mins.x / TILE_SIZE).floor() as i32;
    let cell_max_x = (bounds.maxs.x / TILE_SIZE).ceil() as i32;
    let cell_min_y = (bounds.mins.y / TILE_SIZE).floor() as i32;
    let cell_max_y = (bounds.maxs.y / TILE_SIZE).ceil() as i32;

    let cells: Vec<(i32, i32)> = (cell_min_x..=cell_max_x)
        .flat_map(|x| (cell_min_y..=cell_max_y).map(move |y| (x, y)))
        .collect();

    #[cfg(feature = "parallel")]
    let tiles: Vec<TileMesh> = cells
        .par_iter()
        .filter_map(|&(x, y)| clip_tile(mesh, x, y))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let tiles: Vec<TileMesh> = cells
        .iter()
        .filter_map(|&(x, y)| clip_tile(mesh, x, y))
        .collect();

    let submitted = tiles.len();
    for tile in tiles {
        debug!(
            "tile ({}, {}): {} polygons in {} groups",
            tile.x,
            tile.y,
            tile.mesh.polygon_count(),
            tile.mesh.polygon_group_count()
        );
        sink.submit_tile(tile);
    }
    submitted
}
