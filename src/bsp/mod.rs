//! Read-only source data model for a compiled BSP level.
//!
//! A [`BspFile`] is the already-parsed in-memory form of the binary format:
//! dense arrays indexed by plain integers, produced by an external parser and
//! never mutated by this crate. Every cross-array reference goes through a
//! checked accessor; an out-of-range index means the source data is malformed
//! and surfaces as [`BspError::IndexOutOfRange`].
//!
//! Leaf encoding: a negative node child `c` refers to leaf `-1 - c`.

use crate::errors::BspError;
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

pub mod traverse;

/// Internal node of the spatial partition tree.
#[derive(Debug, Clone, Default)]
pub struct BspNode {
    /// Index into [`BspFile::planes`] of the splitting plane.
    pub plane_num: i32,
    /// Child node indices; negative values encode leaves (`leaf = -1 - child`).
    pub children: [i32; 2],
    /// Axis-aligned bounds of everything under this node.
    pub mins: [Real; 3],
    pub maxs: [Real; 3],
}

/// Terminal convex region of the partition.
#[derive(Debug, Clone, Default)]
pub struct BspLeaf {
    /// Visibility cluster id; `-1` when the leaf is outside the playable area.
    pub cluster: i16,
    pub first_leaf_face: u16,
    pub num_leaf_faces: u16,
    pub first_leaf_brush: u16,
    pub num_leaf_brushes: u16,
}

/// A renderable surface: a fan of edges over one texture projection.
#[derive(Debug, Clone, Default)]
pub struct BspFace {
    /// Index of the first entry in [`BspFile::surf_edges`].
    pub first_edge: i32,
    pub num_edges: i16,
    /// Index into [`BspFile::tex_infos`].
    pub tex_info: i16,
    /// 16-bit smoothing-group bitmask; faces sharing no bit meet at a hard edge.
    pub smoothing_groups: u16,
}

/// Pair of vertex indices shared between up to two faces.
#[derive(Debug, Clone, Default)]
pub struct BspEdge {
    pub vertices: [u16; 2],
}

/// Texture projection: UVs derive from two 4-component row vectors.
#[derive(Debug, Clone, Default)]
pub struct BspTexInfo {
    /// `[0]` projects U, `[1]` projects V; the fourth component is the offset.
    pub texture_vecs: [[Real; 4]; 2],
    /// Index into [`BspFile::tex_datas`].
    pub tex_data: i32,
}

/// Per-texture data shared by all texinfos referencing it.
#[derive(Debug, Clone, Default)]
pub struct BspTexData {
    /// Index into [`BspFile::tex_data_string_table`].
    pub name_string_table_id: i32,
    pub width: i32,
    pub height: i32,
}

/// Half-space boundary used by nodes and brush sides.
#[derive(Debug, Clone)]
pub struct BspPlane {
    pub normal: Vector3<Real>,
    pub distance: Real,
}

impl Default for BspPlane {
    fn default() -> Self {
        BspPlane {
            normal: Vector3::zeros(),
            distance: 0.0,
        }
    }
}

/// Convex solid volume defined by an intersection of half-spaces.
#[derive(Debug, Clone, Default)]
pub struct BspBrush {
    pub first_side: i32,
    pub num_sides: i32,
    pub contents: i32,
}

/// One bounding half-space of a brush.
#[derive(Debug, Clone, Default)]
pub struct BspBrushSide {
    pub plane_num: u16,
}

/// A self-contained sub-tree of geometry; model 0 is the world.
#[derive(Debug, Clone)]
pub struct BspModel {
    pub mins: Vector3<Real>,
    pub maxs: Vector3<Real>,
    pub head_node: i32,
}

impl Default for BspModel {
    fn default() -> Self {
        BspModel {
            mins: Vector3::zeros(),
            maxs: Vector3::zeros(),
            head_node: 0,
        }
    }
}

/// The parsed level: every lump this pipeline reads, as dense arrays.
#[derive(Debug, Clone, Default)]
pub struct BspFile {
    pub nodes: Vec<BspNode>,
    pub leaves: Vec<BspLeaf>,
    pub leaf_faces: Vec<u16>,
    pub leaf_brushes: Vec<u16>,
    pub faces: Vec<BspFace>,
    pub surf_edges: Vec<i32>,
    pub edges: Vec<BspEdge>,
    pub vertices: Vec<Point3<Real>>,
    pub tex_infos: Vec<BspTexInfo>,
    pub tex_datas: Vec<BspTexData>,
    pub tex_data_string_table: Vec<i32>,
    /// NUL-separated texture name blob addressed by the string table.
    pub tex_data_string_data: Vec<u8>,
    pub planes: Vec<BspPlane>,
    pub brushes: Vec<BspBrush>,
    pub brush_sides: Vec<BspBrushSide>,
    pub models: Vec<BspModel>,
}

fn get<'a, T>(items: &'a [T], index: usize, kind: &'static str) -> Result<&'a T, BspError> {
    items.get(index).ok_or(BspError::IndexOutOfRange {
        kind,
        index,
        len: items.len(),
    })
}

impl BspFile {
    pub fn node(&self, index: usize) -> Result<&BspNode, BspError> {
        get(&self.nodes, index, "node")
    }

    pub fn leaf(&self, index: usize) -> Result<&BspLeaf, BspError> {
        get(&self.leaves, index, "leaf")
    }

    pub fn leaf_face(&self, index: usize) -> Result<u16, BspError> {
        get(&self.leaf_faces, index, "leaf-face").copied()
    }

    pub fn leaf_brush(&self, index: usize) -> Result<u16, BspError> {
        get(&self.leaf_brushes, index, "leaf-brush").copied()
    }

    pub fn face(&self, index: usize) -> Result<&BspFace, BspError> {
        get(&self.faces, index, "face")
    }

    pub fn surf_edge(&self, index: usize) -> Result<i32, BspError> {
        get(&self.surf_edges, index, "surf-edge").copied()
    }

    pub fn edge(&self, index: usize) -> Result<&BspEdge, BspError> {
        get(&self.edges, index, "edge")
    }

    pub fn vertex(&self, index: usize) -> Result<&Point3<Real>, BspError> {
        get(&self.vertices, index, "vertex")
    }

    pub fn tex_info(&self, index: usize) -> Result<&BspTexInfo, BspError> {
        get(&self.tex_infos, index, "texinfo")
    }

    pub fn tex_data(&self, index: usize) -> Result<&BspTexData, BspError> {
        get(&self.tex_datas, index, "texdata")
    }

    pub fn plane(&self, index: usize) -> Result<&BspPlane, BspError> {
        get(&self.planes, index, "plane")
    }

    pub fn brush(&self, index: usize) -> Result<&BspBrush, BspError> {
        get(&self.brushes, index, "brush")
    }

    pub fn brush_side(&self, index: usize) -> Result<&BspBrushSide, BspError> {
        get(&self.brush_sides, index, "brush-side")
    }

    pub fn model(&self, index: usize) -> Result<&BspModel, BspError> {
        get(&self.models, index, "model")
    }

    /// Resolve a texdata's raw (still decorated) texture name from the string table.
    pub fn texture_name(&self, tex_data: &BspTexData) -> Result<&str, BspError> {
        let offset =
            *get(&self.tex_data_string_table, tex_data.name_string_table_id as usize, "string-table")?
                as usize;
        if offset >= self.tex_data_string_data.len() {
            return Err(BspError::IndexOutOfRange {
                kind: "string-data",
                index: offset,
                len: self.tex_data_string_data.len(),
            });
        }
        let bytes = &self.tex_data_string_data[offset..];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end]).map_err(|_| BspError::InvalidTextureName { offset })
    }
}
