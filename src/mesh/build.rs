//! Two-pass construction of a [`MeshDescription`] from a gathered face list.
//!
//! Pass 1 creates the geometry: one polygon group per distinct normalized
//! material name, one mesh vertex per distinct raw vertex index, one vertex
//! instance per face corner with its UV computed from the texture projection.
//! Pass 2 derives edge hardness from the faces' smoothing-group bitmasks.
//! Faces carrying a tool texture are skipped outright, and a face whose edge
//! walk yields fewer than three corners is dropped silently.

use crate::bsp::BspFile;
use crate::errors::BspError;
use crate::float_types::Real;
use crate::material;
use crate::mesh::{MeshDescription, PolygonId, VertexId};
use hashbrown::{HashMap, HashSet};
use log::debug;
use nalgebra::{Vector2, Vector3};

/// Whether two 16-bit smoothing-group bitmasks share at least one bit.
///
/// The bound is fixed at the format's 16 bits; an edge between faces sharing
/// no bit renders hard.
pub fn shares_smoothing_group(group_a: u16, group_b: u16) -> bool {
    (0..16).any(|i| {
        let mask = 1u16 << i;
        (group_a & mask) != 0 && (group_b & mask) != 0
    })
}

/// Build mesh geometry for `face_indices` into `mesh`, then derive edge
/// hardness, compute normals/tangents, and triangulate.
pub fn build_faces(
    bsp: &BspFile,
    face_indices: &[u16],
    mesh: &mut MeshDescription,
) -> Result<(), BspError> {
    let mut vertex_by_raw_index: HashMap<u16, VertexId> = HashMap::new();
    let mut group_by_material = HashMap::new();
    let mut face_by_polygon: HashMap<PolygonId, u16> = HashMap::new();
    let mut created: Vec<(PolygonId, u16)> = Vec::new();
    let mut skipped_tool_faces = 0usize;
    let mut dropped_degenerate = 0usize;

    // Pass 1: create geometry
    for &face_index in face_indices {
        let face = bsp.face(face_index as usize)?;
        let tex_info = bsp.tex_info(face.tex_info as usize)?;
        let tex_data = bsp.tex_data(tex_info.tex_data as usize)?;
        let name = material::normalize_name(bsp.texture_name(tex_data)?);
        if material::is_tool_texture(&name) {
            skipped_tool_faces += 1;
            continue;
        }

        let group = *group_by_material
            .entry(name.clone())
            .or_insert_with(|| mesh.find_or_create_polygon_group(&name));

        let tex_u = Vector3::new(
            tex_info.texture_vecs[0][0],
            tex_info.texture_vecs[0][1],
            tex_info.texture_vecs[0][2],
        );
        let tex_u_offset = tex_info.texture_vecs[0][3];
        let tex_v = Vector3::new(
            tex_info.texture_vecs[1][0],
            tex_info.texture_vecs[1][1],
            tex_info.texture_vecs[1][2],
        );
        let tex_v_offset = tex_info.texture_vecs[1][3];

        let mut perimeter = Vec::with_capacity(face.num_edges as usize);
        // The source likes to revisit vertices within one face; the first
        // revisit ends the loop to keep the contour simple.
        let mut visited: HashSet<u16> = HashSet::new();

        for i in 0..face.num_edges {
            let surf_edge = bsp.surf_edge(face.first_edge as usize + i as usize)?;
            let edge = bsp.edge(surf_edge.unsigned_abs() as usize)?;
            let raw_vertex = if surf_edge < 0 { edge.vertices[1] } else { edge.vertices[0] };

            if !visited.insert(raw_vertex) {
                break;
            }

            let vertex = match vertex_by_raw_index.get(&raw_vertex) {
                Some(&vertex) => vertex,
                None => {
                    let position = *bsp.vertex(raw_vertex as usize)?;
                    let vertex = mesh.create_vertex(position);
                    vertex_by_raw_index.insert(raw_vertex, vertex);
                    vertex
                }
            };

            let instance = mesh.create_vertex_instance(vertex);
            let position = mesh[vertex].position;
            mesh[instance].uv = Vector2::new(
                (tex_u.dot(&position.coords) + tex_u_offset) / tex_data.width as Real,
                (tex_v.dot(&position.coords) + tex_v_offset) / tex_data.height as Real,
            );
            perimeter.push(instance);
        }

        if perimeter.len() > 2 {
            let polygon = mesh.create_polygon(group, perimeter);
            face_by_polygon.insert(polygon, face_index);
            created.push((polygon, face_index));
        } else {
            dropped_degenerate += 1;
        }
    }

    // Pass 2: set smoothing groups
    for &(polygon, face_index) in &created {
        let face = bsp.face(face_index as usize)?;
        let edges: Vec<_> = mesh[polygon].edges().to_vec();
        for edge in edges {
            let others: Vec<_> = mesh[edge]
                .connected_polygons()
                .iter()
                .copied()
                .filter(|&other| other != polygon)
                .collect();
            for other in others {
                let Some(&other_face_index) = face_by_polygon.get(&other) else {
                    continue;
                };
                let other_face = bsp.face(other_face_index as usize)?;
                let is_hard =
                    !shares_smoothing_group(face.smoothing_groups, other_face.smoothing_groups);
                mesh[edge].hard = is_hard;
                mesh[edge].crease_sharpness = if is_hard { 1.0 } else { 0.0 };
            }
        }
    }

    if skipped_tool_faces > 0 || dropped_degenerate > 0 {
        debug!(
            "face build: {} tool faces skipped, {} degenerate faces dropped",
            skipped_tool_faces, dropped_degenerate
        );
    }

    mesh.compute_normals_and_tangents();
    mesh.triangulate();
    Ok(())
}
