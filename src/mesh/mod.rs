//! The topological working mesh built from gathered faces and mutated in place
//! by the clip and clean passes.
//!
//! A [`MeshDescription`] holds five element kinds: vertices, vertex instances
//! (per-polygon-corner data), edges, polygons, and polygon groups (one per
//! material). Every element has a stable id within a build; deletion leaves a
//! vacant slot so ids stay valid until [`MeshDescription::compact`] renumbers
//! everything into a dense index space.
//!
//! The attribute schema is fixed per element kind: vertex position; instance
//! normal/tangent/uv/color; edge hardness and crease sharpness; group material
//! name. That is every attribute this pipeline touches, so there is no dynamic
//! attribute lookup anywhere.

use crate::float_types::Real;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector2, Vector3, Vector4};
use std::ops::{Index, IndexMut};

pub mod attributes;
pub mod build;
pub mod clean;
pub mod clip;

/// Stable identity of a mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(usize);

/// Stable identity of a vertex instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexInstanceId(usize);

/// Stable identity of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

/// Stable identity of a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolygonId(usize);

/// Stable identity of a polygon group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolygonGroupId(usize);

impl VertexId {
    /// Raw index; dense only after [`MeshDescription::compact`].
    pub const fn index(self) -> usize {
        self.0
    }
}

impl VertexInstanceId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl EdgeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl PolygonId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl PolygonGroupId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A point in space owning zero or more vertex instances.
#[derive(Debug, Clone)]
pub struct MeshVertex {
    pub position: Point3<Real>,
    instances: Vec<VertexInstanceId>,
}

impl MeshVertex {
    pub fn instances(&self) -> &[VertexInstanceId] {
        &self.instances
    }
}

/// Per-polygon-corner data, belonging to exactly one vertex.
#[derive(Debug, Clone)]
pub struct MeshVertexInstance {
    vertex: VertexId,
    pub normal: Vector3<Real>,
    pub tangent: Vector3<Real>,
    pub uv: Vector2<Real>,
    pub color: Vector4<Real>,
    connected_polygons: Vec<PolygonId>,
}

impl MeshVertexInstance {
    pub const fn vertex(&self) -> VertexId {
        self.vertex
    }

    pub fn connected_polygons(&self) -> &[PolygonId] {
        &self.connected_polygons
    }
}

/// A vertex pair shared by the polygons whose perimeters traverse it.
#[derive(Debug, Clone)]
pub struct MeshEdge {
    vertices: [VertexId; 2],
    pub hard: bool,
    pub crease_sharpness: Real,
    connected_polygons: Vec<PolygonId>,
}

impl MeshEdge {
    pub const fn vertices(&self) -> [VertexId; 2] {
        self.vertices
    }

    pub fn connected_polygons(&self) -> &[PolygonId] {
        &self.connected_polygons
    }
}

/// An ordered perimeter contour of vertex instances plus its triangulation.
#[derive(Debug, Clone)]
pub struct MeshPolygon {
    perimeter: Vec<VertexInstanceId>,
    edges: Vec<EdgeId>,
    triangles: Vec<[VertexInstanceId; 3]>,
    group: PolygonGroupId,
}

impl MeshPolygon {
    pub fn perimeter(&self) -> &[VertexInstanceId] {
        &self.perimeter
    }

    /// Perimeter edges, in contour order.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Filled by [`MeshDescription::triangulate`]; empty until then.
    pub fn triangles(&self) -> &[[VertexInstanceId; 3]] {
        &self.triangles
    }

    pub const fn group(&self) -> PolygonGroupId {
        self.group
    }
}

/// All polygons sharing one material identity.
#[derive(Debug, Clone)]
pub struct MeshPolygonGroup {
    material: String,
    polygons: Vec<PolygonId>,
}

impl MeshPolygonGroup {
    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn polygons(&self) -> &[PolygonId] {
        &self.polygons
    }
}

/// The working mesh. See the module docs for the element model.
#[derive(Debug, Clone, Default)]
pub struct MeshDescription {
    vertices: Vec<Option<MeshVertex>>,
    instances: Vec<Option<MeshVertexInstance>>,
    edges: Vec<Option<MeshEdge>>,
    polygons: Vec<Option<MeshPolygon>>,
    groups: Vec<Option<MeshPolygonGroup>>,
    /// Canonical (low, high) vertex pair to live edge.
    edge_map: HashMap<(VertexId, VertexId), EdgeId>,
}

fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl MeshDescription {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- creation -----

    pub fn create_vertex(&mut self, position: Point3<Real>) -> VertexId {
        self.vertices.push(Some(MeshVertex {
            position,
            instances: Vec::new(),
        }));
        VertexId(self.vertices.len() - 1)
    }

    /// Create a vertex instance on `vertex` with default attributes
    /// (zero normal/tangent/uv, white color).
    pub fn create_vertex_instance(&mut self, vertex: VertexId) -> VertexInstanceId {
        let id = VertexInstanceId(self.instances.len());
        self.instances.push(Some(MeshVertexInstance {
            vertex,
            normal: Vector3::zeros(),
            tangent: Vector3::zeros(),
            uv: Vector2::zeros(),
            color: Vector4::new(1.0, 1.0, 1.0, 1.0),
            connected_polygons: Vec::new(),
        }));
        self[vertex].instances.push(id);
        id
    }

    /// Get the group for `material`, creating it on first use. Group identity is
    /// 1:1 with distinct material names within one build.
    pub fn find_or_create_polygon_group(&mut self, material: &str) -> PolygonGroupId {
        if let Some(id) = self.group_ids().find(|&id| self[id].material == material) {
            return id;
        }
        self.groups.push(Some(MeshPolygonGroup {
            material: material.to_string(),
            polygons: Vec::new(),
        }));
        PolygonGroupId(self.groups.len() - 1)
    }

    /// Create a polygon from an ordered perimeter contour of ≥3 vertex
    /// instances, creating and linking its perimeter edges.
    pub fn create_polygon(
        &mut self,
        group: PolygonGroupId,
        perimeter: Vec<VertexInstanceId>,
    ) -> PolygonId {
        debug_assert!(perimeter.len() >= 3, "polygon needs at least 3 vertex instances");
        let id = PolygonId(self.polygons.len());
        self.polygons.push(None);
        self.link_polygon(id, group, perimeter);
        id
    }

    /// Re-create a polygon at a previously deleted id, preserving its identity.
    pub fn recreate_polygon(
        &mut self,
        id: PolygonId,
        group: PolygonGroupId,
        perimeter: Vec<VertexInstanceId>,
    ) {
        debug_assert!(self.polygons[id.0].is_none(), "polygon id still occupied");
        self.link_polygon(id, group, perimeter);
    }

    fn link_polygon(&mut self, id: PolygonId, group: PolygonGroupId, perimeter: Vec<VertexInstanceId>) {
        let mut edges = Vec::with_capacity(perimeter.len());
        for i in 0..perimeter.len() {
            let a = self[perimeter[i]].vertex;
            let b = self[perimeter[(i + 1) % perimeter.len()]].vertex;
            let edge = self.find_or_create_edge(a, b);
            self[edge].connected_polygons.push(id);
            edges.push(edge);
        }
        for &instance in &perimeter {
            self[instance].connected_polygons.push(id);
        }
        self[group].polygons.push(id);
        self.polygons[id.0] = Some(MeshPolygon {
            perimeter,
            edges,
            triangles: Vec::new(),
            group,
        });
    }

    fn find_or_create_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let key = edge_key(a, b);
        if let Some(&edge) = self.edge_map.get(&key) {
            return edge;
        }
        let id = EdgeId(self.edges.len());
        self.edges.push(Some(MeshEdge {
            vertices: [a, b],
            hard: false,
            crease_sharpness: 0.0,
            connected_polygons: Vec::new(),
        }));
        self.edge_map.insert(key, id);
        id
    }

    // ----- deletion -----

    /// Unlink and delete a polygon. Its edges and vertex instances survive
    /// (possibly unreferenced) until the next cleanup pass.
    pub fn delete_polygon(&mut self, id: PolygonId) {
        let polygon = self.polygons[id.0].take().expect("stale polygon id");
        for &edge in &polygon.edges {
            self[edge].connected_polygons.retain(|&p| p != id);
        }
        for &instance in &polygon.perimeter {
            self[instance].connected_polygons.retain(|&p| p != id);
        }
        self[polygon.group].polygons.retain(|&p| p != id);
    }

    /// Delete an edge with no connected polygons.
    pub fn delete_edge(&mut self, id: EdgeId) {
        let edge = self.edges[id.0].take().expect("stale edge id");
        debug_assert!(edge.connected_polygons.is_empty(), "edge still referenced");
        self.edge_map.remove(&edge_key(edge.vertices[0], edge.vertices[1]));
    }

    /// Delete a vertex instance with no connected polygons.
    pub fn delete_vertex_instance(&mut self, id: VertexInstanceId) {
        let instance = self.instances[id.0].take().expect("stale vertex instance id");
        debug_assert!(instance.connected_polygons.is_empty(), "instance still referenced");
        self[instance.vertex].instances.retain(|&i| i != id);
    }

    /// Delete a vertex with no remaining instances.
    pub fn delete_vertex(&mut self, id: VertexId) {
        let vertex = self.vertices[id.0].take().expect("stale vertex id");
        debug_assert!(vertex.instances.is_empty(), "vertex still referenced");
    }

    /// Delete a polygon group with no remaining polygons.
    pub fn delete_polygon_group(&mut self, id: PolygonGroupId) {
        let group = self.groups[id.0].take().expect("stale polygon group id");
        debug_assert!(group.polygons.is_empty(), "group still referenced");
    }

    // ----- queries -----

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().flatten().count()
    }

    pub fn vertex_instance_count(&self) -> usize {
        self.instances.iter().flatten().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.iter().flatten().count()
    }

    pub fn polygon_group_count(&self) -> usize {
        self.groups.iter().flatten().count()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| VertexId(i))
    }

    pub fn vertex_instance_ids(&self) -> impl Iterator<Item = VertexInstanceId> + '_ {
        self.instances
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| VertexInstanceId(i))
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| EdgeId(i))
    }

    pub fn polygon_ids(&self) -> impl Iterator<Item = PolygonId> + '_ {
        self.polygons
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| PolygonId(i))
    }

    pub fn group_ids(&self) -> impl Iterator<Item = PolygonGroupId> + '_ {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| PolygonGroupId(i))
    }

    /// Position of the vertex under a vertex instance.
    pub fn instance_position(&self, instance: VertexInstanceId) -> Point3<Real> {
        self[self[instance].vertex].position
    }

    /// The live edge between two vertices, if any.
    pub fn vertex_pair_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_map.get(&edge_key(a, b)).copied()
    }

    // ----- compaction -----

    /// Renumber every element into a dense index space, preserving relative
    /// order. All previously handed-out ids are invalidated.
    pub fn compact(&mut self) {
        let vertex_remap = build_remap(&self.vertices);
        let instance_remap = build_remap(&self.instances);
        let edge_remap = build_remap(&self.edges);
        let polygon_remap = build_remap(&self.polygons);
        let group_remap = build_remap(&self.groups);

        self.vertices = std::mem::take(&mut self.vertices)
            .into_iter()
            .flatten()
            .map(|mut vertex| {
                for id in &mut vertex.instances {
                    *id = VertexInstanceId(instance_remap[id.0]);
                }
                Some(vertex)
            })
            .collect();

        self.instances = std::mem::take(&mut self.instances)
            .into_iter()
            .flatten()
            .map(|mut instance| {
                instance.vertex = VertexId(vertex_remap[instance.vertex.0]);
                for id in &mut instance.connected_polygons {
                    *id = PolygonId(polygon_remap[id.0]);
                }
                Some(instance)
            })
            .collect();

        self.edges = std::mem::take(&mut self.edges)
            .into_iter()
            .flatten()
            .map(|mut edge| {
                for vertex in &mut edge.vertices {
                    *vertex = VertexId(vertex_remap[vertex.0]);
                }
                for id in &mut edge.connected_polygons {
                    *id = PolygonId(polygon_remap[id.0]);
                }
                Some(edge)
            })
            .collect();

        self.polygons = std::mem::take(&mut self.polygons)
            .into_iter()
            .flatten()
            .map(|mut polygon| {
                for id in &mut polygon.perimeter {
                    *id = VertexInstanceId(instance_remap[id.0]);
                }
                for id in &mut polygon.edges {
                    *id = EdgeId(edge_remap[id.0]);
                }
                for triangle in &mut polygon.triangles {
                    for id in triangle {
                        *id = VertexInstanceId(instance_remap[id.0]);
                    }
                }
                polygon.group = PolygonGroupId(group_remap[polygon.group.0]);
                Some(polygon)
            })
            .collect();

        self.groups = std::mem::take(&mut self.groups)
            .into_iter()
            .flatten()
            .map(|mut group| {
                for id in &mut group.polygons {
                    *id = PolygonId(polygon_remap[id.0]);
                }
                Some(group)
            })
            .collect();

        self.edge_map = self
            .edges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref()
                    .map(|edge| (edge_key(edge.vertices[0], edge.vertices[1]), EdgeId(i)))
            })
            .collect();
    }
}

/// Old-slot to new-dense-index table; dead slots keep a placeholder that must
/// never be read.
fn build_remap<T>(slots: &[Option<T>]) -> Vec<usize> {
    let mut remap = vec![usize::MAX; slots.len()];
    let mut next = 0;
    for (i, slot) in slots.iter().enumerate() {
        if slot.is_some() {
            remap[i] = next;
            next += 1;
        }
    }
    remap
}

impl Index<VertexId> for MeshDescription {
    type Output = MeshVertex;

    fn index(&self, id: VertexId) -> &MeshVertex {
        self.vertices[id.0].as_ref().expect("stale vertex id")
    }
}

impl IndexMut<VertexId> for MeshDescription {
    fn index_mut(&mut self, id: VertexId) -> &mut MeshVertex {
        self.vertices[id.0].as_mut().expect("stale vertex id")
    }
}

impl Index<VertexInstanceId> for MeshDescription {
    type Output = MeshVertexInstance;

    fn index(&self, id: VertexInstanceId) -> &MeshVertexInstance {
        self.instances[id.0].as_ref().expect("stale vertex instance id")
    }
}

impl IndexMut<VertexInstanceId> for MeshDescription {
    fn index_mut(&mut self, id: VertexInstanceId) -> &mut MeshVertexInstance {
        self.instances[id.0].as_mut().expect("stale vertex instance id")
    }
}

impl Index<EdgeId> for MeshDescription {
    type Output = MeshEdge;

    fn index(&self, id: EdgeId) -> &MeshEdge {
        self.edges[id.0].as_ref().expect("stale edge id")
    }
}

impl IndexMut<EdgeId> for MeshDescription {
    fn index_mut(&mut self, id: EdgeId) -> &mut MeshEdge {
        self.edges[id.0].as_mut().expect("stale edge id")
    }
}

impl Index<PolygonId> for MeshDescription {
    type Output = MeshPolygon;

    fn index(&self, id: PolygonId) -> &MeshPolygon {
        self.polygons[id.0].as_ref().expect("stale polygon id")
    }
}

impl IndexMut<PolygonId> for MeshDescription {
    fn index_mut(&mut self, id: PolygonId) -> &mut MeshPolygon {
        self.polygons[id.0].as_mut().expect("stale polygon id")
    }
}

impl Index<PolygonGroupId> for MeshDescription {
    type Output = MeshPolygonGroup;

    fn index(&self, id: PolygonGroupId) -> &MeshPolygonGroup {
        self.groups[id.0].as_ref().expect("stale polygon group id")
    }
}

impl IndexMut<PolygonGroupId> for MeshDescription {
    fn index_mut(&mut self, id: PolygonGroupId) -> &mut MeshPolygonGroup {
        self.groups[id.0].as_mut().expect("stale polygon group id")
    }
}
