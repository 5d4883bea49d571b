//! Decomposes raw triangle soups into convex collision hulls.
//!
//! Corner positions are welded into a deduplicated vertex list, triangles are
//! flood-filled into connectivity groups (two triangles sharing any welded
//! vertex are connected, an edge is not required), and each group runs through
//! a space-partition build whose solid cells become convex hulls. Hulls from
//! all groups accumulate into the same collision body, one batched sink call
//! per group.

use crate::errors::BspError;
use crate::float_types::{Real, WELD_EPSILON, parry3d::bounding_volume::Aabb};
use crate::mesh::clean::positions_equal;
use hashbrown::HashMap;
use log::debug;
use nalgebra::Point3;

pub mod bsp;

use bsp::{HullPolygon, Node, extract_convex_cells};

/// One convex piece of a decomposed body: a triangulated hull.
#[derive(Debug, Clone)]
pub struct ConvexHull {
    pub vertices: Vec<Point3<Real>>,
    pub indices: Vec<[u32; 3]>,
}

/// Consumer of finished hull batches. Called once per connectivity group;
/// hulls from successive calls accumulate into the same body.
pub trait CollisionSink {
    fn submit_hulls(&mut self, hulls: &[ConvexHull]);
}

struct ConnectivityVertex {
    position: Point3<Real>,
    /// Indices of every triangle incident to this vertex.
    triangles: Vec<usize>,
}

struct ConnectivityTriangle {
    vertices: [usize; 3],
    group: Option<usize>,
}

/// Transient welded-vertex connectivity graph over a triangle soup.
#[derive(Default)]
pub struct ConnectivityBuilder {
    vertices: Vec<ConnectivityVertex>,
    triangles: Vec<ConnectivityTriangle>,
    /// Quantized-position cells for near-constant-time welding.
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
}

fn weld_cell(position: &Point3<Real>) -> (i64, i64, i64) {
    (
        (position.x / WELD_EPSILON).floor() as i64,
        (position.y / WELD_EPSILON).floor() as i64,
        (position.z / WELD_EPSILON).floor() as i64,
    )
}

impl ConnectivityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Welded vertex indices of a triangle.
    pub fn triangle(&self, index: usize) -> [usize; 3] {
        self.triangles[index].vertices
    }

    pub fn vertex_position(&self, index: usize) -> Point3<Real> {
        self.vertices[index].position
    }

    /// Find the welded vertex for `position`, adding one if nothing lies
    /// within [`WELD_EPSILON`].
    pub fn add_vertex(&mut self, position: Point3<Real>) -> usize {
        let (cx, cy, cz) = weld_cell(&position);
        for x in (cx - 1)..=(cx + 1) {
            for y in (cy - 1)..=(cy + 1) {
                for z in (cz - 1)..=(cz + 1) {
                    let Some(bucket) = self.cells.get(&(x, y, z)) else {
                        continue;
                    };
                    for &candidate in bucket {
                        if positions_equal(
                            self.vertices[candidate].position,
                            position,
                            WELD_EPSILON,
                        ) {
                            return candidate;
                        }
                    }
                }
            }
        }

        let index = self.vertices.len();
        self.vertices.push(ConnectivityVertex {
            position,
            triangles: Vec::new(),
        });
        self.cells.entry((cx, cy, cz)).or_default().push(index);
        index
    }

    /// Add a triangle, welding its corners. Returns `None` (and records
    /// nothing) when two corners weld to the same vertex.
    pub fn add_triangle(
        &mut self,
        a: Point3<Real>,
        b: Point3<Real>,
        c: Point3<Real>,
    ) -> Option<usize> {
        let vertex_a = self.add_vertex(a);
        let vertex_b = self.add_vertex(b);
        let vertex_c = self.add_vertex(c);

        if vertex_a == vertex_b || vertex_b == vertex_c || vertex_c == vertex_a {
            return None;
        }

        let index = self.triangles.len();
        self.vertices[vertex_a].triangles.push(index);
        self.vertices[vertex_b].triangles.push(index);
        self.vertices[vertex_c].triangles.push(index);
        self.triangles.push(ConnectivityTriangle {
            vertices: [vertex_a, vertex_b, vertex_c],
            group: None,
        });
        Some(index)
    }

    /// Partition the triangles into connected components under vertex
    /// adjacency. Returns each group's triangle indices in flood order.
    pub fn create_connectivity_groups(&mut self) -> Vec<Vec<usize>> {
        for triangle in &mut self.triangles {
            triangle.group = None;
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        loop {
            // Find first triangle without group assignment
            let Some(seed) = self.triangles.iter().position(|t| t.group.is_none()) else {
                break;
            };

            let group_index = groups.len();
            groups.push(Vec::new());
            self.flood_fill_group(seed, group_index, &mut groups[group_index]);
        }
        groups
    }

    fn flood_fill_group(&mut self, seed: usize, group: usize, members: &mut Vec<usize>) {
        let mut stack = vec![seed];
        self.triangles[seed].group = Some(group);

        while let Some(triangle_index) = stack.pop() {
            members.push(triangle_index);
            let corners = self.triangles[triangle_index].vertices;
            for vertex_index in corners {
                for i in 0..self.vertices[vertex_index].triangles.len() {
                    let other_index = self.vertices[vertex_index].triangles[i];
                    if self.triangles[other_index].group.is_none() {
                        self.triangles[other_index].group = Some(group);
                        stack.push(other_index);
                    }
                }
            }
        }
    }
}

/// Decompose a flat triangle soup into convex hulls, handing one hull batch per
/// connectivity group to `sink`. Returns the total number of hulls produced.
///
/// `face_indices` holds index triples into `positions`; corners are taken in
/// reversed order, flipping the source winding for collision use.
pub fn decompose_triangle_soup<S: CollisionSink>(
    positions: &[Point3<Real>],
    face_indices: &[u32],
    sink: &mut S,
) -> Result<usize, BspError> {
    let position = |index: u32| -> Result<Point3<Real>, BspError> {
        positions
            .get(index as usize)
            .copied()
            .ok_or(BspError::IndexOutOfRange {
                kind: "collision-vertex",
                index: index as usize,
                len: positions.len(),
            })
    };

    let mut builder = ConnectivityBuilder::new();
    for triple in face_indices.chunks_exact(3) {
        let a = position(triple[2])?;
        let b = position(triple[1])?;
        let c = position(triple[0])?;
        let _ = builder.add_triangle(a, b, c);
    }

    let groups = builder.create_connectivity_groups();
    debug!(
        "collision soup: {} welded vertices, {} triangles, {} connectivity groups",
        builder.vertex_count(),
        builder.triangle_count(),
        groups.len()
    );

    let mut total_hulls = 0;
    for group in &groups {
        // Generate one partition polygon per group triangle
        let mut polygons: Vec<HullPolygon> = Vec::with_capacity(group.len());
        for (ordinal, &triangle_index) in group.iter().enumerate() {
            let corners = builder.triangle(triangle_index);
            let triangle = [
                builder.vertex_position(corners[0]),
                builder.vertex_position(corners[1]),
                builder.vertex_position(corners[2]),
            ];
            if let Some(polygon) = HullPolygon::from_triangle(triangle, ordinal / 3) {
                polygons.push(polygon);
            }
        }
        if polygons.is_empty() {
            continue;
        }

        let bounds = group_bounds(&polygons);
        let node = Node::from_polygons(&polygons);
        let cells = extract_convex_cells(&node, &bounds);

        let hulls: Vec<ConvexHull> = cells
            .iter()
            .filter_map(|cell| hull_from_points(cell))
            .collect();
        if hulls.is_empty() {
            continue;
        }
        debug!("connectivity group: {} convex hulls from {} cells", hulls.len(), cells.len());
        total_hulls += hulls.len();
        sink.submit_hulls(&hulls);
    }
    Ok(total_hulls)
}

fn group_bounds(polygons: &[HullPolygon]) -> Aabb {
    let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
    let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
    for polygon in polygons {
        for vertex in &polygon.vertices {
            mins.x = mins.x.min(vertex.x);
            mins.y = mins.y.min(vertex.y);
            mins.z = mins.z.min(vertex.z);
            maxs.x = maxs.x.max(vertex.x);
            maxs.y = maxs.y.max(vertex.y);
            maxs.z = maxs.z.max(vertex.z);
        }
    }
    Aabb::new(mins, maxs)
}

/// Convex hull of a cell's corner set, or `None` when the points are too
/// degenerate to enclose a volume.
fn hull_from_points(points: &[Point3<Real>]) -> Option<ConvexHull> {
    if points.len() < 4 {
        return None;
    }
    let rows: Vec<Vec<Real>> = points.iter().map(|p| vec![p.x, p.y, p.z]).collect();

    use chull::ConvexHullWrapper;
    let hull = ConvexHullWrapper::try_new(&rows, None).ok()?;
    let (hull_vertices, hull_indices) = hull.vertices_indices();

    let vertices = hull_vertices
        .iter()
        .map(|v| Point3::new(v[0], v[1], v[2]))
        .collect();
    let indices = hull_indices
        .chunks_exact(3)
        .map(|triangle| [triangle[0] as u32, triangle[1] as u32, triangle[2] as u32])
        .collect();
    Some(ConvexHull { vertices, indices })
}
