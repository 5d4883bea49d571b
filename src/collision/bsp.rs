//! Space-partition build over a connectivity group's polygons and extraction of
//! the solid convex cells the partition encloses.
//!
//! The tree splits the polygon set plane-by-plane until every region is
//! homogeneous. Polygons are wound with outward normals, so a region whose back
//! branch was never subdivided further is interior solid space; each such
//! region, intersected with the group's bounding box, is one convex cell of the
//! decomposition.

use crate::float_types::{EPSILON, Real, parry3d::bounding_volume::Aabb};
use crate::float_types::parry3d::bounding_volume::BoundingVolume;
use crate::mesh::clip::ClipPlane;
use nalgebra::{Matrix3, Point3, Vector3};

pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// Slack applied when testing whether a candidate cell corner satisfies every
/// half-space; corners lie exactly on three of the planes.
const CELL_SLACK: Real = 1e-3;

/// One polygon of the partition input: a position loop, its plane, and the
/// link id tying it back to the source triangle batch.
#[derive(Debug, Clone)]
pub struct HullPolygon {
    pub vertices: Vec<Point3<Real>>,
    pub plane: ClipPlane,
    pub link: usize,
}

impl HullPolygon {
    /// Build from a triangle, or `None` when the corners are collinear.
    pub fn from_triangle(corners: [Point3<Real>; 3], link: usize) -> Option<Self> {
        let normal = (corners[1] - corners[0]).cross(&(corners[2] - corners[0]));
        if normal.norm_squared() <= EPSILON * EPSILON {
            return None;
        }
        let normal = normal.normalize();
        let plane = ClipPlane::from_normal(normal, normal.dot(&corners[0].coords));
        Some(HullPolygon {
            vertices: corners.to_vec(),
            plane,
            link,
        })
    }
}

fn orient_point(plane: &ClipPlane, point: &Point3<Real>) -> i8 {
    let distance = plane.plane_dot(point);
    if distance > EPSILON {
        FRONT
    } else if distance < -EPSILON {
        BACK
    } else {
        COPLANAR
    }
}

fn classify_polygon(plane: &ClipPlane, polygon: &HullPolygon) -> i8 {
    polygon
        .vertices
        .iter()
        .fold(0, |acc, vertex| acc | orient_point(plane, vertex))
}

/// Splits a polygon by a plane into `(coplanar_front, coplanar_back, front, back)`.
#[allow(clippy::type_complexity)]
fn split_polygon(
    plane: &ClipPlane,
    polygon: &HullPolygon,
) -> (
    Vec<HullPolygon>,
    Vec<HullPolygon>,
    Vec<HullPolygon>,
    Vec<HullPolygon>,
) {
    let mut coplanar_front = Vec::new();
    let mut coplanar_back = Vec::new();
    let mut front = Vec::new();
    let mut back = Vec::new();

    let types: Vec<i8> = polygon
        .vertices
        .iter()
        .map(|vertex| orient_point(plane, vertex))
        .collect();
    let polygon_type = types.iter().fold(0, |acc, &t| acc | t);

    match polygon_type {
        COPLANAR => {
            if plane.normal.dot(&polygon.plane.normal) > 0.0 {
                coplanar_front.push(polygon.clone());
            } else {
                coplanar_back.push(polygon.clone());
            }
        }
        FRONT => front.push(polygon.clone()),
        BACK => back.push(polygon.clone()),
        _ => {
            let mut split_front = Vec::new();
            let mut split_back = Vec::new();
            for i in 0..polygon.vertices.len() {
                let j = (i + 1) % polygon.vertices.len();
                let type_i = types[i];
                let type_j = types[j];
                let vertex_i = polygon.vertices[i];
                let vertex_j = polygon.vertices[j];

                if type_i != BACK {
                    split_front.push(vertex_i);
                }
                if type_i != FRONT {
                    split_back.push(vertex_i);
                }
                if (type_i | type_j) == SPANNING {
                    let denominator = plane.normal.dot(&(vertex_j - vertex_i));
                    if denominator.abs() > EPSILON {
                        let t = (plane.distance - plane.normal.dot(&vertex_i.coords))
                            / denominator;
                        let intersection = vertex_i + (vertex_j - vertex_i) * t;
                        split_front.push(intersection);
                        split_back.push(intersection);
                    }
                }
            }
            if split_front.len() >= 3 {
                front.push(HullPolygon {
                    vertices: split_front,
                    plane: polygon.plane.clone(),
                    link: polygon.link,
                });
            }
            if split_back.len() >= 3 {
                back.push(HullPolygon {
                    vertices: split_back,
                    plane: polygon.plane.clone(),
                    link: polygon.link,
                });
            }
        }
    }

    (coplanar_front, coplanar_back, front, back)
}

/// A space-partition node, containing coplanar polygons plus optional
/// front/back subtrees.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub plane: Option<ClipPlane>,
    pub front: Option<Box<Node>>,
    pub back: Option<Box<Node>>,
    pub polygons: Vec<HullPolygon>,
}

impl Node {
    pub const fn new() -> Self {
        Node {
            plane: None,
            front: None,
            back: None,
            polygons: Vec::new(),
        }
    }

    pub fn from_polygons(polygons: &[HullPolygon]) -> Self {
        let mut node = Self::new();
        if !polygons.is_empty() {
            node.build(polygons);
        }
        node
    }

    fn pick_best_splitting_plane(polygons: &[HullPolygon]) -> ClipPlane {
        const K_SPANS: Real = 8.0; // Weight for spanning polygons
        const K_BALANCE: Real = 1.0; // Weight for front/back balance

        let mut best_plane = polygons[0].plane.clone();
        let mut best_score = Real::MAX;

        // Take a sample of polygons as candidate planes
        let sample_size = polygons.len().min(20);
        for candidate in polygons.iter().take(sample_size) {
            let plane = &candidate.plane;
            let mut num_front = 0i32;
            let mut num_back = 0i32;
            let mut num_spanning = 0i32;

            for polygon in polygons {
                match classify_polygon(plane, polygon) {
                    COPLANAR => {} // Not counted for balance
                    FRONT => num_front += 1,
                    BACK => num_back += 1,
                    _ => num_spanning += 1,
                }
            }

            let score = K_SPANS * num_spanning as Real
                + K_BALANCE * ((num_front - num_back) as Real).abs();
            if score < best_score {
                best_score = score;
                best_plane = plane.clone();
            }
        }
        best_plane
    }

    /// Build the partition from the given polygons with an explicit stack.
    pub fn build(&mut self, polygons: &[HullPolygon]) {
        if polygons.is_empty() {
            return;
        }

        let mut stack = vec![(self, polygons.to_vec())];
        while let Some((node, polys)) = stack.pop() {
            if polys.is_empty() {
                continue;
            }

            if node.plane.is_none() {
                node.plane = Some(Self::pick_best_splitting_plane(&polys));
            }
            let plane = node.plane.clone().expect("plane just assigned");

            let mut front = Vec::with_capacity(polys.len() / 2);
            let mut back = Vec::with_capacity(polys.len() / 2);

            for polygon in &polys {
                let (coplanar_front, coplanar_back, mut front_parts, mut back_parts) =
                    split_polygon(&plane, polygon);
                node.polygons.extend(coplanar_front);
                node.polygons.extend(coplanar_back);
                front.append(&mut front_parts);
                back.append(&mut back_parts);
            }

            if !front.is_empty() {
                let front_node: &mut Node =
                    node.front.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((front_node, front));
            }
            if !back.is_empty() {
                let back_node: &mut Node =
                    node.back.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((back_node, back));
            }
        }
    }
}

/// Inward-facing boundary planes of a bounding box.
fn box_planes(bounds: &Aabb) -> [ClipPlane; 6] {
    [
        ClipPlane::new(bounds.mins, Vector3::x()),
        ClipPlane::new(bounds.maxs, -Vector3::x()),
        ClipPlane::new(bounds.mins, Vector3::y()),
        ClipPlane::new(bounds.maxs, -Vector3::y()),
        ClipPlane::new(bounds.mins, Vector3::z()),
        ClipPlane::new(bounds.maxs, -Vector3::z()),
    ]
}

/// Corner candidates of the convex region bounded by `half_spaces`: every
/// intersection of three planes that satisfies all of them.
fn cell_points(half_spaces: &[ClipPlane]) -> Vec<Point3<Real>> {
    let mut points: Vec<Point3<Real>> = Vec::new();
    for i in 0..half_spaces.len() {
        for j in (i + 1)..half_spaces.len() {
            for k in (j + 1)..half_spaces.len() {
                let rows = [&half_spaces[i], &half_spaces[j], &half_spaces[k]];
                let matrix = Matrix3::from_rows(&[
                    rows[0].normal.transpose(),
                    rows[1].normal.transpose(),
                    rows[2].normal.transpose(),
                ]);
                let Some(inverse) = matrix.try_inverse() else {
                    continue;
                };
                let corner = Point3::from(
                    inverse
                        * Vector3::new(rows[0].distance, rows[1].distance, rows[2].distance),
                );
                if !corner.coords.iter().all(|c| c.is_finite()) {
                    continue;
                }
                if half_spaces
                    .iter()
                    .all(|plane| plane.plane_dot(&corner) >= -CELL_SLACK)
                    && !points
                        .iter()
                        .any(|existing| (existing - corner).norm_squared() <= EPSILON * EPSILON)
                {
                    points.push(corner);
                }
            }
        }
    }
    points
}

/// Walk the partition and realize one convex point cell per solid region,
/// bounded by the accumulated half-space chain and the (slightly inflated)
/// group bounding box.
pub fn extract_convex_cells(root: &Node, bounds: &Aabb) -> Vec<Vec<Point3<Real>>> {
    let bounds = bounds.loosened(1.0);
    let boundary = box_planes(&bounds);

    let mut cells = Vec::new();
    let mut stack: Vec<(&Node, Vec<ClipPlane>)> = vec![(root, Vec::new())];
    while let Some((node, chain)) = stack.pop() {
        let Some(plane) = &node.plane else {
            continue;
        };

        let mut front_chain = chain.clone();
        front_chain.push(plane.clone());
        if let Some(front) = &node.front {
            stack.push((front, front_chain));
        }

        let mut back_chain = chain;
        back_chain.push(plane.flipped());
        match &node.back {
            Some(back) => stack.push((back, back_chain)),
            None => {
                // Solid region: close it with the box and realize its corners.
                back_chain.extend(boundary.iter().cloned());
                let points = cell_points(&back_chain);
                if points.len() >= 4 {
                    cells.push(points);
                }
            }
        }
    }
    cells
}
