//! Derived vertex-instance attributes and polygon triangulation.
//!
//! Normals come from Newell's method per polygon, averaged onto each instance
//! over its connected polygons. Tangents follow the UV gradient of a connected
//! polygon, orthonormalized against the instance normal. Triangulation projects
//! each contour into its plane and ear-cuts it (or runs a constrained Delaunay
//! triangulation under the `delaunay` feature), falling back to a fan when the
//! 2D triangulation cannot be mapped back onto the contour.

use crate::float_types::{EPSILON, Real};
use crate::mesh::{MeshDescription, PolygonId, VertexInstanceId};
use geo::{Coord, LineString, Polygon as GeoPolygon};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

/// Newell's method over an ordered position loop; zero for degenerate loops.
fn newell_normal(positions: &[Point3<Real>]) -> Vector3<Real> {
    let normal = positions
        .iter()
        .zip(positions.iter().cycle().skip(1))
        .fold(Vector3::zeros(), |acc, (current, next)| {
            acc + (current - Point3::origin()).cross(&(next - Point3::origin()))
        });
    if normal.norm_squared() > EPSILON * EPSILON {
        normal.normalize()
    } else {
        Vector3::zeros()
    }
}

/// Unit vector perpendicular to `normal`.
fn any_perpendicular(normal: &Vector3<Real>) -> Vector3<Real> {
    let mut u = if normal.z.abs() > normal.x.abs() || normal.z.abs() > normal.y.abs() {
        // normal is closer to ±Z ⇒ cross with X
        Vector3::x().cross(normal)
    } else {
        // otherwise cross with Z
        Vector3::z().cross(normal)
    };
    u.normalize_mut();
    u
}

impl MeshDescription {
    /// Compute per-instance normals and tangents from the connected polygons.
    pub fn compute_normals_and_tangents(&mut self) {
        let mut polygon_frames: HashMap<PolygonId, (Vector3<Real>, Vector3<Real>)> =
            HashMap::new();

        for polygon in self.polygon_ids().collect::<Vec<_>>() {
            let positions: Vec<_> = self[polygon]
                .perimeter()
                .iter()
                .map(|&instance| self.instance_position(instance))
                .collect();
            let normal = newell_normal(&positions);
            if normal == Vector3::zeros() {
                continue;
            }
            let tangent = self.polygon_uv_tangent(polygon, &normal);
            polygon_frames.insert(polygon, (normal, tangent));
        }

        for instance in self.vertex_instance_ids().collect::<Vec<_>>() {
            let mut normal_sum = Vector3::zeros();
            let mut tangent_sum = Vector3::zeros();
            for polygon in self[instance].connected_polygons() {
                if let Some((normal, tangent)) = polygon_frames.get(polygon) {
                    normal_sum += normal;
                    tangent_sum += tangent;
                }
            }
            if normal_sum.norm_squared() <= EPSILON * EPSILON {
                continue;
            }
            let normal = normal_sum.normalize();
            // Gram-Schmidt the accumulated tangent against the final normal.
            let mut tangent = tangent_sum - normal * normal.dot(&tangent_sum);
            if tangent.norm_squared() > EPSILON * EPSILON {
                tangent.normalize_mut();
            } else {
                tangent = any_perpendicular(&normal);
            }
            let data = &mut self[instance];
            data.normal = normal;
            data.tangent = tangent;
        }
    }

    /// Tangent of a polygon's UV mapping; perpendicular fallback when the
    /// mapping is degenerate.
    fn polygon_uv_tangent(&self, polygon: PolygonId, normal: &Vector3<Real>) -> Vector3<Real> {
        let perimeter = self[polygon].perimeter();
        let origin = perimeter[0];
        let position_0 = self.instance_position(origin);
        let uv_0 = self[origin].uv;

        for window in perimeter[1..].windows(2) {
            let edge_1 = self.instance_position(window[0]) - position_0;
            let edge_2 = self.instance_position(window[1]) - position_0;
            let delta_1 = self[window[0]].uv - uv_0;
            let delta_2 = self[window[1]].uv - uv_0;
            let determinant = delta_1.x * delta_2.y - delta_2.x * delta_1.y;
            if determinant.abs() <= EPSILON {
                continue;
            }
            let tangent = (edge_1 * delta_2.y - edge_2 * delta_1.y) / determinant;
            if tangent.norm_squared() > EPSILON * EPSILON {
                return tangent.normalize();
            }
        }
        any_perpendicular(normal)
    }

    /// Fill every polygon's triangle list from its perimeter contour.
    pub fn triangulate(&mut self) {
        for polygon in self.polygon_ids().collect::<Vec<_>>() {
            let perimeter = self[polygon].perimeter().to_vec();
            let triangles = if perimeter.len() == 3 {
                vec![[perimeter[0], perimeter[1], perimeter[2]]]
            } else {
                self.triangulate_contour(&perimeter)
            };
            self[polygon].triangles = triangles;
        }
    }

    fn triangulate_contour(&self, perimeter: &[VertexInstanceId]) -> Vec<[VertexInstanceId; 3]> {
        let positions: Vec<_> = perimeter
            .iter()
            .map(|&instance| self.instance_position(instance))
            .collect();
        let normal = newell_normal(&positions);
        if normal == Vector3::zeros() {
            return fan_triangles(perimeter);
        }

        // Project the contour into its plane; v = n × u keeps the contour
        // counter-clockwise in (u, v).
        let u = any_perpendicular(&normal);
        let v = normal.cross(&u);
        let origin = positions[0];
        let projected: Vec<[Real; 2]> = positions
            .iter()
            .map(|position| {
                let offset = position - origin;
                [offset.dot(&u), offset.dot(&v)]
            })
            .collect();

        match triangulate_2d_indices(&projected) {
            Some(indices) => indices
                .into_iter()
                .map(|[a, b, c]| [perimeter[a], perimeter[b], perimeter[c]])
                .collect(),
            None => fan_triangles(perimeter),
        }
    }
}

fn fan_triangles(perimeter: &[VertexInstanceId]) -> Vec<[VertexInstanceId; 3]> {
    (1..perimeter.len() - 1)
        .map(|i| [perimeter[0], perimeter[i], perimeter[i + 1]])
        .collect()
}

/// Find the contour index matching a triangulated coordinate, within tolerance.
fn match_contour_index(contour: &[[Real; 2]], x: Real, y: Real) -> Option<usize> {
    contour
        .iter()
        .position(|&[px, py]| (px - x).abs() <= EPSILON && (py - y).abs() <= EPSILON)
}

/// Orient a 2D triangle counter-clockwise to match the contour winding.
fn oriented(contour: &[[Real; 2]], [a, b, c]: [usize; 3]) -> [usize; 3] {
    let [ax, ay] = contour[a];
    let [bx, by] = contour[b];
    let [cx, cy] = contour[c];
    if (bx - ax) * (cy - ay) - (cx - ax) * (by - ay) < 0.0 {
        [a, c, b]
    } else {
        [a, b, c]
    }
}

/// Triangulate a simple 2D contour, returning index triples into it, or `None`
/// when the triangulation produced coordinates that do not map back onto the
/// contour.
fn triangulate_2d_indices(contour: &[[Real; 2]]) -> Option<Vec<[usize; 3]>> {
    let coords: Vec<Coord<Real>> = contour.iter().map(|&[x, y]| Coord { x, y }).collect();
    let polygon = GeoPolygon::new(LineString::new(coords), vec![]);

    #[cfg(feature = "earcut")]
    {
        use geo::TriangulateEarcut;
        let triangulation = polygon.earcut_triangles_raw();
        let vertices = triangulation.vertices;
        let mut result = Vec::with_capacity(triangulation.triangle_indices.len() / 3);
        for triangle in triangulation.triangle_indices.chunks_exact(3) {
            let a = match_contour_index(contour, vertices[2 * triangle[0]], vertices[2 * triangle[0] + 1])?;
            let b = match_contour_index(contour, vertices[2 * triangle[1]], vertices[2 * triangle[1] + 1])?;
            let c = match_contour_index(contour, vertices[2 * triangle[2]], vertices[2 * triangle[2] + 1])?;
            result.push(oriented(contour, [a, b, c]));
        }
        Some(result)
    }

    #[cfg(feature = "delaunay")]
    {
        use geo::TriangulateSpade;
        let Ok(triangles) = polygon.constrained_triangulation(Default::default()) else {
            return None;
        };
        let mut result = Vec::with_capacity(triangles.len());
        for triangle in triangles {
            let a = match_contour_index(contour, triangle.0.x, triangle.0.y)?;
            let b = match_contour_index(contour, triangle.1.x, triangle.1.y)?;
            let c = match_contour_index(contour, triangle.2.x, triangle.2.y)?;
            result.push(oriented(contour, [a, b, c]));
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newell_normal_of_ccw_square_points_up() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert!((newell_normal(&positions) - Vector3::z()).norm() < 1e-9);
    }

    #[test]
    fn quad_triangulates_into_two_triangles() {
        let mut mesh = MeshDescription::new();
        let group = mesh.find_or_create_polygon_group("brick/wall01");
        let perimeter: Vec<_> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]
        .iter()
        .map(|&p| {
            let vertex = mesh.create_vertex(p);
            mesh.create_vertex_instance(vertex)
        })
        .collect();
        let polygon = mesh.create_polygon(group, perimeter);
        mesh.triangulate();
        assert_eq!(mesh[polygon].triangles().len(), 2);
    }

    #[test]
    fn instance_normals_average_connected_polygons() {
        let mut mesh = MeshDescription::new();
        let group = mesh.find_or_create_polygon_group("brick/wall01");
        let perimeter: Vec<_> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
        .iter()
        .map(|&p| {
            let vertex = mesh.create_vertex(p);
            mesh.create_vertex_instance(vertex)
        })
        .collect();
        let polygon = mesh.create_polygon(group, perimeter);
        mesh.compute_normals_and_tangents();
        for &instance in mesh[polygon].perimeter() {
            assert!((mesh[instance].normal - Vector3::z()).norm() < 1e-9);
            assert!(mesh[instance].normal.dot(&mesh[instance].tangent).abs() < 1e-9);
        }
    }
}
