//! Clips a mesh and removes all geometry behind the specified planes.
//!
//! Planes compose as an intersection of half-spaces: a polygon's remainder is
//! the portion in front of *every* plane in the list. Any polygon crossing a
//! plane is cut, with one new vertex instance inserted exactly at each boundary
//! crossing; normals, tangents, texture coordinates and colors are interpolated
//! so attributes stay continuous across the cut.

use crate::float_types::{EPSILON, Real};
use crate::mesh::{MeshDescription, VertexInstanceId};
use nalgebra::{Point3, Vector3};

/// A half-space boundary. Points with [`ClipPlane::plane_dot`] `< 0` are on the
/// clipped-away side.
///
/// The normal is assumed unit-length by every caller in this crate; the
/// constructor does not normalize.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlane {
    pub normal: Vector3<Real>,
    pub distance: Real,
}

impl ClipPlane {
    /// Plane through `point` with the given facing.
    pub fn new(point: Point3<Real>, normal: Vector3<Real>) -> Self {
        let distance = normal.dot(&point.coords);
        ClipPlane { normal, distance }
    }

    pub const fn from_normal(normal: Vector3<Real>, distance: Real) -> Self {
        ClipPlane { normal, distance }
    }

    /// Signed distance of `point` from the plane; negative means clipped away.
    pub fn plane_dot(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.distance
    }

    pub fn flipped(&self) -> Self {
        ClipPlane {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Projection of the origin onto the plane.
    pub fn project_origin(&self) -> Point3<Real> {
        Point3::from(self.normal * self.distance)
    }
}

impl MeshDescription {
    /// Remove, for every polygon, the portion behind every plane in
    /// `clip_planes`, then restore structural invariants with
    /// [`MeshDescription::clean`].
    pub fn clip(&mut self, clip_planes: &[ClipPlane]) {
        let all_polygons: Vec<_> = self.polygon_ids().collect();
        for polygon in all_polygons {
            let group = self[polygon].group();
            let mut new_loop: Vec<VertexInstanceId> = self[polygon].perimeter().to_vec();
            let mut changes_made = false;

            for plane in clip_planes {
                let old_loop = std::mem::take(&mut new_loop);
                let len = old_loop.len();
                let mut previous: Option<(VertexInstanceId, bool)> = None;

                // Walk consecutive pairs, including the wrap-around pair, and
                // insert an intersection wherever the side changes.
                for i in 0..=len {
                    let wrapped = i == len;
                    let instance = old_loop[i % len];
                    let clipped = plane.plane_dot(&self.instance_position(instance)) < 0.0;
                    if clipped {
                        changes_made = true;
                    }
                    if let Some((previous_instance, previous_clipped)) = previous {
                        if clipped != previous_clipped {
                            new_loop.push(self.clip_edge(previous_instance, instance, plane));
                        }
                    }
                    if !clipped && !wrapped {
                        new_loop.push(instance);
                    }
                    previous = Some((instance, clipped));
                }

                // Fully excluded by this plane; no further planes can bring it back.
                if new_loop.len() < 3 {
                    break;
                }
            }

            if new_loop.len() < 3 {
                self.delete_polygon(polygon);
            } else if changes_made {
                self.delete_polygon(polygon);
                self.create_polygon(group, new_loop);
            }
        }

        self.clean();
    }

    /// Intersect the segment between two boundary instances with `plane`,
    /// creating one new vertex and one new vertex instance with interpolated
    /// attributes. Returns the new instance.
    ///
    /// A segment parallel to the plane has no single intersection; the
    /// parameter defaults to 0 so the new instance collapses onto the first
    /// endpoint, which the cleaner's duplicate sweep then removes.
    fn clip_edge(
        &mut self,
        instance_a: VertexInstanceId,
        instance_b: VertexInstanceId,
        plane: &ClipPlane,
    ) -> VertexInstanceId {
        let position_a = self.instance_position(instance_a);
        let position_b = self.instance_position(instance_b);
        let direction = position_b - position_a;

        let denominator = plane.normal.dot(&direction);
        let t = if denominator.abs() < EPSILON {
            0.0
        } else {
            let point_on_plane = plane.project_origin();
            (plane.normal.dot(&(point_on_plane - position_a)) / denominator).clamp(0.0, 1.0)
        };

        let normal = renormalized_lerp(self[instance_a].normal, self[instance_b].normal, t);
        let tangent = renormalized_lerp(self[instance_a].tangent, self[instance_b].tangent, t);
        let uv = self[instance_a].uv.lerp(&self[instance_b].uv, t);
        let color = self[instance_a].color.lerp(&self[instance_b].color, t);

        let vertex = self.create_vertex(position_a + direction * t);
        let instance = self.create_vertex_instance(vertex);
        let data = &mut self[instance];
        data.normal = normal;
        data.tangent = tangent;
        data.uv = uv;
        data.color = color;
        instance
    }
}

/// Linear interpolation re-normalized to unit length, keeping the `a`-side
/// value when the interpolation cancels out.
fn renormalized_lerp(a: Vector3<Real>, b: Vector3<Real>, t: Real) -> Vector3<Real> {
    let mixed = a.lerp(&b, t);
    if mixed.norm_squared() > EPSILON * EPSILON {
        mixed.normalize()
    } else {
        a
    }
}
