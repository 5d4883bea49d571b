//! Cleanup pass restoring structural invariants after clipping.
//!
//! Order matters: duplicate-position instances are removed from each polygon
//! loop first (deleting loops that would drop below three corners), then
//! unreferenced elements are purged in dependency order (edges, vertex
//! instances, vertices, polygon groups), and finally every identity is
//! compacted and the mesh retriangulated. Running the pass twice produces no
//! further change.

use crate::float_types::{POSITION_EPSILON, Real};
use crate::mesh::{MeshDescription, VertexInstanceId};
use nalgebra::Point3;

/// Component-wise position comparison under `epsilon`.
pub(crate) fn positions_equal(a: Point3<Real>, b: Point3<Real>, epsilon: Real) -> bool {
    (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon && (a.z - b.z).abs() <= epsilon
}

impl MeshDescription {
    /// Remove degenerate and duplicate geometry, purge unreferenced elements,
    /// compact ids, and retriangulate.
    pub fn clean(&mut self) {
        // Delete degenerate polygons
        let all_polygons: Vec<_> = self.polygon_ids().collect();
        for polygon in all_polygons {
            let perimeter = self[polygon].perimeter().to_vec();
            let mut duplicates: Vec<VertexInstanceId> = Vec::new();
            for i in 0..perimeter.len() {
                let position_a = self.instance_position(perimeter[i]);
                for j in (i + 1)..perimeter.len() {
                    let position_b = self.instance_position(perimeter[j]);
                    if positions_equal(position_a, position_b, POSITION_EPSILON)
                        && !duplicates.contains(&perimeter[j])
                    {
                        duplicates.push(perimeter[j]);
                    }
                }
            }

            if perimeter.len() - duplicates.len() < 3 {
                self.delete_polygon(polygon);
            } else if !duplicates.is_empty() {
                let group = self[polygon].group();
                let new_perimeter: Vec<_> = perimeter
                    .iter()
                    .copied()
                    .filter(|instance| !duplicates.contains(instance))
                    .collect();
                self.delete_polygon(polygon);
                self.recreate_polygon(polygon, group, new_perimeter);
            }
        }

        // Delete unused edges
        let dead_edges: Vec<_> = self
            .edge_ids()
            .filter(|&edge| self[edge].connected_polygons().is_empty())
            .collect();
        for edge in dead_edges {
            self.delete_edge(edge);
        }

        // Delete unused vertex instances
        let dead_instances: Vec<_> = self
            .vertex_instance_ids()
            .filter(|&instance| self[instance].connected_polygons().is_empty())
            .collect();
        for instance in dead_instances {
            self.delete_vertex_instance(instance);
        }

        // Delete unused vertices
        let dead_vertices: Vec<_> = self
            .vertex_ids()
            .filter(|&vertex| self[vertex].instances().is_empty())
            .collect();
        for vertex in dead_vertices {
            self.delete_vertex(vertex);
        }

        // Delete any empty polygon groups
        let dead_groups: Vec<_> = self
            .group_ids()
            .filter(|&group| self[group].polygons().is_empty())
            .collect();
        for group in dead_groups {
            self.delete_polygon_group(group);
        }

        // Remap element ids into a dense index space, then retriangulate
        self.compact();
        self.triangulate();
    }
}
