//! Gather operations over the node tree.
//!
//! Each gather walks the whole subtree under a head node with an explicit
//! work-list (compiled trees can be deep enough to make recursion risky),
//! visiting both children of every internal node in order and collecting from
//! the leaves. Collected indices keep first-insertion order with duplicates
//! dropped; callers that need a different order sort afterwards.

use crate::bsp::BspFile;
use crate::errors::BspError;
use hashbrown::HashSet;

/// One step of the subtree walk: descend into a node or collect from a leaf.
enum Visit {
    Node(usize),
    Leaf(usize),
}

/// Pushes both children of a node, ordered so child 0 is handled first.
fn push_children(stack: &mut Vec<Visit>, children: &[i32; 2]) {
    for &child in children.iter().rev() {
        if child < 0 {
            stack.push(Visit::Leaf((-1 - child) as usize));
        } else {
            stack.push(Visit::Node(child as usize));
        }
    }
}

/// Collect the distinct brush indices referenced by any leaf under `head_node`.
pub fn gather_brushes(bsp: &BspFile, head_node: usize) -> Result<Vec<u16>, BspError> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![Visit::Node(head_node)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Node(index) => push_children(&mut stack, &bsp.node(index)?.children),
            Visit::Leaf(index) => {
                let leaf = bsp.leaf(index)?;
                for i in 0..leaf.num_leaf_brushes {
                    let brush = bsp.leaf_brush(leaf.first_leaf_brush as usize + i as usize)?;
                    if seen.insert(brush) {
                        out.push(brush);
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Collect the distinct face indices referenced by any leaf under `head_node`.
///
/// With a `cluster_filter`, only leaves whose visibility cluster is in the set
/// contribute faces.
pub fn gather_faces(
    bsp: &BspFile,
    head_node: usize,
    cluster_filter: Option<&HashSet<i16>>,
) -> Result<Vec<u16>, BspError> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![Visit::Node(head_node)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Node(index) => push_children(&mut stack, &bsp.node(index)?.children),
            Visit::Leaf(index) => {
                let leaf = bsp.leaf(index)?;
                if cluster_filter.is_none_or(|filter| filter.contains(&leaf.cluster)) {
                    for i in 0..leaf.num_leaf_faces {
                        let face = bsp.leaf_face(leaf.first_leaf_face as usize + i as usize)?;
                        if seen.insert(face) {
                            out.push(face);
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Collect the distinct cluster ids of leaves under `head_node` that reference
/// at least one face.
pub fn gather_clusters(bsp: &BspFile, head_node: usize) -> Result<Vec<i16>, BspError> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![Visit::Node(head_node)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Node(index) => push_children(&mut stack, &bsp.node(index)?.children),
            Visit::Leaf(index) => {
                let leaf = bsp.leaf(index)?;
                if leaf.num_leaf_faces > 0 && seen.insert(leaf.cluster) {
                    out.push(leaf.cluster);
                }
            }
        }
    }
    Ok(out)
}
