use bspmesh::bsp::traverse::{gather_brushes, gather_clusters, gather_faces};
use bspmesh::bsp::{BspFile, BspLeaf, BspNode};
use bspmesh::errors::BspError;

/// Three internal nodes over four leaves with overlapping face references.
fn two_level_tree() -> BspFile {
    BspFile {
        nodes: vec![
            BspNode {
                children: [1, 2],
                ..Default::default()
            },
            BspNode {
                children: [-1, -2],
                ..Default::default()
            },
            BspNode {
                children: [-3, -4],
                ..Default::default()
            },
        ],
        leaves: vec![
            BspLeaf {
                cluster: 0,
                first_leaf_face: 0,
                num_leaf_faces: 2,
                ..Default::default()
            },
            BspLeaf {
                cluster: 1,
                first_leaf_face: 2,
                num_leaf_faces: 1,
                ..Default::default()
            },
            BspLeaf {
                cluster: 2,
                first_leaf_face: 3,
                num_leaf_faces: 2,
                ..Default::default()
            },
            BspLeaf {
                cluster: 3,
                first_leaf_face: 5,
                num_leaf_faces: 2,
                ..Default::default()
            },
        ],
        leaf_faces: vec![1, 2, 2, 3, 4, 1, 5],
        ..Default::default()
    }
}

#[test]
fn root_gather_equals_union_of_children() {
    let bsp = two_level_tree();
    let from_root = gather_faces(&bsp, 0, None).unwrap();
    let from_left = gather_faces(&bsp, 1, None).unwrap();
    let from_right = gather_faces(&bsp, 2, None).unwrap();

    let mut union: Vec<u16> = from_left.clone();
    for face in &from_right {
        if !union.contains(face) {
            union.push(*face);
        }
    }
    let mut expected = union.clone();
    expected.sort_unstable();
    let mut actual = from_root.clone();
    actual.sort_unstable();
    assert_eq!(actual, expected);

    // Every gathered face originates in a leaf reachable from the root.
    for face in &from_root {
        assert!(bsp.leaf_faces.contains(face));
    }
}

#[test]
fn gather_preserves_first_insertion_order() {
    let bsp = two_level_tree();
    let faces = gather_faces(&bsp, 0, None).unwrap();
    assert_eq!(faces, vec![1, 2, 3, 4, 5]);
}

#[test]
fn cluster_filter_limits_leaves() {
    let bsp = two_level_tree();
    let filter: hashbrown::HashSet<i16> = [0i16, 3i16].into_iter().collect();
    let faces = gather_faces(&bsp, 0, Some(&filter)).unwrap();
    assert_eq!(faces, vec![1, 2, 5]);
}

#[test]
fn clusters_come_from_faced_leaves_only() {
    let mut bsp = two_level_tree();
    bsp.leaves[2].num_leaf_faces = 0;
    let clusters = gather_clusters(&bsp, 0).unwrap();
    assert_eq!(clusters, vec![0, 1, 3]);
}

#[test]
fn brush_gather_deduplicates() {
    let mut bsp = two_level_tree();
    bsp.leaf_brushes = vec![3, 1, 3, 2];
    bsp.leaves[0].first_leaf_brush = 0;
    bsp.leaves[0].num_leaf_brushes = 2;
    bsp.leaves[2].first_leaf_brush = 2;
    bsp.leaves[2].num_leaf_brushes = 2;
    let brushes = gather_brushes(&bsp, 0).unwrap();
    assert_eq!(brushes, vec![3, 1, 2]);
}

#[test]
fn malformed_leaf_reference_fails_the_gather() {
    let mut bsp = two_level_tree();
    bsp.leaves[3].first_leaf_face = 100;
    let result = gather_faces(&bsp, 0, None);
    assert!(matches!(result, Err(BspError::IndexOutOfRange { kind: "leaf-face", .. })));
}
