use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::BbdIndexError;
use crate::geom::{PointObj, Rect};
use crate::r#type::CoordFloat;
use crate::tree::{node_width, BBDTree, BuildVariant, Node, NodeType};

const VARIANTS: [BuildVariant; 2] = [BuildVariant::BasicSplit, BuildVariant::MidpointSplit];

fn random_points<const D: usize>(n: usize, seed: u64) -> Vec<PointObj<f64, D, usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            PointObj::with_data(std::array::from_fn(|_| rng.gen_range(-100.0..100.0)), i)
        })
        .collect()
}

/// A tight cluster inside a huge bounding box; midpoint construction has to
/// emit shrink nodes to carve it out.
fn clustered_points() -> Vec<PointObj<f64, 2, usize>> {
    let mut points: Vec<PointObj<f64, 2, usize>> = (0..100)
        .map(|i| {
            PointObj::with_data([(i % 10) as f64 * 1e-6, (i / 10) as f64 * 1e-6], i)
        })
        .collect();
    points.push(PointObj::with_data([1e6, 1e6], 100));
    points
}

/// Walk the arena linearly, advancing by `node_width`, and return every
/// header index encountered.
fn linear_scan<N: CoordFloat, const D: usize, T>(tree: &BBDTree<N, D, T>) -> Vec<u32> {
    let mut indices = vec![];
    let mut offset = 0usize;
    while offset < tree.nodes.len() {
        indices.push(offset as u32);
        let node = tree.node(offset as u32);
        offset += node_width::<N, D>(node.node_type());
    }
    assert_eq!(offset, tree.nodes.len(), "widths must cover the arena exactly");
    indices
}

fn preorder<N: CoordFloat, const D: usize, T>(
    tree: &BBDTree<N, D, T>,
    index: u32,
    out: &mut Vec<u32>,
) {
    out.push(index);
    let node = tree.node(index);
    let (has_left, right) = match node {
        Node::Leaf { .. } => return,
        Node::Split {
            has_left, right, ..
        }
        | Node::Shrink {
            has_left, right, ..
        } => (has_left, right),
    };
    if has_left {
        preorder(tree, index + node_width::<N, D>(node.node_type()) as u32, out);
    }
    if right != 0 {
        preorder(tree, right, out);
    }
}

/// Assert that every leaf's points lie inside the box implied by the path
/// of splits and shrinks leading to it.
fn check_containment<N: CoordFloat, const D: usize, T>(
    tree: &BBDTree<N, D, T>,
    index: u32,
    bounds: Rect<N, D>,
) {
    match tree.node(index) {
        Node::Leaf { begin, end } => {
            for i in begin..end {
                assert!(
                    bounds.contains(&tree.point(i).point),
                    "point {i} escapes its leaf box"
                );
            }
        }
        Node::Split {
            dim,
            has_left,
            right,
        } => {
            let split = bounds.split_at(dim);
            if has_left {
                let left = index + node_width::<N, D>(NodeType::Split) as u32;
                check_containment(tree, left, split.left);
            }
            if right != 0 {
                check_containment(tree, right, split.right);
            }
        }
        Node::Shrink {
            has_left,
            right,
            inner,
        } => {
            assert!(bounds.contains(inner.min()), "shrink box escapes parent");
            assert!(bounds.contains(inner.max()), "shrink box escapes parent");
            if has_left {
                let left = index + node_width::<N, D>(NodeType::Shrink) as u32;
                check_containment(tree, left, inner);
            }
            if right != 0 {
                // the outer child keeps the untightened parent box
                check_containment(tree, right, bounds);
            }
        }
    }
}

#[test]
fn leaf_ranges_partition_the_point_set() {
    for variant in VARIANTS {
        for leaf_max_size in [1, 2, 5, 10] {
            let points = random_points::<3>(257, 7);
            let n = points.len();
            let tree = BBDTree::build(variant, leaf_max_size, points).unwrap();

            let mut seen = vec![false; n];
            for index in linear_scan(&tree) {
                if let Node::Leaf { begin, end } = tree.node(index) {
                    for i in begin..end {
                        assert!(!seen[i as usize], "point {i} referenced twice");
                        seen[i as usize] = true;
                    }
                }
            }
            assert!(seen.iter().all(|s| *s), "every point must land in a leaf");

            // the permutation must not lose or duplicate payloads either
            let mut payloads: Vec<usize> = tree.points().iter().map(|p| p.data).collect();
            payloads.sort_unstable();
            assert_eq!(payloads, (0..n).collect::<Vec<_>>());
        }
    }
}

#[test]
fn arena_layout_is_preorder() {
    for variant in VARIANTS {
        for points in [random_points::<2>(100, 3), clustered_points()] {
            let tree = BBDTree::build(variant, 2, points).unwrap();
            let mut dfs = vec![];
            preorder(&tree, 0, &mut dfs);
            assert_eq!(dfs, linear_scan(&tree));
        }
    }
}

#[test]
fn points_stay_inside_their_path_boxes() {
    for variant in VARIANTS {
        for points in [random_points::<2>(200, 11), clustered_points()] {
            let tree = BBDTree::build(variant, 3, points).unwrap();
            for obj in tree.points() {
                assert!(tree.bounds().contains(&obj.point));
            }
            check_containment(&tree, 0, *tree.bounds());
        }
    }
}

#[test]
fn midpoint_split_emits_shrink_nodes_for_clustered_data() {
    let tree = BBDTree::build_midpoint_split(4, clustered_points()).unwrap();
    let stats = tree.stats();
    assert!(stats.shrink_nodes > 0, "expected shrink nodes, got {stats:?}");

    // the baseline never shrinks
    let basic = BBDTree::build_basic_split(4, clustered_points()).unwrap();
    assert_eq!(basic.stats().shrink_nodes, 0);
}

#[test]
fn coincident_points_force_a_leaf() {
    for variant in VARIANTS {
        let points = vec![PointObj::new([1.0, 2.0]); 50];
        let tree = BBDTree::build(variant, 4, points).unwrap();
        let stats = tree.stats();
        assert_eq!(stats.leaf_nodes, 1);
        assert_eq!(stats.inner_nodes, 0);
        assert_eq!(stats.avg_leaf_size, 50.0);
        assert!(matches!(tree.root(), Some(Node::Leaf { begin: 0, end: 50 })));
    }
}

#[test]
fn coincident_cluster_mixed_with_spread_points_terminates() {
    for variant in VARIANTS {
        let mut points: Vec<PointObj<f64, 2, usize>> =
            (0..30).map(|i| PointObj::with_data([5.0, 5.0], i)).collect();
        points.extend((30..40).map(|i| PointObj::with_data([i as f64, -3.0], i)));
        let n = points.len();
        let tree = BBDTree::build(variant, 2, points).unwrap();

        let mut count = 0usize;
        for index in linear_scan(&tree) {
            if let Node::Leaf { begin, end } = tree.node(index) {
                count += (end - begin) as usize;
            }
        }
        assert_eq!(count, n);
    }
}

#[test]
fn empty_input_builds_empty_tree() {
    let points: Vec<PointObj<f64, 2>> = vec![];
    let tree = BBDTree::build(BuildVariant::MidpointSplit, 1, points).unwrap();
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert_eq!(tree.num_points(), 0);
    assert_eq!(tree.bounds(), &Rect::empty());
    assert_eq!(tree.stats(), Default::default());
}

#[test]
fn zero_leaf_size_is_rejected() {
    let points = vec![PointObj::new([0.0, 0.0])];
    let err = BBDTree::build(BuildVariant::MidpointSplit, 0, points).unwrap_err();
    assert!(matches!(err, BbdIndexError::InvalidLeafSize));
}

#[test]
fn oversized_dimension_is_rejected() {
    let points = vec![PointObj::<f64, 9>::new([0.0; 9])];
    let err = BBDTree::build(BuildVariant::BasicSplit, 1, points).unwrap_err();
    assert!(matches!(err, BbdIndexError::UnsupportedDimension { dim: 9 }));
}

#[test]
fn stats_are_internally_consistent() {
    for variant in VARIANTS {
        let points = random_points::<3>(500, 23);
        let n = points.len();
        let tree = BBDTree::build(variant, 5, points).unwrap();
        let stats = tree.stats();

        assert_eq!(stats.inner_nodes, stats.split_nodes + stats.shrink_nodes);
        // every node except the root is someone's child
        assert_eq!(
            stats.null_children,
            2 * stats.inner_nodes - (stats.inner_nodes + stats.leaf_nodes - 1)
        );
        assert!((stats.avg_leaf_size * stats.leaf_nodes as f64 - n as f64).abs() < 1e-9);
        assert!(stats.avg_depth <= stats.max_depth as f64);
        assert_eq!(stats.memory_usage_bytes, tree.nodes.len() * 4);
    }
}

#[test]
fn f32_shrink_boxes_roundtrip() {
    let points: Vec<PointObj<f32, 3, usize>> = {
        let mut points: Vec<PointObj<f32, 3, usize>> = (0..60)
            .map(|i| {
                PointObj::with_data(
                    [(i % 4) as f32 * 1e-3, (i / 4) as f32 * 1e-3, 0.5],
                    i,
                )
            })
            .collect();
        points.push(PointObj::with_data([1e5, 1e5, 1e5], 60));
        points
    };
    let tree = BBDTree::build_midpoint_split(2, points).unwrap();
    assert!(tree.stats().shrink_nodes > 0);
    for index in linear_scan(&tree) {
        if let Node::Shrink { inner, .. } = tree.node(index) {
            for d in 0..3 {
                assert!(inner.min()[d] <= inner.max()[d]);
            }
        }
    }
    check_containment(&tree, 0, *tree.bounds());
}
