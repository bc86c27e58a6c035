//! Exact and (1+ε)-approximate nearest-neighbor queries over a
//! [`BBDTree`], plus linear-scan reference implementations used as
//! correctness oracles.
//!
//! Tree queries are best-first: subtrees are visited in order of the
//! squared distance from the query point to their box, so as soon as the
//! next box's lower bound exceeds the current best distance divided by
//! (1+ε), nothing left in the queue can improve the result beyond the
//! allowed slack and the traversal stops. With ε = 0 this degenerates to
//! exact search.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::geom::{Point, PointObj, Rect};
use crate::queue::{FixedPriQueue, QueueStrategy};
use crate::r#type::CoordFloat;
use crate::tree::{node_width, BBDTree, Node};

/// A candidate point paired with its squared distance to the query point.
///
/// Exists only inside the bounded queue during one query. The ordering is
/// total over (distance, point index); we don't allow NaN, so the
/// comparison should only panic on NaN coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistEntry<N: CoordFloat> {
    /// Squared distance to the query point.
    pub dist: N,
    /// Index into the tree's permuted point array.
    pub index: u32,
}

impl<N: CoordFloat> Eq for DistEntry<N> {}

impl<N: CoordFloat> Ord for DistEntry<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap()
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl<N: CoordFloat> PartialOrd for DistEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A subtree queued for visitation: the lower-bound distance from the query
/// point to its box, its slot index, and the box itself (boxes are derived
/// during descent, not stored in split nodes).
#[derive(Debug, Clone, Copy, PartialEq)]
struct DistNode<N: CoordFloat, const D: usize> {
    dist: N,
    index: u32,
    bounds: Rect<N, D>,
}

impl<N: CoordFloat, const D: usize> Eq for DistNode<N, D> {}

impl<N: CoordFloat, const D: usize> Ord for DistNode<N, D> {
    fn cmp(&self, other: &Self) -> Ordering {
        // We don't allow NaN. This should only panic on NaN
        self.dist.partial_cmp(&other.dist).unwrap()
    }
}

impl<N: CoordFloat, const D: usize> PartialOrd for DistNode<N, D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Counters describing one traversal, collected by the `_traced` queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes popped from the visitation queue.
    pub steps: usize,
    /// Leaves whose point ranges were scanned.
    pub leaves_visited: usize,
    /// Total points whose distance was evaluated.
    pub points_scanned: usize,
}

/// Traversal instrumentation hook. The untraced queries monomorphize over
/// the no-op recorder, so tracing costs nothing unless requested.
trait Recorder {
    fn step(&mut self);
    fn leaf(&mut self, len: usize);
}

struct NoRecord;

impl Recorder for NoRecord {
    #[inline]
    fn step(&mut self) {}
    #[inline]
    fn leaf(&mut self, _len: usize) {}
}

impl Recorder for SearchStats {
    #[inline]
    fn step(&mut self) {
        self.steps += 1;
    }
    #[inline]
    fn leaf(&mut self, len: usize) {
        self.leaves_visited += 1;
        self.points_scanned += len;
    }
}

/// Exact nearest neighbor by linear scan. O(N), no index needed; this is
/// the ground truth the tree queries are tested against. Ties go to the
/// lowest position.
pub fn linear_nearest_neighbor<'a, N: CoordFloat, const D: usize, T>(
    objs: &'a [PointObj<N, D, T>],
    query: impl Into<Point<N, D>>,
) -> Option<&'a PointObj<N, D, T>> {
    let query = query.into();
    let mut best: Option<(N, usize)> = None;
    for (i, obj) in objs.iter().enumerate() {
        let dist = obj.point.dist_sq(&query);
        if best.map_or(true, |(best_dist, _)| dist < best_dist) {
            best = Some((dist, i));
        }
    }
    best.map(|(_, i)| &objs[i])
}

/// Exact k nearest neighbors by linear scan through a bounded queue.
/// Returns `min(k, N)` points in unspecified order.
pub fn linear_k_nearest_neighbors<N: CoordFloat, const D: usize, T: Clone>(
    objs: &[PointObj<N, D, T>],
    query: impl Into<Point<N, D>>,
    k: usize,
    strategy: QueueStrategy,
) -> Vec<PointObj<N, D, T>> {
    let query = query.into();
    if k == 0 {
        return vec![];
    }
    let mut queue = strategy.new_queue::<DistEntry<N>>(k);
    for (i, obj) in objs.iter().enumerate() {
        queue.push(DistEntry {
            dist: obj.point.dist_sq(&query),
            index: i as u32,
        });
    }
    queue
        .values()
        .into_iter()
        .map(|entry| objs[entry.index as usize].clone())
        .collect()
}

/// Exact nearest neighbor over the tree. `None` for an empty tree.
pub fn nearest_neighbor<'a, N: CoordFloat, const D: usize, T>(
    tree: &'a BBDTree<N, D, T>,
    query: impl Into<Point<N, D>>,
) -> Option<&'a PointObj<N, D, T>> {
    approx_nearest_neighbor(tree, query, N::zero())
}

/// (1+ε)-approximate nearest neighbor over the tree: the returned point's
/// squared distance is at most (1+ε) times the true nearest squared
/// distance. Negative `epsilon` is clamped to zero. `None` for an empty
/// tree.
pub fn approx_nearest_neighbor<'a, N: CoordFloat, const D: usize, T>(
    tree: &'a BBDTree<N, D, T>,
    query: impl Into<Point<N, D>>,
    epsilon: N,
) -> Option<&'a PointObj<N, D, T>> {
    let query = query.into();
    if tree.is_empty() {
        return None;
    }
    let slack = N::one() + epsilon.max(N::zero());
    let mut visit = BinaryHeap::new();
    visit.push(Reverse(DistNode {
        dist: tree.bounds().dist_sq(&query),
        index: 0,
        bounds: *tree.bounds(),
    }));
    let mut best: Option<DistEntry<N>> = None;

    while let Some(Reverse(dist_node)) = visit.pop() {
        if let Some(found) = best {
            if dist_node.dist > found.dist / slack {
                break;
            }
        }
        match tree.node(dist_node.index) {
            Node::Leaf { begin, end } => {
                for i in begin..end {
                    let entry = DistEntry {
                        dist: tree.point(i).point.dist_sq(&query),
                        index: i,
                    };
                    if best.map_or(true, |found| entry < found) {
                        best = Some(entry);
                    }
                }
            }
            inner => enqueue_children(&dist_node, inner, &query, &mut visit),
        }
    }
    best.map(|found| tree.point(found.index))
}

/// Exact k nearest neighbors over the tree. Returns `min(k, N)` points in
/// unspecified order.
pub fn k_nearest_neighbors<N: CoordFloat, const D: usize, T: Clone>(
    tree: &BBDTree<N, D, T>,
    query: impl Into<Point<N, D>>,
    k: usize,
    strategy: QueueStrategy,
) -> Vec<PointObj<N, D, T>> {
    approx_k_nearest_neighbors(tree, query, k, N::zero(), strategy)
}

/// (1+ε)-approximate k nearest neighbors: every returned point's squared
/// distance is at most (1+ε) times the true k-th nearest squared distance.
/// Returns `min(k, N)` points in unspecified order. Negative `epsilon` is
/// clamped to zero.
pub fn approx_k_nearest_neighbors<N: CoordFloat, const D: usize, T: Clone>(
    tree: &BBDTree<N, D, T>,
    query: impl Into<Point<N, D>>,
    k: usize,
    epsilon: N,
    strategy: QueueStrategy,
) -> Vec<PointObj<N, D, T>> {
    let mut queue = strategy.new_queue::<DistEntry<N>>(k);
    approx_k_nearest_neighbors_with_queue(tree, query, k, epsilon, queue.as_mut())
}

/// [`approx_k_nearest_neighbors`] with a caller-supplied queue, so repeated
/// queries can reuse one allocation. The queue is reset to capacity `k`
/// before use.
pub fn approx_k_nearest_neighbors_with_queue<N: CoordFloat, const D: usize, T: Clone>(
    tree: &BBDTree<N, D, T>,
    query: impl Into<Point<N, D>>,
    k: usize,
    epsilon: N,
    queue: &mut dyn FixedPriQueue<DistEntry<N>>,
) -> Vec<PointObj<N, D, T>> {
    let query = query.into();
    if k == 0 || tree.is_empty() {
        return vec![];
    }
    if k == 1 {
        // a bounded queue of one is just a running minimum
        return approx_nearest_neighbor(tree, query, epsilon)
            .cloned()
            .into_iter()
            .collect();
    }
    queue.reset(k);
    search_k(tree, &query, epsilon, queue, &mut NoRecord);
    collect_results(tree, queue)
}

/// [`approx_k_nearest_neighbors`] returning traversal counters alongside
/// the results. Diagnostic variant; runs the full k-NN traversal even for
/// `k = 1` so the counters describe the real thing.
pub fn approx_k_nearest_neighbors_traced<N: CoordFloat, const D: usize, T: Clone>(
    tree: &BBDTree<N, D, T>,
    query: impl Into<Point<N, D>>,
    k: usize,
    epsilon: N,
    strategy: QueueStrategy,
) -> (Vec<PointObj<N, D, T>>, SearchStats) {
    let query = query.into();
    let mut stats = SearchStats::default();
    if k == 0 || tree.is_empty() {
        return (vec![], stats);
    }
    let mut queue = strategy.new_queue::<DistEntry<N>>(k);
    search_k(tree, &query, epsilon, queue.as_mut(), &mut stats);
    (collect_results(tree, queue.as_ref()), stats)
}

fn search_k<N: CoordFloat, const D: usize, T, R: Recorder>(
    tree: &BBDTree<N, D, T>,
    query: &Point<N, D>,
    epsilon: N,
    queue: &mut dyn FixedPriQueue<DistEntry<N>>,
    recorder: &mut R,
) {
    let slack = N::one() + epsilon.max(N::zero());
    let mut visit = BinaryHeap::new();
    visit.push(Reverse(DistNode {
        dist: tree.bounds().dist_sq(query),
        index: 0,
        bounds: *tree.bounds(),
    }));

    while let Some(Reverse(dist_node)) = visit.pop() {
        recorder.step();
        if queue.is_full() {
            // the queue's worst retained distance is the running k-th best;
            // until the queue fills we must keep consuming nodes
            if let Some(worst) = queue.last() {
                if dist_node.dist > worst.dist / slack {
                    break;
                }
            }
        }
        match tree.node(dist_node.index) {
            Node::Leaf { begin, end } => {
                recorder.leaf((end - begin) as usize);
                for i in begin..end {
                    queue.push(DistEntry {
                        dist: tree.point(i).point.dist_sq(query),
                        index: i,
                    });
                }
            }
            inner => enqueue_children(&dist_node, inner, query, &mut visit),
        }
    }
}

/// Derive the child boxes of an inner node and queue the children that
/// exist, keyed by their box distance to the query point.
fn enqueue_children<N: CoordFloat, const D: usize>(
    parent: &DistNode<N, D>,
    node: Node<N, D>,
    query: &Point<N, D>,
    visit: &mut BinaryHeap<Reverse<DistNode<N, D>>>,
) {
    let (left_bounds, right_bounds, has_left, right) = match node {
        Node::Split {
            dim,
            has_left,
            right,
        } => {
            let split = parent.bounds.split_at(dim);
            (split.left, split.right, has_left, right)
        }
        // the outer child deliberately keeps the untightened parent box
        Node::Shrink {
            has_left,
            right,
            inner,
        } => (inner, parent.bounds, has_left, right),
        Node::Leaf { .. } => unreachable!("leaves have no children"),
    };
    if has_left {
        let index = parent.index + node_width::<N, D>(node.node_type()) as u32;
        visit.push(Reverse(DistNode {
            dist: left_bounds.dist_sq(query),
            index,
            bounds: left_bounds,
        }));
    }
    if right != 0 {
        visit.push(Reverse(DistNode {
            dist: right_bounds.dist_sq(query),
            index: right,
            bounds: right_bounds,
        }));
    }
}

fn collect_results<N: CoordFloat, const D: usize, T: Clone>(
    tree: &BBDTree<N, D, T>,
    queue: &dyn FixedPriQueue<DistEntry<N>>,
) -> Vec<PointObj<N, D, T>> {
    queue
        .values()
        .into_iter()
        .map(|entry| tree.point(entry.index).clone())
        .collect()
}
