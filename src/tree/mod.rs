//! The balanced-box-decomposition (BBD) tree.
//!
//! A BBD tree is a binary spatial index over a fixed point set. Inner nodes
//! either bisect their box at the midpoint of its widest dimension (split
//! nodes) or carve a dense inner box out of it (shrink nodes); leaves
//! reference contiguous ranges of the permuted point array. All nodes are
//! packed into one flat `u32` arena (see [`node_width`]), and the tree is
//! immutable once built.

#![warn(missing_docs)]

mod builder;
mod node;

pub use node::{node_width, Node, NodeType, MAX_DIM};

use tinyvec::TinyVec;

use crate::error::{BbdIndexError, Result};
use crate::geom::{PointObj, Rect};
use crate::r#type::CoordFloat;
use crate::tree::builder::TreeBuilder;

/// Which construction algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildVariant {
    /// Plain fair splits only. A baseline: can degenerate into deep chains
    /// of nearly-empty splits on clustered data.
    BasicSplit,
    /// Midpoint splits plus shrink nodes. The production algorithm; bounds
    /// the number of wasted splits on any root-to-leaf path.
    MidpointSplit,
}

/// An immutable BBD tree over a point set, generic over the coordinate
/// float type `N`, the dimension `D` (at most [`MAX_DIM`]) and an optional
/// per-point payload `T`.
///
/// Built once via [`build`][BBDTree::build]; queries only ever borrow it, so
/// a tree can be shared freely across threads as long as each query owns its
/// scratch queues.
#[derive(Debug, Clone, PartialEq)]
pub struct BBDTree<N: CoordFloat, const D: usize, T = ()> {
    pub(crate) nodes: Vec<u32>,
    pub(crate) points: Vec<PointObj<N, D, T>>,
    pub(crate) bounds: Rect<N, D>,
}

impl<N: CoordFloat, const D: usize, T: Clone> BBDTree<N, D, T> {
    /// Build a tree over `points` with the given construction variant.
    /// Leaves hold at most `leaf_max_size` points, except where construction
    /// is forced to close off coincident points early.
    ///
    /// An empty `points` yields a zero-node tree, not an error; queries
    /// against it return empty results.
    pub fn build(
        variant: BuildVariant,
        leaf_max_size: usize,
        points: Vec<PointObj<N, D, T>>,
    ) -> Result<Self> {
        if leaf_max_size == 0 {
            return Err(BbdIndexError::InvalidLeafSize);
        }
        if D == 0 || D > MAX_DIM {
            return Err(BbdIndexError::UnsupportedDimension { dim: D });
        }
        Ok(TreeBuilder::new(leaf_max_size, points).build(variant))
    }

    /// Build with [`BuildVariant::BasicSplit`].
    pub fn build_basic_split(leaf_max_size: usize, points: Vec<PointObj<N, D, T>>) -> Result<Self> {
        Self::build(BuildVariant::BasicSplit, leaf_max_size, points)
    }

    /// Build with [`BuildVariant::MidpointSplit`].
    pub fn build_midpoint_split(
        leaf_max_size: usize,
        points: Vec<PointObj<N, D, T>>,
    ) -> Result<Self> {
        Self::build(BuildVariant::MidpointSplit, leaf_max_size, points)
    }
}

impl<N: CoordFloat, const D: usize, T> BBDTree<N, D, T> {
    /// Bounding box of the whole point set; the empty box for an empty tree.
    pub fn bounds(&self) -> &Rect<N, D> {
        &self.bounds
    }

    /// Decode the node whose header sits at slot `index`.
    pub fn node(&self, index: u32) -> Node<N, D> {
        node::decode(&self.nodes, index)
    }

    /// The root node, `None` for an empty tree.
    pub fn root(&self) -> Option<Node<N, D>> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(self.node(0))
        }
    }

    /// The point object at `index` of the permuted point array (the index
    /// space leaf ranges live in).
    pub fn point(&self, index: u32) -> &PointObj<N, D, T> {
        &self.points[index as usize]
    }

    /// The permuted point array.
    pub fn points(&self) -> &[PointObj<N, D, T>] {
        &self.points
    }

    /// Number of indexed points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// True if the tree holds no points (and therefore no nodes).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compute tree statistics with one full walk. Diagnostic only; nothing
    /// in the crate consumes this.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            memory_usage_bytes: self.nodes.len() * std::mem::size_of::<u32>(),
            ..TreeStats::default()
        };
        if self.nodes.is_empty() {
            return stats;
        }
        let mut depth_sum = 0usize;
        let mut leaf_size_sum = 0usize;
        let mut stack: TinyVec<[(u32, u32); 32]> = TinyVec::new();
        stack.push((0, 0));
        while let Some((index, depth)) = stack.pop() {
            let node = self.node(index);
            match node {
                Node::Leaf { begin, end } => {
                    stats.leaf_nodes += 1;
                    leaf_size_sum += (end - begin) as usize;
                    depth_sum += depth as usize;
                    stats.max_depth = stats.max_depth.max(depth as usize);
                }
                Node::Split {
                    has_left, right, ..
                }
                | Node::Shrink {
                    has_left, right, ..
                } => {
                    stats.inner_nodes += 1;
                    match node.node_type() {
                        NodeType::Split => stats.split_nodes += 1,
                        _ => stats.shrink_nodes += 1,
                    }
                    if has_left {
                        let left = index + node_width::<N, D>(node.node_type()) as u32;
                        stack.push((left, depth + 1));
                    } else {
                        stats.null_children += 1;
                    }
                    if right != 0 {
                        stack.push((right, depth + 1));
                    } else {
                        stats.null_children += 1;
                    }
                }
            }
        }
        if stats.leaf_nodes > 0 {
            stats.avg_depth = depth_sum as f64 / stats.leaf_nodes as f64;
            stats.avg_leaf_size = leaf_size_sum as f64 / stats.leaf_nodes as f64;
        }
        stats
    }
}

/// Statistics of a built tree, computed by [`BBDTree::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TreeStats {
    /// Number of inner (split + shrink) nodes.
    pub inner_nodes: usize,
    /// Number of leaf nodes.
    pub leaf_nodes: usize,
    /// Number of split nodes.
    pub split_nodes: usize,
    /// Number of shrink nodes.
    pub shrink_nodes: usize,
    /// Number of absent children of inner nodes.
    pub null_children: usize,
    /// Depth of the deepest leaf; the root is at depth 0.
    pub max_depth: usize,
    /// Mean leaf depth.
    pub avg_depth: f64,
    /// Mean number of points per leaf.
    pub avg_leaf_size: f64,
    /// Bytes occupied by the node arena.
    pub memory_usage_bytes: usize,
}

#[cfg(test)]
mod test;
