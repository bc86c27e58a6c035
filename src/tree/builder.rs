//! Tree construction: plain fair splits and midpoint splits with shrinking.

use crate::geom::{Point, PointObj, Rect, RectSplit};
use crate::r#type::CoordFloat;
use crate::tree::node::{
    self, encode_inner_header, encode_leaf, node_width, write_rect, NodeType,
};
use crate::tree::{BBDTree, BuildVariant};

/// Construction context: the growing node arena, the point array being
/// permuted in place, and one scratch buffer allocated up front and reused
/// by every partition.
pub(crate) struct TreeBuilder<N: CoordFloat, const D: usize, T: Clone> {
    nodes: Vec<u32>,
    points: Vec<PointObj<N, D, T>>,
    scratch: Vec<PointObj<N, D, T>>,
    leaf_max_size: usize,
}

impl<N: CoordFloat, const D: usize, T: Clone> TreeBuilder<N, D, T> {
    pub(crate) fn new(leaf_max_size: usize, points: Vec<PointObj<N, D, T>>) -> Self {
        let scratch = points.clone();
        Self {
            nodes: Vec::new(),
            points,
            scratch,
            leaf_max_size,
        }
    }

    /// Run the selected construction and hand the arena over to the tree.
    pub(crate) fn build(mut self, variant: BuildVariant) -> BBDTree<N, D, T> {
        let bounds = Rect::from_points(&self.points);
        let len = self.points.len();
        if len > 0 {
            match variant {
                BuildVariant::BasicSplit => {
                    self.build_basic(bounds, 0, len);
                }
                BuildVariant::MidpointSplit => {
                    self.build_midpoint(bounds, 0, len);
                }
            }
        }
        BBDTree {
            nodes: self.nodes,
            points: self.points,
            bounds,
        }
    }

    /// Recursive plain fair split. Returns the new node's slot index, or 0
    /// for an empty range (only the root can sit at slot 0, so 0 doubles as
    /// "no child").
    fn build_basic(&mut self, bounds: Rect<N, D>, beg: usize, end: usize) -> u32 {
        if beg == end {
            return 0;
        }
        if end - beg <= self.leaf_max_size {
            return self.add_leaf(beg, end);
        }
        let split = bounds.split();
        if !splits_strictly(&bounds, &split) {
            // the box cannot shrink any further; recursing would not reduce
            // the range, so close it off as an oversized leaf
            return self.add_leaf(beg, end);
        }
        let parent = self.add_split(split.dim);
        let mid = self.partition(beg, end, |p| p[split.dim] < split.value);
        let left = self.build_basic(split.left, beg, mid);
        if left != 0 {
            self.set_left(parent);
        }
        let right = self.build_basic(split.right, mid, end);
        if right != 0 {
            self.set_right(parent, right);
        }
        parent
    }

    /// Recursive midpoint split with shrinking.
    ///
    /// Repeatedly keeps the bigger half of a fair split while that half still
    /// holds more than 2/3 of the range's points (and more than a leaf's
    /// worth). A single split is materially a plain split node; more than one
    /// becomes a shrink node whose inner box is the final shrunken box.
    fn build_midpoint(&mut self, bounds: Rect<N, D>, beg: usize, end: usize) -> u32 {
        if beg == end {
            return 0;
        }
        if end - beg <= self.leaf_max_size {
            return self.add_leaf(beg, end);
        }

        let mut inner = bounds;
        let mut sub_beg = beg;
        let mut sub_end = end;
        let mut first_split: Option<(RectSplit<N, D>, usize)> = None;
        let mut split_count = 0usize;
        while 3 * (sub_end - sub_beg) > 2 * (end - beg) && sub_end - sub_beg > self.leaf_max_size
        {
            let split = inner.split();
            if !splits_strictly(&inner, &split) {
                // all remaining extent is gone (coincident points); no
                // sequence of splits can reduce the range below this
                return self.add_leaf(beg, end);
            }
            let mid = self.partition(sub_beg, sub_end, |p| p[split.dim] < split.value);
            if mid - sub_beg >= sub_end - mid {
                inner = split.left;
                sub_end = mid;
            } else {
                inner = split.right;
                sub_beg = mid;
            }
            if split_count == 0 {
                first_split = Some((split, mid));
            }
            split_count += 1;
        }

        if split_count == 1 {
            // first_split partitioned the original range, so recurse on the
            // true halves of that one split
            let (split, mid) = first_split.take().expect("one split recorded");
            let parent = self.add_split(split.dim);
            let left = self.build_midpoint(split.left, beg, mid);
            if left != 0 {
                self.set_left(parent);
            }
            let right = self.build_midpoint(split.right, mid, end);
            if right != 0 {
                self.set_right(parent, right);
            }
            parent
        } else {
            // re-partition the original range by membership in the final
            // shrunken box; the outer child keeps the untightened parent box
            let mid = self.partition(beg, end, |p| inner.contains(p));
            let parent = self.add_shrink(&inner);
            let left = self.build_midpoint(inner, beg, mid);
            if left != 0 {
                self.set_left(parent);
            }
            let right = self.build_midpoint(bounds, mid, end);
            if right != 0 {
                self.set_right(parent, right);
            }
            parent
        }
    }

    /// Partition `points[beg..end]` so that points satisfying `is_left` come
    /// first; returns the index of the first right point. Scatters into the
    /// scratch buffer (left from the low end, right from the high end) and
    /// copies back, leaving the scratch free for the sibling partition.
    fn partition<F>(&mut self, beg: usize, end: usize, is_left: F) -> usize
    where
        F: Fn(&Point<N, D>) -> bool,
    {
        let mut lo = beg;
        let mut hi = end;
        for i in beg..end {
            if is_left(&self.points[i].point) {
                self.scratch[lo] = self.points[i].clone();
                lo += 1;
            } else {
                hi -= 1;
                self.scratch[hi] = self.points[i].clone();
            }
        }
        self.points[beg..end].clone_from_slice(&self.scratch[beg..end]);
        lo
    }

    fn add_split(&mut self, dim: usize) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(encode_inner_header(NodeType::Split, dim));
        index
    }

    fn add_shrink(&mut self, inner: &Rect<N, D>) -> u32 {
        let index = self.nodes.len();
        self.nodes.push(encode_inner_header(NodeType::Shrink, 0));
        self.nodes
            .resize(index + node_width::<N, D>(NodeType::Shrink), 0);
        write_rect(&mut self.nodes[index + 1..], inner);
        index as u32
    }

    fn add_leaf(&mut self, beg: usize, end: usize) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.extend(encode_leaf(beg as u32, end as u32));
        index
    }

    fn set_left(&mut self, index: u32) {
        node::set_left_child(&mut self.nodes[index as usize], true);
    }

    fn set_right(&mut self, index: u32, child: u32) {
        node::set_right_child(&mut self.nodes[index as usize], child);
    }
}

/// True if the split value strictly separates the box's interval in the
/// split dimension. Fails for zero-extent boxes and for boxes so thin that
/// the midpoint rounds onto a bound, both of which would make splitting loop
/// without reducing anything.
fn splits_strictly<N: CoordFloat, const D: usize>(
    bounds: &Rect<N, D>,
    split: &RectSplit<N, D>,
) -> bool {
    bounds.min()[split.dim] < split.value && split.value < bounds.max()[split.dim]
}
