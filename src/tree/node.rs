//! Packed node encoding over the flat `u32` slot arena.
//!
//! Nodes of the three variants occupy different numbers of consecutive
//! slots, so "node index" means slot index of a node's header, not an
//! ordinal. The header slot packs, from the low bits up: a 2-bit type tag, a
//! 3-bit split dimension (split nodes only), a 1-bit has-left-child flag and
//! the right child's slot index in the remaining 26 bits. A right index of 0
//! means "no right child", which is unambiguous because slot 0 always holds
//! the root and the root is nobody's child. The left child is not stored at
//! all: when present it starts at `index + node_width(type)`.
//!
//! A leaf uses a second slot: its begin index sits in the 30 high bits of
//! the header and its end index fills the second slot. A shrink node embeds
//! its inner box right after the header, `2 * D` coordinates written as raw
//! bytes into whole slots.

use bytemuck::{bytes_of, cast_slice, cast_slice_mut, pod_read_unaligned};

use crate::geom::{Point, Rect};
use crate::r#type::CoordFloat;

const NODE_TYPE_BITS: u32 = 2;
const DIM_BITS: u32 = 3;
const LEFT_CHILD_BITS: u32 = 1;

const DIM_POS: u32 = NODE_TYPE_BITS;
const LEFT_CHILD_POS: u32 = NODE_TYPE_BITS + DIM_BITS;
const RIGHT_CHILD_POS: u32 = NODE_TYPE_BITS + DIM_BITS + LEFT_CHILD_BITS;
const LEAF_BEGIN_POS: u32 = NODE_TYPE_BITS;

const NODE_TYPE_MASK: u32 = (1 << NODE_TYPE_BITS) - 1;
const DIM_MASK: u32 = ((1 << DIM_BITS) - 1) << DIM_POS;
const LEFT_CHILD_MASK: u32 = ((1 << LEFT_CHILD_BITS) - 1) << LEFT_CHILD_POS;

pub(crate) const MAX_RIGHT_INDEX: u32 = (1 << (32 - RIGHT_CHILD_POS)) - 1;
pub(crate) const MAX_LEAF_INDEX: u32 = (1 << (32 - LEAF_BEGIN_POS)) - 1;

/// The largest supported dimension: the split dimension field is
/// [`DIM_BITS`] wide.
pub const MAX_DIM: usize = 1 << DIM_BITS;

/// Discriminates the three node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Inner node bisecting its box at the midpoint of one dimension.
    Split = 0,
    /// Inner node carving an inner box out of its box.
    Shrink = 1,
    /// Node referencing a contiguous range of the point array.
    Leaf = 2,
}

/// A decoded view of one node.
///
/// Child linkage is the raw encoding: `has_left` marks an implicit left
/// child starting at `index + node_width(..)`, `right` is the right child's
/// slot index with 0 meaning absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<N: CoordFloat, const D: usize> {
    /// Bisects the current box at the midpoint of `dim`. The split value is
    /// not stored; traversal recomputes it from the box it carries.
    Split {
        /// Dimension the box is bisected in.
        dim: usize,
        /// True if the implicitly addressed left child exists.
        has_left: bool,
        /// Slot index of the right child, 0 if absent.
        right: u32,
    },
    /// Splits the current box into `inner` (left child) and the remainder.
    /// The right child keeps the *parent* box, deliberately untightened.
    Shrink {
        /// True if the implicitly addressed left child exists.
        has_left: bool,
        /// Slot index of the right child, 0 if absent.
        right: u32,
        /// The embedded inner box.
        inner: Rect<N, D>,
    },
    /// References points `begin..end` of the tree's permuted point array.
    Leaf {
        /// First point index.
        begin: u32,
        /// One-past-last point index.
        end: u32,
    },
}

impl<N: CoordFloat, const D: usize> Node<N, D> {
    /// This node's type tag.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Split { .. } => NodeType::Split,
            Node::Shrink { .. } => NodeType::Shrink,
            Node::Leaf { .. } => NodeType::Leaf,
        }
    }
}

/// Slot width of a node of the given type.
///
/// This is the single source of truth for node sizes, shared by the encoder
/// and every traversal: the implicit left child of an inner node starts at
/// `index + node_width(parent_type)`, and skipping a node without descending
/// into it is the same arithmetic.
pub fn node_width<N: CoordFloat, const D: usize>(node_type: NodeType) -> usize {
    match node_type {
        NodeType::Split => 1,
        NodeType::Shrink => 1 + shrink_box_slots::<N, D>(),
        NodeType::Leaf => 2,
    }
}

/// Number of whole slots occupied by a shrink node's embedded box.
pub(crate) fn shrink_box_slots<N: CoordFloat, const D: usize>() -> usize {
    2 * D * N::BYTES_PER_ELEMENT / 4
}

pub(crate) fn node_type_of(header: u32) -> NodeType {
    match header & NODE_TYPE_MASK {
        0 => NodeType::Split,
        1 => NodeType::Shrink,
        2 => NodeType::Leaf,
        _ => unreachable!("corrupt node tag"),
    }
}

pub(crate) fn encode_inner_header(node_type: NodeType, dim: usize) -> u32 {
    debug_assert!(dim < MAX_DIM);
    node_type as u32 | ((dim as u32) << DIM_POS)
}

pub(crate) fn encode_leaf(begin: u32, end: u32) -> [u32; 2] {
    assert!(begin <= MAX_LEAF_INDEX, "point index overflows leaf encoding");
    [NodeType::Leaf as u32 | (begin << LEAF_BEGIN_POS), end]
}

pub(crate) fn set_left_child(header: &mut u32, exists: bool) {
    *header = (*header & !LEFT_CHILD_MASK) | ((exists as u32) << LEFT_CHILD_POS);
}

pub(crate) fn set_right_child(header: &mut u32, index: u32) {
    assert!(index <= MAX_RIGHT_INDEX, "node index overflows header encoding");
    *header = (*header & ((1 << RIGHT_CHILD_POS) - 1)) | (index << RIGHT_CHILD_POS);
}

/// Decode the node whose header sits at `index`.
pub(crate) fn decode<N: CoordFloat, const D: usize>(slots: &[u32], index: u32) -> Node<N, D> {
    let i = index as usize;
    let header = slots[i];
    let has_left = header & LEFT_CHILD_MASK != 0;
    let right = header >> RIGHT_CHILD_POS;
    match node_type_of(header) {
        NodeType::Split => Node::Split {
            dim: ((header & DIM_MASK) >> DIM_POS) as usize,
            has_left,
            right,
        },
        NodeType::Shrink => Node::Shrink {
            has_left,
            right,
            inner: read_rect(&slots[i + 1..i + 1 + shrink_box_slots::<N, D>()]),
        },
        NodeType::Leaf => Node::Leaf {
            begin: header >> LEAF_BEGIN_POS,
            end: slots[i + 1],
        },
    }
}

/// Read an embedded box back out of its payload slots.
///
/// The arena is `u32`-aligned, so `f64` coordinates are read unaligned from
/// the byte view rather than cast directly.
fn read_rect<N: CoordFloat, const D: usize>(slots: &[u32]) -> Rect<N, D> {
    let bytes: &[u8] = cast_slice(slots);
    let mut min = [N::zero(); D];
    let mut max = [N::zero(); D];
    for (i, c) in min.iter_mut().chain(max.iter_mut()).enumerate() {
        let offset = i * N::BYTES_PER_ELEMENT;
        *c = pod_read_unaligned(&bytes[offset..offset + N::BYTES_PER_ELEMENT]);
    }
    Rect::new(Point::new(min), Point::new(max))
}

/// Write an embedded box into its payload slots.
pub(crate) fn write_rect<N: CoordFloat, const D: usize>(slots: &mut [u32], rect: &Rect<N, D>) {
    let bytes: &mut [u8] = cast_slice_mut(slots);
    let coords = rect.min().coords().iter().chain(rect.max().coords());
    for (i, c) in coords.enumerate() {
        let offset = i * N::BYTES_PER_ELEMENT;
        bytes[offset..offset + N::BYTES_PER_ELEMENT].copy_from_slice(bytes_of(c));
    }
}
