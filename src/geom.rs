//! Geometric primitives: fixed-dimensional points and axis-aligned boxes.

use std::ops::Index;

use crate::r#type::CoordFloat;

/// A point in `D`-dimensional space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<N: CoordFloat, const D: usize>([N; D]);

impl<N: CoordFloat, const D: usize> Point<N, D> {
    /// Create a point from its coordinate array.
    pub fn new(coords: [N; D]) -> Self {
        Self(coords)
    }

    /// The coordinate array of this point.
    pub fn coords(&self) -> &[N; D] {
        &self.0
    }

    /// Componentwise difference `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        let mut out = self.0;
        for (o, c) in out.iter_mut().zip(other.0) {
            *o = *o - c;
        }
        Self(out)
    }

    /// Squared euclidean length.
    pub fn length_sq(&self) -> N {
        self.0.iter().fold(N::zero(), |acc, c| acc + *c * *c)
    }

    /// Squared euclidean distance to another point.
    pub fn dist_sq(&self, other: &Self) -> N {
        let mut acc = N::zero();
        for (a, b) in self.0.iter().zip(other.0) {
            let d = *a - b;
            acc = acc + d * d;
        }
        acc
    }
}

impl<N: CoordFloat, const D: usize> Index<usize> for Point<N, D> {
    type Output = N;

    fn index(&self, dim: usize) -> &N {
        &self.0[dim]
    }
}

impl<N: CoordFloat, const D: usize> From<[N; D]> for Point<N, D> {
    fn from(coords: [N; D]) -> Self {
        Self(coords)
    }
}

/// A point plus an optional opaque payload. This is the unit stored in the
/// tree's point array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointObj<N: CoordFloat, const D: usize, T = ()> {
    /// The point's position.
    pub point: Point<N, D>,
    /// Caller-supplied payload carried alongside the point.
    pub data: T,
}

impl<N: CoordFloat, const D: usize> PointObj<N, D> {
    /// Create a point object without payload.
    pub fn new(coords: [N; D]) -> Self {
        Self {
            point: Point::new(coords),
            data: (),
        }
    }
}

impl<N: CoordFloat, const D: usize, T> PointObj<N, D, T> {
    /// Create a point object carrying a payload.
    pub fn with_data(coords: [N; D], data: T) -> Self {
        Self {
            point: Point::new(coords),
            data,
        }
    }
}

/// An axis-aligned box given by its min and max corners.
///
/// A valid box satisfies `min[d] <= max[d]` for all `d`. The empty box is
/// `min = +inf, max = -inf` so that [`include`][Rect::include] correctly
/// establishes the bounds from the first point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<N: CoordFloat, const D: usize> {
    min: Point<N, D>,
    max: Point<N, D>,
}

/// The outcome of splitting a box at the midpoint of one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectSplit<N: CoordFloat, const D: usize> {
    /// The dimension that was split.
    pub dim: usize,
    /// The split value; `left` ends at it and `right` starts at it.
    pub value: N,
    /// Sub-box below the split value.
    pub left: Rect<N, D>,
    /// Sub-box above the split value.
    pub right: Rect<N, D>,
}

impl<N: CoordFloat, const D: usize> Rect<N, D> {
    /// Create a box from its corners.
    pub fn new(min: Point<N, D>, max: Point<N, D>) -> Self {
        Self { min, max }
    }

    /// The empty box: including any point into it yields that point's
    /// degenerate bounding box.
    pub fn empty() -> Self {
        Self {
            min: Point::new([N::infinity(); D]),
            max: Point::new([N::neg_infinity(); D]),
        }
    }

    /// Min corner.
    pub fn min(&self) -> &Point<N, D> {
        &self.min
    }

    /// Max corner.
    pub fn max(&self) -> &Point<N, D> {
        &self.max
    }

    /// Grow the box to cover `point`.
    pub fn include(&mut self, point: &Point<N, D>) {
        for d in 0..D {
            self.min.0[d] = self.min.0[d].min(point.0[d]);
            self.max.0[d] = self.max.0[d].max(point.0[d]);
        }
    }

    /// True if `point` lies inside the box. Bounds are closed on both sides.
    pub fn contains(&self, point: &Point<N, D>) -> bool {
        for d in 0..D {
            if point.0[d] < self.min.0[d] || point.0[d] > self.max.0[d] {
                return false;
            }
        }
        true
    }

    /// Extent of the box in one dimension.
    pub fn extent(&self, dim: usize) -> N {
        self.max.0[dim] - self.min.0[dim]
    }

    /// Squared distance from `point` to the box, zero if the point is inside.
    pub fn dist_sq(&self, point: &Point<N, D>) -> N {
        let mut acc = N::zero();
        for d in 0..D {
            let dist = axis_dist(point.0[d], self.min.0[d], self.max.0[d]);
            acc = acc + dist * dist;
        }
        acc
    }

    /// Bounding box of a point set; the empty box for an empty slice.
    pub fn from_points<T>(objs: &[PointObj<N, D, T>]) -> Self {
        let mut rect = Self::empty();
        for obj in objs {
            rect.include(&obj.point);
        }
        rect
    }

    /// Split at the midpoint of the dimension with the largest extent, ties
    /// broken by the lowest dimension index. This is the "fair split" of the
    /// BBD construction: midpoint, not data median.
    pub fn split(&self) -> RectSplit<N, D> {
        let mut dim = 0;
        let mut largest = self.extent(0);
        for d in 1..D {
            let e = self.extent(d);
            if e > largest {
                largest = e;
                dim = d;
            }
        }
        self.split_at(dim)
    }

    /// Split at the midpoint of the given dimension.
    ///
    /// Split nodes store only the dimension; traversal recomputes the split
    /// value from the current box with this same function, so encoder and
    /// traversal can never disagree on the midpoint arithmetic.
    pub fn split_at(&self, dim: usize) -> RectSplit<N, D> {
        let two = N::one() + N::one();
        let value = self.min.0[dim] + self.extent(dim) / two;
        let mut left = *self;
        left.max.0[dim] = value;
        let mut right = *self;
        right.min.0[dim] = value;
        RectSplit {
            dim,
            value,
            left,
            right,
        }
    }
}

#[inline]
fn axis_dist<N: CoordFloat>(k: N, min: N, max: N) -> N {
    if k < min {
        min - k
    } else if k > max {
        k - max
    } else {
        N::zero()
    }
}
