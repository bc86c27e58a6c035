use std::collections::BinaryHeap;

use crate::queue::FixedPriQueue;

/// Bounded priority queue over [`std::collections::BinaryHeap`].
///
/// `BinaryHeap` is a max-heap, so with smaller-is-better ordering its root is
/// the worst retained value: push unconditionally, then pop the root when
/// over capacity. Baseline implementation for the hand-rolled
/// [`HeapPriQueue`][crate::queue::HeapPriQueue].
#[derive(Debug, Clone)]
pub struct StdPriQueue<T: Ord> {
    heap: BinaryHeap<T>,
    k: usize,
    first: Option<T>,
}

impl<T: Copy + Ord> StdPriQueue<T> {
    /// Create an empty queue with capacity `k`.
    pub fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
            first: None,
        }
    }
}

impl<T: Copy + Ord> FixedPriQueue<T> for StdPriQueue<T> {
    fn reset(&mut self, k: usize) {
        self.heap.clear();
        self.heap.reserve(k + 1);
        self.k = k;
        self.first = None;
    }

    fn push(&mut self, value: T) {
        if self.k == 0 {
            return;
        }
        if self.first.map_or(true, |f| value < f) {
            self.first = Some(value);
        }
        self.heap.push(value);
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    fn first(&self) -> Option<T> {
        if self.heap.is_empty() {
            None
        } else {
            self.first
        }
    }

    fn last(&self) -> Option<T> {
        self.heap.peek().copied()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn is_full(&self) -> bool {
        self.heap.len() == self.k
    }

    fn values(&self) -> Vec<T> {
        self.heap.iter().copied().collect()
    }
}
