//! Fixed-capacity bounded priority queues.
//!
//! A bounded queue keeps the `k` smallest values pushed into it and evicts
//! its current worst value when pushed past capacity. The k-NN search uses
//! one as its candidate set; the queue's worst retained value is the running
//! k-th-best distance that drives the traversal's stopping rule.
//!
//! Three implementations share the same observable behavior but different
//! cost profiles, selected per query via [`QueueStrategy`].

mod heap;
mod linear;
mod std_heap;

pub use heap::HeapPriQueue;
pub use linear::LinearPriQueue;
pub use std_heap::StdPriQueue;

/// A priority queue of fixed capacity `k` holding the smallest values seen.
///
/// Ordering comes from `T: Ord` with smaller meaning better. Once the queue
/// is full, a pushed value is retained only if it is strictly smaller than
/// the current worst value, which gets evicted.
pub trait FixedPriQueue<T: Copy + Ord> {
    /// Clear any previous state and reinitialize with capacity `k`.
    fn reset(&mut self, k: usize);

    /// Push a value, evicting the worst retained value if at capacity.
    fn push(&mut self, value: T);

    /// The best (smallest) retained value, `None` if empty.
    fn first(&self) -> Option<T>;

    /// The worst (largest) retained value, `None` if empty.
    fn last(&self) -> Option<T>;

    /// Number of values currently retained.
    fn len(&self) -> usize;

    /// True if nothing is retained.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the queue has reached its capacity.
    fn is_full(&self) -> bool;

    /// All retained values, in unspecified order.
    fn values(&self) -> Vec<T>;
}

/// Selects which bounded queue implementation backs a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStrategy {
    /// Unsorted array; O(k) rescan of the worst value only when the worst is
    /// replaced. Good for small `k`.
    Linear,
    /// Hand-rolled binary max-heap keyed worst-at-root; O(log k) push.
    Heap,
    /// [`std::collections::BinaryHeap`] baseline with the same asymptotics.
    Std,
}

impl QueueStrategy {
    /// Create a queue of this strategy with capacity `k`.
    pub fn new_queue<T: Copy + Ord + 'static>(self, k: usize) -> Box<dyn FixedPriQueue<T>> {
        match self {
            Self::Linear => Box::new(LinearPriQueue::new(k)),
            Self::Heap => Box::new(HeapPriQueue::new(k)),
            Self::Std => Box::new(StdPriQueue::new(k)),
        }
    }
}
