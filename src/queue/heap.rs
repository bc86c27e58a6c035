use crate::queue::FixedPriQueue;

/// Bounded priority queue over a hand-rolled binary max-heap.
///
/// The heap is keyed worst-at-root so that eviction is a root replacement
/// plus sift-down. The heap invariant says nothing about where the best
/// value sits, so the best seen so far is tracked separately; a new overall
/// best is by definition smaller than its parent and needs no sift-up.
#[derive(Debug, Clone)]
pub struct HeapPriQueue<T> {
    heap: Vec<T>,
    k: usize,
    first: Option<T>,
}

impl<T: Copy + Ord> HeapPriQueue<T> {
    /// Create an empty queue with capacity `k`.
    pub fn new(k: usize) -> Self {
        Self {
            heap: Vec::with_capacity(k),
            k,
            first: None,
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) >> 1;
            if self.heap[i] < self.heap[parent] {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self) {
        let mut i = 0;
        loop {
            let left = (i << 1) + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let larger = if right < self.heap.len() && self.heap[left] < self.heap[right] {
                right
            } else {
                left
            };
            if self.heap[larger] < self.heap[i] {
                break;
            }
            self.heap.swap(i, larger);
            i = larger;
        }
    }
}

impl<T: Copy + Ord> FixedPriQueue<T> for HeapPriQueue<T> {
    fn reset(&mut self, k: usize) {
        self.heap.clear();
        self.heap.reserve(k);
        self.k = k;
        self.first = None;
    }

    fn push(&mut self, value: T) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            let i = self.heap.len();
            self.heap.push(value);
            if self.first.map_or(true, |f| value < f) {
                self.first = Some(value);
            } else {
                self.sift_up(i);
            }
        } else if value < self.heap[0] {
            // replace the worst at the root
            self.heap[0] = value;
            if self.first.map_or(true, |f| value < f) {
                self.first = Some(value);
            }
            self.sift_down();
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
        self.heap.first().copied()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn is_full(&self) -> bool {
        self.heap.len() == self.k
    }

    fn values(&self) -> Vec<T> {
        self.heap.clone()
    }
}
