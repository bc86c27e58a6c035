use crate::queue::FixedPriQueue;

/// Bounded priority queue over an unsorted array.
///
/// Tracks the positions of the best and worst retained values; pushing while
/// full replaces the worst in place and rescans for the new worst, so the
/// O(k) scan is only paid when the retained set actually changes.
#[derive(Debug, Clone)]
pub struct LinearPriQueue<T> {
    values: Vec<T>,
    k: usize,
    first: usize,
    last: usize,
}

impl<T: Copy + Ord> LinearPriQueue<T> {
    /// Create an empty queue with capacity `k`.
    pub fn new(k: usize) -> Self {
        Self {
            values: Vec::with_capacity(k),
            k,
            first: 0,
            last: 0,
        }
    }
}

impl<T: Copy + Ord> FixedPriQueue<T> for LinearPriQueue<T> {
    fn reset(&mut self, k: usize) {
        self.values.clear();
        self.values.reserve(k);
        self.k = k;
        self.first = 0;
        self.last = 0;
    }

    fn push(&mut self, value: T) {
        if self.k == 0 {
            return;
        }
        if self.values.len() < self.k {
            self.values.push(value);
            let i = self.values.len() - 1;
            if self.values[self.last] < value {
                self.last = i;
            } else if value < self.values[self.first] {
                self.first = i;
            }
            return;
        }
        // full: keep only if strictly better than the current worst
        if value < self.values[self.last] {
            self.values[self.last] = value;
            if value < self.values[self.first] {
                self.first = self.last;
            }
            for i in 0..self.values.len() {
                if self.values[self.last] < self.values[i] {
                    self.last = i;
                }
            }
        }
    }

    fn first(&self) -> Option<T> {
        self.values.get(self.first).copied()
    }

    fn last(&self) -> Option<T> {
        self.values.get(self.last).copied()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn is_full(&self) -> bool {
        self.values.len() == self.k
    }

    fn values(&self) -> Vec<T> {
        self.values.clone()
    }
}
