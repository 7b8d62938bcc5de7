//! Bounded, newest-first history of period records

use std::collections::VecDeque;

/// Position in a [`History`]'s insertion sequence
///
/// Obtained from [`History::mark`]; records inserted afterwards are returned
/// by [`History::since`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(u64);

/// Capacity-limited list whose head is the newest record
///
/// Inserting at capacity evicts the oldest record.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<(u64, T)>,
    capacity: usize,
    next_seq: u64,
}

impl<T> History<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    /// Insert at the head, returning the evicted tail if the history was full
    pub fn push(&mut self, record: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_back().map(|(_, r)| r)
        } else {
            None
        };
        self.entries.push_front((self.next_seq, record));
        self.next_seq += 1;
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest record
    pub fn head(&self) -> Option<&T> {
        self.entries.front().map(|(_, r)| r)
    }

    /// Oldest record
    pub fn tail(&self) -> Option<&T> {
        self.entries.back().map(|(_, r)| r)
    }

    /// Walk head to tail (newest to oldest)
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter().map(|(_, r)| r)
    }

    /// Walk tail to head (oldest to newest)
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &T> {
        self.iter().rev()
    }

    /// Mark the current end of the insertion sequence
    pub fn mark(&self) -> Mark {
        Mark(self.next_seq)
    }

    /// Records inserted at or after `mark` that are still held, oldest first
    pub fn since(&self, mark: Mark) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .rev()
            .filter(move |(seq, _)| *seq >= mark.0)
            .map(|(_, r)| r)
    }
}
