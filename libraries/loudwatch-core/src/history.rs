//! Measurement history ring
//!
//! Fixed-capacity circular buffer of loudness values, one slot per graph
//! column. Slots start at negative infinity ("no data yet") and the newest
//! write overwrites the oldest slot once the ring is full.

use crate::error::{CoreError, Result};
use std::iter::Chain;
use std::slice::Iter;
use tracing::trace;

/// Single-headed ring of loudness values
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRing {
    slots: Vec<f64>,
    /// Next slot to write, which is also the oldest entry
    head: usize,
}

/// Oldest-to-newest view of a [`HistoryRing`]
pub type HistoryIter<'a> = std::iter::Copied<Chain<Iter<'a, f64>, Iter<'a, f64>>>;

impl HistoryRing {
    /// Create a ring with `capacity` empty slots
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCapacity`] for a zero capacity
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CoreError::InvalidCapacity);
        }
        Ok(Self {
            slots: vec![f64::NEG_INFINITY; capacity],
            head: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Store `value` in the oldest slot and advance the head
    pub fn write(&mut self, value: f64) {
        trace!(
            "Writing measurement into history of size {} at head {}",
            self.slots.len(),
            self.head
        );
        self.slots[self.head] = value;
        self.head = (self.head + 1) % self.slots.len();
    }

    /// All slots from oldest to newest
    ///
    /// Borrowing the ring keeps it intact; every call starts over.
    pub fn read_chronological(&self) -> HistoryIter<'_> {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }

    /// Most recently written value, if any write happened since the last reset
    pub fn latest(&self) -> f64 {
        let index = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots[index]
    }

    /// Reallocate to `capacity` empty slots, dropping all history
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCapacity`] for a zero capacity; the ring is
    /// left untouched in that case
    pub fn reset(&mut self, capacity: usize) -> Result<()> {
        *self = Self::new(capacity)?;
        Ok(())
    }
}
