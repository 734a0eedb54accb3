//! Pending-completion index.
//!
//! Completion callbacks report only an address, so several in-flight requests
//! to the same address are told apart by arrival order: each `(address,
//! direction)` key owns a FIFO of driver slots.

use std::collections::{HashMap, VecDeque};

use crate::common::AccessType;

/// FIFO-per-key index from `(address, direction)` to pending transaction slots.
#[derive(Debug, Default)]
pub struct CompletionIndex {
    pending: HashMap<(u64, AccessType), VecDeque<usize>>,
    len: usize,
}

impl CompletionIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `slot` as waiting for a completion of `address` in direction `access`.
    pub fn insert(&mut self, address: u64, access: AccessType, slot: usize) {
        self.pending
            .entry((address, access))
            .or_default()
            .push_back(slot);
        self.len += 1;
    }

    /// Matches one completion to the oldest pending slot with the same key.
    ///
    /// Returns `None` when nothing with that address and direction is pending.
    pub fn complete(&mut self, address: u64, access: AccessType) -> Option<usize> {
        let key = (address, access);
        let queue = self.pending.get_mut(&key)?;
        let slot = queue.pop_front()?;
        if queue.is_empty() {
            let _ = self.pending.remove(&key);
        }
        self.len -= 1;
        Some(slot)
    }

    /// Slots still waiting for a completion.
    pub const fn pending_len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no completion is outstanding.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
