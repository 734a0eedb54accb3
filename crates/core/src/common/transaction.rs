//! Memory transaction record.
//!
//! A `Transaction` is created by a generator or the trace loader, stamped once
//! when the memory system admits it and once when the completion callback
//! fires. After completion it is never touched again.

use std::fmt;

/// Direction of a memory request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessType {
    /// Read request; completion arrives on the read callback.
    Read,
    /// Write request; completion arrives on the write callback.
    Write,
}

impl AccessType {
    /// Maps a write flag onto a direction.
    #[inline]
    pub const fn from_is_write(is_write: bool) -> Self {
        if is_write { Self::Write } else { Self::Read }
    }

    /// Returns `true` for writes.
    #[inline]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }

    /// Single-letter trace file token (`R` or `W`).
    pub const fn token(self) -> &'static str {
        match self {
            Self::Read => "R",
            Self::Write => "W",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "READ"),
            Self::Write => write!(f, "WRITE"),
        }
    }
}

/// A single memory request and its timing stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Physical address presented to the memory system.
    pub address: u64,
    /// `true` for a write, `false` for a read.
    pub is_write: bool,
    /// Cycle at which the memory system admitted the request.
    pub issue_cycle: u64,
    /// Cycle at which the completion callback matched the request.
    pub complete_cycle: u64,
    /// Set once the completion has been matched.
    pub completed: bool,
}

impl Transaction {
    /// Creates a fresh, unissued transaction.
    ///
    /// # Arguments
    ///
    /// * `address` - Physical address of the request.
    /// * `is_write` - Direction flag.
    #[inline]
    pub const fn new(address: u64, is_write: bool) -> Self {
        Self {
            address,
            is_write,
            issue_cycle: 0,
            complete_cycle: 0,
            completed: false,
        }
    }

    /// Shorthand for a read request.
    #[inline]
    pub const fn read(address: u64) -> Self {
        Self::new(address, false)
    }

    /// Shorthand for a write request.
    #[inline]
    pub const fn write(address: u64) -> Self {
        Self::new(address, true)
    }

    /// Returns the request direction.
    #[inline]
    pub const fn access(&self) -> AccessType {
        AccessType::from_is_write(self.is_write)
    }

    /// Records the admission cycle.
    pub(crate) const fn mark_issued(&mut self, cycle: u64) {
        self.issue_cycle = cycle;
    }

    /// Records the completion cycle and flags the transaction as done.
    pub(crate) const fn mark_completed(&mut self, cycle: u64) {
        self.complete_cycle = cycle;
        self.completed = true;
    }

    /// Cycles between admission and completion, or `None` while in flight.
    pub const fn latency(&self) -> Option<u64> {
        if self.completed {
            Some(self.complete_cycle.saturating_sub(self.issue_cycle))
        } else {
            None
        }
    }
}
