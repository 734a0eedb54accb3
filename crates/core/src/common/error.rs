//! Error types for the harness.
//!
//! This module mirrors the three failure classes of a run:
//! 1. **Configuration:** Invalid permutation tables, unreadable or malformed config files.
//! 2. **Trace:** Unreadable trace files and malformed trace lines.
//! 3. **Simulation:** Classification precondition violations and unmatched completions.
//!
//! All of them are fatal to a run. `HarnessError` wraps them for the top-level
//! composition so callers can use a single `?`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::transaction::AccessType;

/// Errors raised while building or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The permutation table does not have one entry per address bit.
    #[error("bit map has {len} entries, expected 64")]
    BitMapLength {
        /// Number of entries supplied.
        len: usize,
    },

    /// A permutation entry points outside the 64-bit address.
    #[error("bit map entry {position} maps to bit {target}, which is out of range")]
    BitOutOfRange {
        /// Source bit position.
        position: usize,
        /// Offending destination bit.
        target: usize,
    },

    /// Two source bits map onto the same destination bit.
    #[error("bit map entries {first} and {second} both map to bit {target}")]
    DuplicateBit {
        /// First source position using `target`.
        first: usize,
        /// Second source position using `target`.
        second: usize,
        /// Destination bit claimed twice.
        target: usize,
    },

    /// A mapping section names both a preset and an explicit bit map.
    #[error("mapping specifies both preset '{0}' and an explicit bit_map")]
    AmbiguousMapping(String),

    /// A generator or model parameter is out of its valid domain.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the configuration.
        name: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("could not read config '{path}': {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for `Config`.
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while reading or writing trace files.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be opened, read or written.
    #[error("trace file '{path}': {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A trace line does not have the `<hex address> <R|W>` shape.
    #[error("malformed trace line {line}: '{content}' ({reason})")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// Offending line, trimmed.
        content: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Errors raised by the distributor and the simulation driver.
#[derive(Debug, Error)]
pub enum SimError {
    /// The memory system classified an address outside the pseudo-channel range.
    #[error("address {address:#x} classified to pseudo-channel {channel}, expected 0..{limit}")]
    ChannelOutOfRange {
        /// Classified address.
        address: u64,
        /// Returned pseudo-channel id.
        channel: usize,
        /// Exclusive upper bound.
        limit: usize,
    },

    /// The driver was handed a queue set that does not match the channel count.
    #[error("driver needs {expected} channel queues, got {found}")]
    ChannelCount {
        /// Number of real channels.
        expected: usize,
        /// Number of queues supplied.
        found: usize,
    },

    /// A completion callback reported an address with nothing pending.
    #[error("{access} completion for {address:#x} at cycle {cycle} matches no pending transaction")]
    UnmatchedCompletion {
        /// Completed address.
        address: u64,
        /// Callback direction.
        access: AccessType,
        /// Cycle at which the completion was observed.
        cycle: u64,
    },

    /// An event log stream could not be created or written.
    #[error("event log: {0}")]
    Log(#[from] io::Error),
}

/// Umbrella error for a complete harness run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Trace failure.
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// Simulation failure.
    #[error(transparent)]
    Sim(#[from] SimError),
}
