//! The memory system collaborator.
//!
//! The harness drives an external cycle-accurate DRAM timing model through the
//! `MemorySystem` capability trait. This module provides:
//! 1. **Contract:** `MemorySystem`, the tick / admission / callback / classification interface.
//! 2. **Latency models:** Fixed and row-buffer-aware latency functions (`controller`).
//! 3. **Built-in model:** `QueuedMemory`, a deterministic bounded-queue model (`queued`).
//! 4. **Construction:** `build_memory` selects a built-in model from configuration.

/// Latency functions used by the built-in model.
pub mod controller;

/// Bounded-queue memory system built on a latency model.
pub mod queued;

use crate::config::{MemoryConfig, MemoryModel};

pub use controller::{FixedLatency, LatencyModel, RowBufferLatency};
pub use queued::QueuedMemory;

/// Completion callback: receives the completed address only. The direction is
/// implied by which of the two registered callbacks fires.
pub type CompletionCallback = Box<dyn FnMut(u64)>;

/// Capability interface of a cycle-driven memory timing model.
///
/// Implementations are single-threaded: callbacks are invoked synchronously
/// from inside `tick`.
pub trait MemorySystem {
    /// Advances the timing model by one cycle, firing completion callbacks.
    fn tick(&mut self);

    /// Returns `true` if a request for `address` would be admitted this cycle.
    fn will_accept(&self, address: u64, is_write: bool) -> bool;

    /// Submits a request. Only valid right after `will_accept` returned `true`
    /// in the same cycle.
    fn add_transaction(&mut self, address: u64, is_write: bool);

    /// Installs the read and write completion callbacks, replacing any
    /// previously registered pair.
    fn register_callbacks(&mut self, on_read: CompletionCallback, on_write: CompletionCallback);

    /// Pseudo-channel of `address`, expected in `0..PSEUDO_CHANNELS`.
    fn channel_of(&self, address: u64) -> usize;

    /// Flat bank id of `address` within its pseudo-channel. Models without a
    /// bank decode report every address on bank 0.
    fn bank_of(&self, _address: u64) -> usize {
        0
    }

    /// Data bus width in bits.
    fn bus_bits(&self) -> u64;

    /// Beats per burst.
    fn burst_length(&self) -> u64;

    /// Bytes moved by one burst.
    fn burst_size(&self) -> u64 {
        self.bus_bits() / 8 * self.burst_length()
    }

    /// Clock period in nanoseconds.
    fn tck_ns(&self) -> f64;

    /// The model's own statistics dump, surfaced unmodified by the harness.
    fn stats_report(&self) -> String;
}

/// Builds the built-in memory system described by `config`.
///
/// # Arguments
///
/// * `config` - Memory section of the harness configuration.
///
/// # Returns
///
/// A boxed memory system with no callbacks registered.
pub fn build_memory(config: &MemoryConfig) -> Box<dyn MemorySystem> {
    match config.model {
        MemoryModel::Fixed => Box::new(QueuedMemory::new(
            FixedLatency::new(config.read_latency, config.write_latency),
            config,
        )),
        MemoryModel::RowBuffer => Box::new(QueuedMemory::new(
            RowBufferLatency::new(config.t_cas, config.t_ras, config.t_pre, config.geometry()),
            config,
        )),
    }
}
