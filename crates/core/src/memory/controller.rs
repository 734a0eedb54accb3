//! Latency models for the built-in memory system.
//!
//! This module provides:
//! 1. **FixedLatency:** Constant read and write latency (no row-buffer modeling).
//! 2. **RowBufferLatency:** Per-bank open-row tracking with CAS, RAS and precharge timing.
//! 3. **AddressGeometry:** The channel/bank/row field layout both models classify with.

use crate::common::constants::PSEUDO_CHANNELS;

/// Field layout of a physical address as seen by the built-in model.
///
/// Bits above `row_shift` form the row, `bank_bits` bits at `bank_shift` form
/// the bank, and four bits at `channel_shift` select the pseudo-channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressGeometry {
    /// Lowest bit of the pseudo-channel field.
    pub channel_shift: u32,
    /// Lowest bit of the bank field.
    pub bank_shift: u32,
    /// Width of the bank field.
    pub bank_bits: u32,
    /// Lowest bit of the row field.
    pub row_shift: u32,
}

impl AddressGeometry {
    /// Pseudo-channel of `address`.
    #[inline]
    pub const fn channel_of(&self, address: u64) -> usize {
        ((address >> self.channel_shift) as usize) & (PSEUDO_CHANNELS - 1)
    }

    /// Bank within the pseudo-channel.
    #[inline]
    pub const fn bank_of(&self, address: u64) -> usize {
        ((address >> self.bank_shift) as usize) & ((1usize << self.bank_bits) - 1)
    }

    /// Row index.
    #[inline]
    pub const fn row_of(&self, address: u64) -> u64 {
        address >> self.row_shift
    }

    /// Banks per pseudo-channel.
    #[inline]
    pub const fn banks(&self) -> usize {
        1usize << self.bank_bits
    }
}

/// A latency function: how many cycles a request takes once admitted.
pub trait LatencyModel {
    /// Returns the number of cycles the request at `address` takes.
    ///
    /// # Arguments
    ///
    /// * `address` - Physical address being accessed (may drive row-buffer state).
    /// * `is_write` - Request direction.
    fn access_latency(&mut self, address: u64, is_write: bool) -> u64;

    /// Model-specific counters as `(name, value)` pairs for the stats dump.
    fn counters(&self) -> Vec<(&'static str, u64)> {
        Vec::new()
    }
}

/// Fixed-latency model; every read and every write takes a constant number of cycles.
#[derive(Debug, Clone, Copy)]
pub struct FixedLatency {
    read: u64,
    write: u64,
}

impl FixedLatency {
    /// Creates a fixed model with separate read and write latencies in cycles.
    pub const fn new(read: u64, write: u64) -> Self {
        Self { read, write }
    }

    /// Same latency for both directions.
    pub const fn uniform(latency: u64) -> Self {
        Self::new(latency, latency)
    }
}

impl LatencyModel for FixedLatency {
    fn access_latency(&mut self, _address: u64, is_write: bool) -> u64 {
        if is_write { self.write } else { self.read }
    }
}

/// DRAM-style model with one row buffer per bank of every pseudo-channel.
#[derive(Debug, Clone)]
pub struct RowBufferLatency {
    open_rows: Vec<Option<u64>>,
    geometry: AddressGeometry,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
    hits: u64,
    conflicts: u64,
    cold: u64,
}

impl RowBufferLatency {
    /// Creates a row-buffer model with all banks precharged.
    ///
    /// # Arguments
    ///
    /// * `t_cas` - Column access strobe latency.
    /// * `t_ras` - Row activation latency.
    /// * `t_pre` - Precharge latency.
    /// * `geometry` - Address field layout used to locate banks and rows.
    pub fn new(t_cas: u64, t_ras: u64, t_pre: u64, geometry: AddressGeometry) -> Self {
        Self {
            open_rows: vec![None; PSEUDO_CHANNELS * geometry.banks()],
            geometry,
            t_cas,
            t_ras,
            t_pre,
            hits: 0,
            conflicts: 0,
            cold: 0,
        }
    }

    /// Row hits observed so far.
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Row conflicts (a different row was open) observed so far.
    pub const fn conflicts(&self) -> u64 {
        self.conflicts
    }
}

impl LatencyModel for RowBufferLatency {
    fn access_latency(&mut self, address: u64, _is_write: bool) -> u64 {
        let g = self.geometry;
        let slot = g.channel_of(address) * g.banks() + g.bank_of(address);
        let row = g.row_of(address);
        match self.open_rows[slot] {
            Some(open) if open == row => {
                self.hits += 1;
                self.t_cas
            }
            Some(_) => {
                self.conflicts += 1;
                self.open_rows[slot] = Some(row);
                self.t_pre + self.t_ras + self.t_cas
            }
            None => {
                self.cold += 1;
                self.open_rows[slot] = Some(row);
                self.t_ras + self.t_cas
            }
        }
    }

    fn counters(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("row.hits", self.hits),
            ("row.conflicts", self.conflicts),
            ("row.cold", self.cold),
        ]
    }
}
