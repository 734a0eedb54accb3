//! Harness-wide constants.
//!
//! The channel counts describe the HBM2 stack the harness was built around:
//! sixteen pseudo-channels exposed by the memory system, paired into eight
//! physical channels by the distributor.

/// Number of pseudo-channel buckets the memory system classifies addresses into.
pub const PSEUDO_CHANNELS: usize = 16;

/// Number of real channel queues fed by the driver.
pub const CHANNELS: usize = PSEUDO_CHANNELS / 2;

/// Banks sharing one bank group; flat bank ids are grouped in runs of this size.
pub const BANKS_PER_GROUP: usize = 4;

/// Number of bits in a physical address handled by the remapper.
pub const ADDRESS_BITS: usize = 64;

/// Default logical element size in bytes (one 256-bit word).
pub const DEFAULT_ELEMENT_SIZE: u64 = 32;

/// Default number of logical elements per generated pattern.
pub const DEFAULT_NUM_ELEMENTS: u64 = 512;

/// Default burst size in bytes (128-bit bus, burst length 4).
pub const DEFAULT_BURST_SIZE: u64 = 64;
