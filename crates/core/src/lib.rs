//! DRAM trace injection harness library.
//!
//! This crate drives a cycle-driven memory timing model with synthetic and
//! file-based access traces. It provides:
//! 1. **Remap:** Bit-permutation address remapping with validated tables and named presets.
//! 2. **Trace:** Sequential, column-wise, cube-wise, strided and stage-wise generators, plus trace file I/O.
//! 3. **Simulation:** Pseudo-channel distribution, the admission/tick/completion loop and its event log.
//! 4. **Memory:** The `MemorySystem` capability trait and deterministic built-in models.
//! 5. **Configuration and statistics:** JSON configuration and run reporting.

/// Common types and constants (transactions, channel counts, errors).
pub mod common;
/// Harness configuration (defaults, hierarchical config structures).
pub mod config;
/// Memory system contract and built-in timing models.
pub mod memory;
/// Bit-permutation address remapping.
pub mod remap;
/// Channel distribution, simulation loop and event logging.
pub mod sim;
/// Run statistics and reporting.
pub mod stats;
/// Trace generators and trace file I/O.
pub mod trace;

pub use crate::common::{AccessType, HarnessError, Transaction};
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Capability interface of the memory timing model; build a built-in one with `build_memory`.
pub use crate::memory::{MemorySystem, build_memory};
pub use crate::remap::{BitPermutationTable, MappingPreset, remap};
pub use crate::sim::{EventLogger, PreprocessStrategy, RunReport, Verbosity};
pub use crate::stats::RunStats;
