//! Simulation: channel distribution, the injection loop and its event log.
//!
//! This module provides:
//! 1. **Distributor:** Pseudo-channel classification and pairwise channel merge.
//! 2. **Completion index:** FIFO matching of address-only completion callbacks.
//! 3. **Driver:** The admission / tick / completion cycle loop.
//! 4. **Logger:** Cycle-deduplicated issue and return streams.
//! 5. **Runner:** Composition of trace preparation, distribution and simulation.

/// Pending-completion index.
pub mod completion;

/// Channel distribution preprocessor.
pub mod distributor;

/// Cycle-driven injection loop.
pub mod driver;

/// Three-stream event logger.
pub mod logger;

/// End-to-end run composition.
pub mod runner;

pub use completion::CompletionIndex;
pub use distributor::{ChannelQueue, PreprocessStrategy, distribute, distribute_banked};
pub use driver::{RunReport, SimulationDriver, run_simulation};
pub use logger::{EventLogger, Verbosity};
pub use runner::{prepare_trace, run, simulate_trace};
