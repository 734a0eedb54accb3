//! # Unit Components
//!
//! One module per harness component: remapping, trace sources, distribution,
//! the simulation loop and its log, the built-in memory models, configuration
//! and statistics.



/// Bit-permutation remapping and presets.
pub mod remap;

/// Distributor, completion index, driver, logger and run composition.
pub mod sim;
