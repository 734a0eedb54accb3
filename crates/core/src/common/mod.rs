//! Common types shared by every stage of the harness.
//!
//! This module provides the building blocks the other modules agree on:
//! 1. **Transactions:** The request record that flows from generator to driver.
//! 2. **Constants:** Channel counts and default burst geometry.
//! 3. **Error Handling:** Configuration, trace and simulation error types.

/// Channel counts and default memory geometry.
pub mod constants;

/// Error types for configuration, trace loading and simulation.
pub mod error;

/// Transaction record and access direction.
pub mod transaction;

pub use constants::{CHANNELS, PSEUDO_CHANNELS};
pub use error::{ConfigError, HarnessError, SimError, TraceError};
pub use transaction::{AccessType, Transaction};
