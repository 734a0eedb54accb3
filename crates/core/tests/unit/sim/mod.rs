/// Pending-completion index.
pub mod completion;

/// Channel distribution.
pub mod distributor;

/// Simulation loop.
pub mod driver;
