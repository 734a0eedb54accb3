//! Trace sources: synthetic generators, stage-wise transform patterns and trace files.

/// Sequential, column-wise, cube-wise and strided generators.
pub mod generator;

/// Trace file reader and writer.
pub mod loader;

/// Stage-wise transform access patterns and their sweeps.
pub mod stage;

pub use loader::{load_trace, parse_trace, write_trace};
pub use stage::{StageGeometry, StageVariant};
