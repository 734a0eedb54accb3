//! End-to-end composition of a run.
//!
//! Resolves the workload (synthetic generator or trace file), applies the
//! configured address remapping, distributes the result over the channels
//! and drives it through a memory system.

use super::distributor::{self, PreprocessStrategy};
use super::driver::{RunReport, run_simulation};
use super::logger::EventLogger;
use crate::common::{HarnessError, Transaction};
use crate::config::Config;
use crate::memory::MemorySystem;
use crate::remap;
use crate::trace;

/// Builds the trace a run will inject: the configured workload, remapped.
///
/// # Arguments
///
/// * `config` - Harness configuration; `workload` selects the source and
///   `mapping` the optional bit permutation.
///
/// # Returns
///
/// The remapped trace, or the first configuration or trace error. Nothing is
/// simulated when this fails.
pub fn prepare_trace(config: &Config) -> Result<Vec<Transaction>, HarnessError> {
    let table = config.remap_table()?;
    let raw = match config.workload.synthesize()? {
        Some(trace) => trace,
        None => trace::load_trace(&config.general.trace_path)?,
    };
    let trace = match table {
        Some(table) if !table.is_identity() => remap::remap_all(&raw, &table),
        _ => raw,
    };
    tracing::info!(transactions = trace.len(), "trace prepared");
    Ok(trace)
}

/// Distributes `trace` over `mem`'s channels and simulates it.
///
/// # Arguments
///
/// * `trace` - Requests in issue order.
/// * `mem` - Memory system; also classifies addresses into pseudo-channels.
/// * `strategy` - Bucket ordering policy.
/// * `logger` - Optional event log.
pub fn simulate_trace(
    trace: &[Transaction],
    mem: &mut dyn MemorySystem,
    strategy: PreprocessStrategy,
    logger: Option<&mut EventLogger>,
) -> Result<RunReport, HarnessError> {
    let queues = distributor::distribute_banked(
        trace,
        |addr| mem.channel_of(addr),
        |addr| mem.bank_of(addr),
        strategy,
    )?;
    Ok(run_simulation(mem, queues, logger)?)
}

/// Prepares the configured trace and simulates it.
pub fn run(
    config: &Config,
    mem: &mut dyn MemorySystem,
    logger: Option<&mut EventLogger>,
) -> Result<RunReport, HarnessError> {
    let trace = prepare_trace(config)?;
    simulate_trace(&trace, mem, config.preprocess.strategy, logger)
}
