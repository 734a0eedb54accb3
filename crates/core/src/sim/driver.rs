//! Cycle-driven injection loop.
//!
//! Each iteration of the loop runs three phases against one global cycle counter:
//! 1. **Admission:** Channels 0..8 in order each offer their head request once; an accepted
//!    request is stamped with the current cycle and handed to the memory system.
//! 2. **Advance:** The memory system is ticked exactly once and the cycle counter moves on.
//! 3. **Completion:** Addresses reported by the callbacks during the tick are matched to the
//!    oldest pending request with the same address and direction, and stamped with the new cycle.
//!
//! The loop ends once every request has completed. A memory system that never
//! accepts or never completes a request keeps the loop running forever.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::completion::CompletionIndex;
use super::distributor::ChannelQueue;
use super::logger::EventLogger;
use crate::common::constants::CHANNELS;
use crate::common::{AccessType, SimError, Transaction};
use crate::memory::MemorySystem;

/// Completions reported by the callbacks during one tick.
type Mailbox = Rc<RefCell<Vec<(u64, AccessType)>>>;

/// Outcome of one simulation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Cycles elapsed until the last completion.
    pub cycles: u64,
    /// Every transaction, in admission order, with both timing stamps set.
    pub transactions: Vec<Transaction>,
    /// Requests admitted per real channel.
    pub admitted_per_channel: [u64; CHANNELS],
    /// The memory system's own statistics dump.
    pub memory_stats: String,
    /// Clock period reported by the memory system.
    pub tck_ns: f64,
}

impl RunReport {
    /// Mean of `complete_cycle - issue_cycle` over all transactions; 0.0 for an empty run.
    pub fn average_latency(&self) -> f64 {
        if self.transactions.is_empty() {
            return 0.0;
        }
        let total: u64 = self.transactions.iter().filter_map(Transaction::latency).sum();
        total as f64 / self.transactions.len() as f64
    }

    /// Per-transaction latencies in admission order.
    pub fn latencies(&self) -> impl Iterator<Item = u64> + '_ {
        self.transactions.iter().filter_map(Transaction::latency)
    }

    /// Number of admitted transactions.
    pub fn admissions(&self) -> usize {
        self.transactions.len()
    }

    /// Number of matched completions.
    pub fn completions(&self) -> usize {
        self.transactions.iter().filter(|t| t.completed).count()
    }

    /// Wall-clock time simulated, in nanoseconds.
    pub fn elapsed_ns(&self) -> f64 {
        self.cycles as f64 * self.tck_ns
    }
}

/// Owns the channel queues and completion bookkeeping for one run.
pub struct SimulationDriver {
    queues: Vec<ChannelQueue>,
    cycle: u64,
    total: usize,
    completed: usize,
    slots: Vec<Transaction>,
    index: CompletionIndex,
    mailbox: Mailbox,
    admitted: [u64; CHANNELS],
}

impl SimulationDriver {
    /// Creates a driver over the distributor's channel queues, one per real
    /// channel.
    pub fn new(queues: Vec<ChannelQueue>) -> Result<Self, SimError> {
        if queues.len() != CHANNELS {
            return Err(SimError::ChannelCount {
                expected: CHANNELS,
                found: queues.len(),
            });
        }
        let total = queues.iter().map(ChannelQueue::len).sum();
        Ok(Self {
            queues,
            cycle: 0,
            total,
            completed: 0,
            slots: Vec::with_capacity(total),
            index: CompletionIndex::new(),
            mailbox: Rc::default(),
            admitted: [0; CHANNELS],
        })
    }

    /// Registers this driver's completion callbacks on `mem`, replacing any
    /// pair installed before.
    pub fn attach(&self, mem: &mut dyn MemorySystem) {
        let reads = Rc::clone(&self.mailbox);
        let writes = Rc::clone(&self.mailbox);
        mem.register_callbacks(
            Box::new(move |address| reads.borrow_mut().push((address, AccessType::Read))),
            Box::new(move |address| writes.borrow_mut().push((address, AccessType::Write))),
        );
    }

    /// Current global cycle.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Requests admitted and not yet completed.
    pub const fn outstanding(&self) -> usize {
        self.index.pending_len()
    }

    /// Returns `true` once every request has completed.
    pub const fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    /// Runs one admission / advance / completion iteration.
    pub fn step(
        &mut self,
        mem: &mut dyn MemorySystem,
        mut logger: Option<&mut EventLogger>,
    ) -> Result<(), SimError> {
        if let Some(log) = logger.as_deref_mut() {
            log.set_cycle(self.cycle)?;
        }

        for (ch, queue) in self.queues.iter_mut().enumerate() {
            let Some(head) = queue.front() else {
                continue;
            };
            if !mem.will_accept(head.address, head.is_write) {
                continue;
            }
            let Some(mut t) = queue.pop_front() else {
                continue;
            };
            t.mark_issued(self.cycle);
            mem.add_transaction(t.address, t.is_write);
            self.index.insert(t.address, t.access(), self.slots.len());
            self.slots.push(t);
            self.admitted[ch] += 1;
            tracing::trace!(cycle = self.cycle, channel = ch, address = t.address, "admit");
            if let Some(log) = logger.as_deref_mut() {
                log.log_issue(&t)?;
            }
        }

        mem.tick();
        self.cycle += 1;

        let events = std::mem::take(&mut *self.mailbox.borrow_mut());
        if events.is_empty() {
            return Ok(());
        }
        if let Some(log) = logger.as_deref_mut() {
            log.set_cycle(self.cycle)?;
        }
        for (address, access) in events {
            let slot = self
                .index
                .complete(address, access)
                .ok_or(SimError::UnmatchedCompletion {
                    address,
                    access,
                    cycle: self.cycle,
                })?;
            let t = &mut self.slots[slot];
            t.mark_completed(self.cycle);
            self.completed += 1;
            tracing::trace!(cycle = self.cycle, address, latency = ?t.latency(), "complete");
            if let Some(log) = logger.as_deref_mut() {
                log.log_return(t)?;
            }
        }
        Ok(())
    }

    /// Runs until every request has completed and returns the report.
    pub fn run(
        mut self,
        mem: &mut dyn MemorySystem,
        mut logger: Option<&mut EventLogger>,
    ) -> Result<RunReport, SimError> {
        self.attach(mem);
        tracing::info!(transactions = self.total, "simulation start");
        while !self.is_done() {
            self.step(mem, logger.as_deref_mut())?;
        }
        if let Some(log) = logger {
            log.flush()?;
        }
        let report = RunReport {
            cycles: self.cycle,
            transactions: self.slots,
            admitted_per_channel: self.admitted,
            memory_stats: mem.stats_report(),
            tck_ns: mem.tck_ns(),
        };
        tracing::info!(
            cycles = report.cycles,
            avg_latency = report.average_latency(),
            "simulation finished"
        );
        Ok(report)
    }
}

impl fmt::Debug for SimulationDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationDriver")
            .field("cycle", &self.cycle)
            .field("total", &self.total)
            .field("completed", &self.completed)
            .field("outstanding", &self.index.pending_len())
            .finish_non_exhaustive()
    }
}

/// Runs one simulation of `queues` against `mem`.
///
/// # Arguments
///
/// * `mem` - Memory system; its callbacks are replaced for the duration of the run.
/// * `queues` - Real channel queues from the distributor.
/// * `logger` - Optional event log receiving every issue and return.
pub fn run_simulation(
    mem: &mut dyn MemorySystem,
    queues: Vec<ChannelQueue>,
    logger: Option<&mut EventLogger>,
) -> Result<RunReport, SimError> {
    SimulationDriver::new(queues)?.run(mem, logger)
}
