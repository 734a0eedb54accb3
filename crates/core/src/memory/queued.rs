//! Bounded-queue memory system.
//!
//! A deterministic stand-in for the external timing simulator: each
//! pseudo-channel accepts up to `queue_depth` in-flight requests, every
//! request completes after the latency its model assigns at admission, and
//! completions fire from `tick` in due-cycle order (admission order on ties).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::{self, Write as _};

use super::controller::{AddressGeometry, LatencyModel};
use super::{CompletionCallback, MemorySystem};
use crate::common::constants::PSEUDO_CHANNELS;
use crate::config::MemoryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    due: u64,
    seq: u64,
    address: u64,
    is_write: bool,
    channel: usize,
}

/// Memory system with a fixed queue bound per pseudo-channel.
pub struct QueuedMemory<L: LatencyModel> {
    model: L,
    geometry: AddressGeometry,
    queue_depth: usize,
    bus_bits: u64,
    burst_length: u64,
    tck_ns: f64,

    now: u64,
    seq: u64,
    pending: BinaryHeap<Reverse<Pending>>,
    in_flight: [usize; PSEUDO_CHANNELS],

    on_read: Option<CompletionCallback>,
    on_write: Option<CompletionCallback>,

    reads: u64,
    writes: u64,
    total_latency: u64,
    dropped_callbacks: u64,
    per_channel: [u64; PSEUDO_CHANNELS],
}

impl<L: LatencyModel> QueuedMemory<L> {
    /// Creates a model around `model` with the queue and bus parameters of `config`.
    pub fn new(model: L, config: &MemoryConfig) -> Self {
        Self {
            model,
            geometry: config.geometry(),
            queue_depth: config.queue_depth,
            bus_bits: config.bus_bits,
            burst_length: config.burst_length,
            tck_ns: config.tck_ns,
            now: 0,
            seq: 0,
            pending: BinaryHeap::new(),
            in_flight: [0; PSEUDO_CHANNELS],
            on_read: None,
            on_write: None,
            reads: 0,
            writes: 0,
            total_latency: 0,
            dropped_callbacks: 0,
            per_channel: [0; PSEUDO_CHANNELS],
        }
    }

    /// Current model cycle.
    pub const fn cycle(&self) -> u64 {
        self.now
    }

    /// Requests admitted but not yet completed.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// The wrapped latency model.
    pub const fn model(&self) -> &L {
        &self.model
    }
}

impl<L: LatencyModel> MemorySystem for QueuedMemory<L> {
    fn tick(&mut self) {
        self.now += 1;
        while let Some(Reverse(head)) = self.pending.peek().copied() {
            if head.due > self.now {
                break;
            }
            let _ = self.pending.pop();
            self.in_flight[head.channel] -= 1;
            let callback = if head.is_write {
                self.on_write.as_mut()
            } else {
                self.on_read.as_mut()
            };
            match callback {
                Some(cb) => cb(head.address),
                None => self.dropped_callbacks += 1,
            }
        }
    }

    fn will_accept(&self, address: u64, _is_write: bool) -> bool {
        self.in_flight[self.geometry.channel_of(address)] < self.queue_depth
    }

    fn add_transaction(&mut self, address: u64, is_write: bool) {
        let channel = self.geometry.channel_of(address);
        let latency = self.model.access_latency(address, is_write);
        self.pending.push(Reverse(Pending {
            due: self.now + latency,
            seq: self.seq,
            address,
            is_write,
            channel,
        }));
        self.seq += 1;
        self.in_flight[channel] += 1;
        self.per_channel[channel] += 1;
        self.total_latency += latency;
        if is_write {
            self.writes += 1;
        } else {
            self.reads += 1;
        }
    }

    fn register_callbacks(&mut self, on_read: CompletionCallback, on_write: CompletionCallback) {
        self.on_read = Some(on_read);
        self.on_write = Some(on_write);
    }

    fn channel_of(&self, address: u64) -> usize {
        self.geometry.channel_of(address)
    }

    fn bank_of(&self, address: u64) -> usize {
        self.geometry.bank_of(address)
    }

    fn bus_bits(&self) -> u64 {
        self.bus_bits
    }

    fn burst_length(&self) -> u64 {
        self.burst_length
    }

    fn tck_ns(&self) -> f64 {
        self.tck_ns
    }

    fn stats_report(&self) -> String {
        let requests = self.reads + self.writes;
        let avg = if requests == 0 {
            0.0
        } else {
            self.total_latency as f64 / requests as f64
        };
        let mut out = String::new();
        let _ = writeln!(out, "MEMORY SYSTEM");
        let _ = writeln!(out, "  mem.cycles             {}", self.now);
        let _ = writeln!(out, "  mem.reads              {}", self.reads);
        let _ = writeln!(out, "  mem.writes             {}", self.writes);
        let _ = writeln!(out, "  mem.avg_service        {avg:.2} cycles");
        for (name, value) in self.model.counters() {
            let _ = writeln!(out, "  {name:<22} {value}");
        }
        if self.dropped_callbacks > 0 {
            let _ = writeln!(out, "  mem.unreported         {}", self.dropped_callbacks);
        }
        for (ch, count) in self.per_channel.iter().enumerate() {
            let _ = writeln!(out, "  pch[{ch:02}].requests      {count}");
        }
        out
    }
}

impl<L: LatencyModel> fmt::Debug for QueuedMemory<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedMemory")
            .field("now", &self.now)
            .field("queue_depth", &self.queue_depth)
            .field("outstanding", &self.pending.len())
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}
