//! Channel Distributor Unit Tests.
//!
//! Verifies classification, per-bucket order preservation, pairwise
//! round-robin merging, the row-locality ordering and bank interleaving.

use dramtrace_core::common::{SimError, Transaction};
use dramtrace_core::sim::distributor::{
    ChannelQueue, PreprocessStrategy, distribute, distribute_banked, interleave_banks, merge_pair,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::trace_of;

fn low_nibble(addr: u64) -> usize {
    (addr & 0xF) as usize
}

fn addrs(q: &ChannelQueue) -> Vec<u64> {
    q.iter().map(|t| t.address).collect()
}

// ══════════════════════════════════════════════════════════
// 1. Classification
// ══════════════════════════════════════════════════════════

#[test]
fn produces_eight_queues() {
    let trace = trace_of(&[(0x0, false), (0x5, false), (0xF, true)]);
    let queues = distribute(&trace, low_nibble, PreprocessStrategy::RoundRobin).unwrap();
    assert_eq!(queues.len(), 8);
    assert_eq!(addrs(&queues[0]), vec![0x0]);
    assert_eq!(addrs(&queues[2]), vec![0x5]);
    assert_eq!(addrs(&queues[7]), vec![0xF]);
}

#[test]
fn out_of_range_pseudo_channel_is_fatal() {
    let trace = trace_of(&[(0x0, false), (0x40, false)]);
    let result = distribute(
        &trace,
        |a| if a == 0x40 { 16 } else { 0 },
        PreprocessStrategy::RoundRobin,
    );
    assert!(matches!(
        result,
        Err(SimError::ChannelOutOfRange {
            address: 0x40,
            channel: 16,
            limit: 16
        })
    ));
}

#[test]
fn empty_trace_gives_empty_queues() {
    let queues = distribute(&[], low_nibble, PreprocessStrategy::RowLocality).unwrap();
    assert_eq!(queues.len(), 8);
    assert!(queues.iter().all(ChannelQueue::is_empty));
}

// ══════════════════════════════════════════════════════════
// 2. Pairwise merge
// ══════════════════════════════════════════════════════════

#[test]
fn equal_buckets_strictly_alternate() {
    // Bucket 0: 0x00, 0x10, 0x20. Bucket 1: 0x01, 0x11, 0x21.
    let trace = trace_of(&[
        (0x00, false),
        (0x10, false),
        (0x01, false),
        (0x20, false),
        (0x11, false),
        (0x21, false),
    ]);
    let queues = distribute(&trace, low_nibble, PreprocessStrategy::RoundRobin).unwrap();
    assert_eq!(addrs(&queues[0]), vec![0x00, 0x01, 0x10, 0x11, 0x20, 0x21]);
}

#[test]
fn longer_bucket_drains_after_shorter_runs_out() {
    let first: ChannelQueue = trace_of(&[(0xA0, false), (0xB0, false), (0xC0, false)]).into();
    let second: ChannelQueue = trace_of(&[(0xA1, true)]).into();
    assert_eq!(addrs(&merge_pair(first.clone(), second.clone())), vec![0xA0, 0xA1, 0xB0, 0xC0]);
    assert_eq!(addrs(&merge_pair(second, first)), vec![0xA1, 0xA0, 0xB0, 0xC0]);
}

#[test]
fn empty_even_bucket_passes_odd_through() {
    let trace = trace_of(&[(0x03, false), (0x13, false)]);
    let queues = distribute(&trace, low_nibble, PreprocessStrategy::RoundRobin).unwrap();
    assert_eq!(addrs(&queues[1]), vec![0x03, 0x13]);
}

// ══════════════════════════════════════════════════════════
// 3. Row locality
// ══════════════════════════════════════════════════════════

#[test]
fn row_locality_sorts_each_bucket_stably() {
    let trace = trace_of(&[
        (0x300, false),
        (0x100, true),
        (0x200, false),
        (0x100, false),
        (0x001, false),
    ]);
    let queues = distribute(&trace, low_nibble, PreprocessStrategy::RowLocality).unwrap();
    let q: Vec<Transaction> = queues[0].iter().copied().collect();
    assert_eq!(
        q,
        vec![
            Transaction::write(0x100),
            Transaction::read(0x001),
            Transaction::read(0x100),
            Transaction::read(0x200),
            Transaction::read(0x300),
        ]
    );
}

#[test]
fn round_robin_keeps_issue_order() {
    let trace = trace_of(&[(0x300, false), (0x100, false), (0x200, false)]);
    let queues = distribute(&trace, low_nibble, PreprocessStrategy::RoundRobin).unwrap();
    assert_eq!(addrs(&queues[0]), vec![0x300, 0x100, 0x200]);
}

proptest! {
    #[test]
    fn every_bucket_keeps_its_relative_order(
        addresses in prop::collection::vec(any::<u64>(), 0..200),
    ) {
        let trace: Vec<Transaction> = addresses.iter().map(|&a| Transaction::read(a)).collect();
        let queues = distribute(&trace, low_nibble, PreprocessStrategy::RoundRobin).unwrap();

        let total: usize = queues.iter().map(ChannelQueue::len).sum();
        prop_assert_eq!(total, trace.len());

        for bucket in 0..16 {
            let expected: Vec<u64> = addresses.iter().copied().filter(|&a| low_nibble(a) == bucket).collect();
            let got: Vec<u64> = queues[bucket / 2]
                .iter()
                .map(|t| t.address)
                .filter(|&a| low_nibble(a) == bucket)
                .collect();
            prop_assert_eq!(got, expected);
        }
    }

    #[test]
    fn equal_pairs_alternate_origin(n in 1usize..40) {
        let mut trace = Vec::new();
        for i in 0..n as u64 {
            trace.push(Transaction::read(i << 4));
            trace.push(Transaction::read((i << 4) | 1));
        }
        let queues = distribute(&trace, low_nibble, PreprocessStrategy::RoundRobin).unwrap();
        for pair in queues[0].iter().collect::<Vec<_>>().windows(2) {
            prop_assert_ne!(low_nibble(pair[0].address), low_nibble(pair[1].address));
        }
    }
}

// ══════════════════════════════════════════════════════════
// 4. Bank parallelism
// ══════════════════════════════════════════════════════════

fn bank_nibble(addr: u64) -> usize {
    ((addr >> 8) & 0xF) as usize
}

fn scrambled_banks() -> Vec<Transaction> {
    trace_of(&[
        (0x420, false),
        (0x020, false),
        (0x500, true),
        (0x110, false),
        (0x400, false),
        (0x010, true),
    ])
}

#[test]
fn banks_sorted_then_interleaved_by_group() {
    let bucket: ChannelQueue = scrambled_banks().into_iter().collect();
    let out = interleave_banks(bucket, bank_nibble);
    // Group 0 holds banks 0 and 1, group 1 holds banks 4 and 5.
    assert_eq!(addrs(&out), vec![0x010, 0x400, 0x110, 0x500, 0x020, 0x420]);
    assert!(out[0].is_write);
    assert!(out[3].is_write);
}

#[test]
fn bank_parallel_strategy_uses_bank_decode() {
    let trace = scrambled_banks();
    let queues =
        distribute_banked(&trace, |_| 0, bank_nibble, PreprocessStrategy::BankParallel).unwrap();
    assert_eq!(addrs(&queues[0]), vec![0x010, 0x400, 0x110, 0x500, 0x020, 0x420]);
    assert!(queues[1..].iter().all(ChannelQueue::is_empty));
}

#[test]
fn bank_parallel_without_bank_decode_matches_row_locality() {
    let trace = scrambled_banks();
    let banked = distribute(&trace, low_nibble, PreprocessStrategy::BankParallel).unwrap();
    let sorted = distribute(&trace, low_nibble, PreprocessStrategy::RowLocality).unwrap();
    assert_eq!(banked, sorted);
}

#[test]
fn bank_decode_ignored_by_other_strategies() {
    let trace = scrambled_banks();
    let plain = distribute(&trace, |_| 0, PreprocessStrategy::RoundRobin).unwrap();
    let banked = distribute_banked(&trace, |_| 0, bank_nibble, PreprocessStrategy::RoundRobin).unwrap();
    assert_eq!(plain, banked);
    assert_eq!(PreprocessStrategy::BankParallel.name(), "bank-parallel");
}
