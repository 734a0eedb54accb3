//! Simulation Driver Unit Tests.
//!
//! Runs the admission / tick / completion loop against the scripted fake
//! memory system and checks timing stamps, backpressure and accounting.

use dramtrace_core::common::{AccessType, SimError};
use dramtrace_core::sim::{
    ChannelQueue, PreprocessStrategy, SimulationDriver, Verbosity, distribute, run_simulation,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::{CapturedLogger, init_tracing, single_channel, trace_of};
use crate::common::mocks::memory::FakeMemorySystem;

// ══════════════════════════════════════════════════════════
// 1. End-to-end timing
// ══════════════════════════════════════════════════════════

#[test]
fn three_requests_fixed_latency_ten() {
    init_tracing();
    let trace = trace_of(&[(0x0, false), (0x40, false), (0x80, true)]);
    let mut mem = FakeMemorySystem::new(10);
    let queues = distribute(&trace, |_| 0, PreprocessStrategy::RoundRobin).unwrap();

    let report = run_simulation(&mut mem, queues, None).unwrap();

    let issued: Vec<u64> = report.transactions.iter().map(|t| t.issue_cycle).collect();
    let done: Vec<u64> = report.transactions.iter().map(|t| t.complete_cycle).collect();
    assert_eq!(issued, vec![0, 1, 2]);
    assert_eq!(done, vec![10, 11, 12]);
    assert!((report.average_latency() - 10.0).abs() < f64::EPSILON);
    assert_eq!(report.admissions(), 3);
    assert_eq!(report.completions(), 3);
    assert_eq!(report.cycles, 12);
    assert_eq!(report.admitted_per_channel[0], 3);
    assert!(report.memory_stats.contains("FAKE MEMORY"));
}

#[test]
fn empty_trace_runs_no_cycles() {
    let mut mem = FakeMemorySystem::new(10);
    let report = run_simulation(&mut mem, vec![ChannelQueue::new(); 8], None).unwrap();
    assert_eq!(report.cycles, 0);
    assert_eq!(mem.ticks, 0);
    assert!(report.average_latency().abs() < f64::EPSILON);
}

// ══════════════════════════════════════════════════════════
// 2. Admission policy
// ══════════════════════════════════════════════════════════

#[test]
fn one_admission_per_channel_per_cycle() {
    let trace = trace_of(&[
        (0x00, false),
        (0x02, false),
        (0x10, false),
        (0x12, false),
        (0x20, false),
        (0x22, false),
    ]);
    let mut mem = FakeMemorySystem::new(4).with_classifier(|a| (a & 0xF) as usize);
    let queues = distribute(&trace, |a| (a & 0xF) as usize, PreprocessStrategy::RoundRobin).unwrap();

    let report = run_simulation(&mut mem, queues, None).unwrap();

    // Channel 0 then channel 1 each cycle.
    let order: Vec<(u64, u64)> = report
        .transactions
        .iter()
        .map(|t| (t.issue_cycle, t.address))
        .collect();
    assert_eq!(
        order,
        vec![
            (0, 0x00),
            (0, 0x02),
            (1, 0x10),
            (1, 0x12),
            (2, 0x20),
            (2, 0x22)
        ]
    );
    assert_eq!(&report.admitted_per_channel[..2], &[3, 3]);
}

#[test]
fn refused_requests_wait_for_acceptance() {
    let trace = trace_of(&[(0x0, false), (0x40, false), (0x80, false)]);
    let mut mem = FakeMemorySystem::new(3).with_accept(|cycle, _, _| cycle % 4 == 0);

    let report = run_simulation(&mut mem, single_channel(&trace), None).unwrap();

    let issued: Vec<u64> = report.transactions.iter().map(|t| t.issue_cycle).collect();
    assert_eq!(issued, vec![0, 4, 8]);
    let submitted: Vec<u64> = mem.submitted.iter().map(|s| s.0).collect();
    assert_eq!(submitted, issued);
    assert!(report.latencies().all(|l| l == 3));
}

#[test]
fn queue_order_is_fifo_within_a_channel() {
    let trace = trace_of(&[(0x300, false), (0x100, true), (0x200, false)]);
    let mut mem = FakeMemorySystem::new(1);
    let report = run_simulation(&mut mem, single_channel(&trace), None).unwrap();
    let addrs: Vec<u64> = mem.submitted.iter().map(|s| s.1).collect();
    assert_eq!(addrs, vec![0x300, 0x100, 0x200]);
    assert_eq!(report.transactions.len(), 3);
}

// ══════════════════════════════════════════════════════════
// 3. Completion matching
// ══════════════════════════════════════════════════════════

#[test]
fn same_address_completions_match_oldest_first() {
    let trace = trace_of(&[(0x40, false), (0x40, false), (0x40, false)]);
    let mut mem = FakeMemorySystem::new(5);
    let report = run_simulation(&mut mem, single_channel(&trace), None).unwrap();
    let stamps: Vec<(u64, u64)> = report
        .transactions
        .iter()
        .map(|t| (t.issue_cycle, t.complete_cycle))
        .collect();
    assert_eq!(stamps, vec![(0, 5), (1, 6), (2, 7)]);
}

#[test]
fn read_and_write_to_one_address_are_told_apart() {
    let trace = trace_of(&[(0x40, false), (0x40, true)]);
    let mut mem = FakeMemorySystem::with_latencies(20, 5);
    let report = run_simulation(&mut mem, single_channel(&trace), None).unwrap();

    let read = report.transactions[0];
    let write = report.transactions[1];
    assert_eq!(read.access(), AccessType::Read);
    assert_eq!((read.issue_cycle, read.complete_cycle), (0, 20));
    assert_eq!(write.access(), AccessType::Write);
    assert_eq!((write.issue_cycle, write.complete_cycle), (1, 6));
    assert_eq!(report.cycles, 20);
}

#[test]
fn completion_without_pending_request_is_an_error() {
    let trace = trace_of(&[(0x40, false)]);
    let mut mem = FakeMemorySystem::new(10);
    mem.inject_completion(0x999, true);
    let err = run_simulation(&mut mem, single_channel(&trace), None).unwrap_err();
    assert!(matches!(
        err,
        SimError::UnmatchedCompletion {
            address: 0x999,
            access: AccessType::Write,
            cycle: 1
        }
    ));
}

// ══════════════════════════════════════════════════════════
// 4. Stepping and logging
// ══════════════════════════════════════════════════════════

#[test]
fn driver_requires_one_queue_per_channel() {
    let mut queues = single_channel(&[]);
    queues.push(trace_of(&[(0x0, false)]).into_iter().collect());
    assert!(matches!(
        SimulationDriver::new(queues),
        Err(SimError::ChannelCount {
            expected: 8,
            found: 9
        })
    ));

    let mut mem = FakeMemorySystem::new(1);
    let err = run_simulation(&mut mem, vec![ChannelQueue::new(); 7], None).unwrap_err();
    assert!(matches!(err, SimError::ChannelCount { found: 7, .. }));
    assert!(mem.submitted.is_empty());
}

#[test]
fn stepwise_driver_tracks_outstanding() {
    let trace = trace_of(&[(0x0, false), (0x40, false)]);
    let mut mem = FakeMemorySystem::new(2);
    let mut driver = SimulationDriver::new(single_channel(&trace)).unwrap();
    driver.attach(&mut mem);

    driver.step(&mut mem, None).unwrap();
    assert_eq!(driver.cycle(), 1);
    assert_eq!(driver.outstanding(), 1);

    driver.step(&mut mem, None).unwrap();
    assert_eq!(driver.outstanding(), 1);
    assert!(!driver.is_done());

    driver.step(&mut mem, None).unwrap();
    assert_eq!(driver.outstanding(), 0);
    assert!(driver.is_done());
}

#[test]
fn logger_sees_every_issue_and_return_once() {
    let trace = trace_of(&[(0x0, false), (0x40, false), (0x80, true)]);
    let mut mem = FakeMemorySystem::new(10);
    let mut cap = CapturedLogger::new(Verbosity::None);

    let _ = run_simulation(&mut mem, single_channel(&trace), Some(&mut cap.logger)).unwrap();

    assert_eq!(cap.issue.lines().len(), 3);
    assert_eq!(cap.ret.lines().len(), 3);
    assert_eq!(cap.all.lines().len(), 6);
    assert!(cap.ret.lines()[2].contains("Latency:    10"));
    assert!(cap.console.contents().is_empty());
}

proptest! {
    #[test]
    fn n_requests_give_n_admissions_and_completions(
        records in prop::collection::vec((any::<u32>(), any::<bool>()), 0..120),
        latency in 1u64..16,
    ) {
        let pairs: Vec<(u64, bool)> = records.iter().map(|&(a, w)| (u64::from(a), w)).collect();
        let trace = trace_of(&pairs);
        let classify = |a: u64| ((a >> 6) & 0xF) as usize;
        let mut mem = FakeMemorySystem::new(latency).with_classifier(classify);
        let queues = distribute(&trace, classify, PreprocessStrategy::RoundRobin).unwrap();

        let report = run_simulation(&mut mem, queues, None).unwrap();

        prop_assert_eq!(report.admissions(), trace.len());
        prop_assert_eq!(report.completions(), trace.len());
        prop_assert_eq!(mem.submitted.len(), trace.len());
        prop_assert_eq!(mem.outstanding(), 0);
        for t in &report.transactions {
            prop_assert!(t.complete_cycle >= t.issue_cycle);
            prop_assert_eq!(t.latency(), Some(latency));
        }
    }
}
