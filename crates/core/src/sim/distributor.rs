//! Channel distribution preprocessor.
//!
//! Splits a flat trace into the eight real channel queues the driver feeds:
//! 1. **Classify:** Each transaction goes to the pseudo-channel bucket the memory system reports.
//! 2. **Order:** Buckets keep trace order, are stable-sorted by address for row locality, or
//!    are sorted per bank and interleaved across banks and bank groups.
//! 3. **Merge:** Buckets `2k` and `2k+1` are interleaved one-for-one into channel `k`.

use std::collections::{BTreeMap, VecDeque};

use serde::Deserialize;

use crate::common::constants::{BANKS_PER_GROUP, CHANNELS, PSEUDO_CHANNELS};
use crate::common::{SimError, Transaction};

/// Ordered requests waiting for admission on one real channel.
pub type ChannelQueue = VecDeque<Transaction>;

/// Ordering policy applied inside each pseudo-channel bucket before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PreprocessStrategy {
    /// Keep original issue order within each bucket.
    #[default]
    RoundRobin,
    /// Stable-sort each bucket by address so same-row accesses cluster.
    RowLocality,
    /// Sort each bank by address, then alternate banks within a bank group
    /// and bank groups within the bucket.
    BankParallel,
}

impl PreprocessStrategy {
    /// Command line name of the strategy.
    pub const fn name(self) -> &'static str {
        match self {
            Self::RoundRobin => "round-robin",
            Self::RowLocality => "row-locality",
            Self::BankParallel => "bank-parallel",
        }
    }
}

/// Classifies `trace` into pseudo-channel buckets.
///
/// # Arguments
///
/// * `trace` - Transactions in issue order.
/// * `classify` - Pseudo-channel of an address; must return a value in `0..16`.
///
/// # Returns
///
/// Sixteen buckets, each in trace order, or `ChannelOutOfRange` for the first
/// address classified outside the pseudo-channel range.
pub fn classify<F>(trace: &[Transaction], mut classify: F) -> Result<Vec<ChannelQueue>, SimError>
where
    F: FnMut(u64) -> usize,
{
    let mut buckets = vec![ChannelQueue::new(); PSEUDO_CHANNELS];
    for t in trace {
        let channel = classify(t.address);
        let Some(bucket) = buckets.get_mut(channel) else {
            return Err(SimError::ChannelOutOfRange {
                address: t.address,
                channel,
                limit: PSEUDO_CHANNELS,
            });
        };
        bucket.push_back(*t);
    }
    Ok(buckets)
}

/// Interleaves two buckets: one from `first`, one from `second`, repeating;
/// whichever runs out first leaves the other to drain in order.
pub fn merge_pair(mut first: ChannelQueue, mut second: ChannelQueue) -> ChannelQueue {
    let mut out = ChannelQueue::with_capacity(first.len() + second.len());
    loop {
        match (first.pop_front(), second.pop_front()) {
            (Some(a), Some(b)) => {
                out.push_back(a);
                out.push_back(b);
            }
            (Some(a), None) => {
                out.push_back(a);
                out.extend(first);
                break;
            }
            (None, Some(b)) => {
                out.push_back(b);
                out.extend(second);
                break;
            }
            (None, None) => break,
        }
    }
    out
}

/// Takes one request from each queue in turn until all are empty.
fn round_robin(mut queues: Vec<ChannelQueue>) -> ChannelQueue {
    let mut out = ChannelQueue::with_capacity(queues.iter().map(ChannelQueue::len).sum());
    loop {
        let mut progress = false;
        for queue in &mut queues {
            if let Some(t) = queue.pop_front() {
                out.push_back(t);
                progress = true;
            }
        }
        if !progress {
            return out;
        }
    }
}

/// Reorders one bucket for bank-level parallelism.
///
/// Requests are split by flat bank id and sorted by address inside each bank.
/// Banks of the same group (`bank / BANKS_PER_GROUP`) are interleaved one
/// request at a time, then the groups are interleaved the same way, both in
/// ascending id order.
pub fn interleave_banks<B>(bucket: ChannelQueue, mut bank_of: B) -> ChannelQueue
where
    B: FnMut(u64) -> usize,
{
    let mut banks: BTreeMap<usize, Vec<Transaction>> = BTreeMap::new();
    for t in bucket {
        banks.entry(bank_of(t.address)).or_default().push(t);
    }
    let mut groups: BTreeMap<usize, Vec<ChannelQueue>> = BTreeMap::new();
    for (bank, mut requests) in banks {
        requests.sort_by_key(|t| t.address);
        groups
            .entry(bank / BANKS_PER_GROUP)
            .or_default()
            .push(requests.into());
    }
    round_robin(groups.into_values().map(round_robin).collect())
}

/// Distributes `trace` into the eight real channel queues.
///
/// Every address is treated as bank 0, so `BankParallel` orders like
/// `RowLocality`; use `distribute_banked` to supply a bank decode.
///
/// # Arguments
///
/// * `trace` - Transactions in issue order.
/// * `classify_fn` - Pseudo-channel classifier, usually `MemorySystem::channel_of`.
/// * `strategy` - Bucket ordering policy.
pub fn distribute<F>(
    trace: &[Transaction],
    classify_fn: F,
    strategy: PreprocessStrategy,
) -> Result<Vec<ChannelQueue>, SimError>
where
    F: FnMut(u64) -> usize,
{
    distribute_banked(trace, classify_fn, |_| 0, strategy)
}

/// Distributes `trace` into the eight real channel queues, using `bank_fn`
/// (usually `MemorySystem::bank_of`) for the `BankParallel` strategy.
pub fn distribute_banked<F, B>(
    trace: &[Transaction],
    classify_fn: F,
    mut bank_fn: B,
    strategy: PreprocessStrategy,
) -> Result<Vec<ChannelQueue>, SimError>
where
    F: FnMut(u64) -> usize,
    B: FnMut(u64) -> usize,
{
    let buckets = classify(trace, classify_fn)?;

    let buckets: Vec<ChannelQueue> = match strategy {
        PreprocessStrategy::RoundRobin => buckets,
        PreprocessStrategy::RowLocality => buckets
            .into_iter()
            .map(|mut bucket| {
                bucket.make_contiguous().sort_by_key(|t| t.address);
                bucket
            })
            .collect(),
        PreprocessStrategy::BankParallel => buckets
            .into_iter()
            .map(|bucket| interleave_banks(bucket, &mut bank_fn))
            .collect(),
    };

    let mut buckets = buckets.into_iter();
    let mut queues = Vec::with_capacity(CHANNELS);
    while let (Some(even), Some(odd)) = (buckets.next(), buckets.next()) {
        queues.push(merge_pair(even, odd));
    }

    for (ch, q) in queues.iter().enumerate() {
        tracing::debug!(channel = ch, len = q.len(), strategy = strategy.name(), "channel queue");
    }
    Ok(queues)
}
