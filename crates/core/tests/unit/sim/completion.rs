//! Completion Index Unit Tests.

use dramtrace_core::common::AccessType;
use dramtrace_core::sim::CompletionIndex;

#[test]
fn same_address_matches_in_fifo_order() {
    let mut index = CompletionIndex::new();
    index.insert(0x40, AccessType::Read, 3);
    index.insert(0x40, AccessType::Read, 7);
    index.insert(0x40, AccessType::Read, 9);
    assert_eq!(index.pending_len(), 3);

    assert_eq!(index.complete(0x40, AccessType::Read), Some(3));
    assert_eq!(index.complete(0x40, AccessType::Read), Some(7));
    assert_eq!(index.complete(0x40, AccessType::Read), Some(9));
    assert_eq!(index.complete(0x40, AccessType::Read), None);
    assert!(index.is_empty());
}

#[test]
fn direction_is_part_of_the_key() {
    let mut index = CompletionIndex::new();
    index.insert(0x80, AccessType::Write, 0);
    index.insert(0x80, AccessType::Read, 1);

    assert_eq!(index.complete(0x80, AccessType::Read), Some(1));
    assert_eq!(index.complete(0x80, AccessType::Read), None);
    assert_eq!(index.complete(0x80, AccessType::Write), Some(0));
}

#[test]
fn unknown_address_does_not_disturb_pending() {
    let mut index = CompletionIndex::new();
    index.insert(0x40, AccessType::Read, 0);
    assert_eq!(index.complete(0x44, AccessType::Read), None);
    assert_eq!(index.pending_len(), 1);
}
