//! Address Remapper Unit Tests.
//!
//! Verifies table validation, presets and the bijection property.

use dramtrace_core::common::{ConfigError, Transaction};
use dramtrace_core::remap::{BitPermutationTable, MappingPreset, remap, remap_all};
use proptest::prelude::*;

fn shuffled_table(seed: &[usize]) -> BitPermutationTable {
    // Fisher-Yates driven by the proptest-supplied indices.
    let mut bits: Vec<usize> = (0..64).collect();
    for (i, &r) in seed.iter().enumerate().take(63) {
        let j = i + r % (64 - i);
        bits.swap(i, j);
    }
    BitPermutationTable::new(&bits).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Validation
// ══════════════════════════════════════════════════════════

#[test]
fn rejects_short_table() {
    let bits: Vec<usize> = (0..63).collect();
    assert!(matches!(
        BitPermutationTable::new(&bits),
        Err(ConfigError::BitMapLength { len: 63 })
    ));
}

#[test]
fn rejects_out_of_range_target() {
    let mut bits: Vec<usize> = (0..64).collect();
    bits[7] = 64;
    assert!(matches!(
        BitPermutationTable::new(&bits),
        Err(ConfigError::BitOutOfRange {
            position: 7,
            target: 64
        })
    ));
}

#[test]
fn rejects_repeated_target() {
    let mut bits: Vec<usize> = (0..64).collect();
    bits[9] = 3;
    assert!(matches!(
        BitPermutationTable::new(&bits),
        Err(ConfigError::DuplicateBit {
            first: 3,
            second: 9,
            target: 3
        })
    ));
}

#[test]
fn every_preset_is_a_permutation() {
    for preset in [
        MappingPreset::Identity,
        MappingPreset::ChannelInterleave,
        MappingPreset::Rorabgbachco,
        MappingPreset::Hbm2eFpga,
    ] {
        let table = BitPermutationTable::preset(preset);
        let bits: Vec<usize> = table.as_array().iter().map(|&b| b as usize).collect();
        assert!(
            BitPermutationTable::new(&bits).is_ok(),
            "{} is not a permutation",
            preset.name()
        );
        for bit in 32..64 {
            assert_eq!(table.target(bit), bit, "{} touches high bit {bit}", preset.name());
        }
    }
}

// ══════════════════════════════════════════════════════════
// 2. Remap behavior
// ══════════════════════════════════════════════════════════

#[test]
fn identity_is_noop() {
    let table = BitPermutationTable::identity();
    assert!(table.is_identity());
    assert_eq!(remap(0xDEAD_BEEF_1234_5678, &table), 0xDEAD_BEEF_1234_5678);
}

#[test]
fn single_bit_moves_to_target() {
    let table = BitPermutationTable::preset(MappingPreset::Hbm2eFpga);
    // Bit 10 is the first channel bit of the FPGA layout.
    assert_eq!(remap(1 << 10, &table), 1 << 28);
    assert_eq!(remap(1 << 14, &table), 1 << 10);
    assert_eq!(remap(0, &table), 0);
}

#[test]
fn remap_all_keeps_order_and_direction() {
    let table = BitPermutationTable::preset(MappingPreset::ChannelInterleave);
    let trace = vec![Transaction::read(1 << 6), Transaction::write(1 << 5)];
    let out = remap_all(&trace, &table);
    assert_eq!(out[0].address, 1 << 29);
    assert!(!out[0].is_write);
    assert_eq!(out[1].address, 1 << 5);
    assert!(out[1].is_write);
}

proptest! {
    #[test]
    fn remap_round_trips_through_inverse(
        seed in prop::collection::vec(any::<usize>(), 63),
        addr in any::<u64>(),
    ) {
        let table = shuffled_table(&seed);
        let inverse = table.inverse();
        prop_assert_eq!(remap(remap(addr, &table), &inverse), addr);
    }

    #[test]
    fn remap_is_injective(
        seed in prop::collection::vec(any::<usize>(), 63),
        a in any::<u64>(),
        b in any::<u64>(),
    ) {
        let table = shuffled_table(&seed);
        prop_assume!(a != b);
        prop_assert_ne!(remap(a, &table), remap(b, &table));
    }

    #[test]
    fn remap_preserves_popcount(addr in any::<u64>()) {
        let table = BitPermutationTable::preset(MappingPreset::Rorabgbachco);
        prop_assert_eq!(remap(addr, &table).count_ones(), addr.count_ones());
    }
}
