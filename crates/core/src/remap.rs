//! Bit-permutation address remapping.
//!
//! Used to test whether moving physical address bits into different
//! channel/bank/row/column fields changes achieved latency without changing
//! which data is addressed. It provides:
//! 1. **Table:** `BitPermutationTable`, validated once at construction.
//! 2. **Remap:** `remap` and `remap_all`, pure bit scatters driven by the table.
//! 3. **Presets:** The mappings studied on the HBM2 stack.

use serde::Deserialize;

use crate::common::constants::ADDRESS_BITS;
use crate::common::{ConfigError, Transaction};

/// Source-to-destination bit permutation over a 64-bit address.
///
/// Entry `i` is the output bit that input bit `i` moves to. Construction
/// rejects anything that is not a permutation of `0..64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPermutationTable {
    map: [u8; ADDRESS_BITS],
}

impl BitPermutationTable {
    /// Builds a table from a slice of destination bits.
    ///
    /// # Arguments
    ///
    /// * `bits` - Exactly 64 destination positions, each in `0..64`, none repeated.
    ///
    /// # Returns
    ///
    /// The validated table, or the first violation found.
    pub fn new(bits: &[usize]) -> Result<Self, ConfigError> {
        if bits.len() != ADDRESS_BITS {
            return Err(ConfigError::BitMapLength { len: bits.len() });
        }
        let mut owner = [None::<usize>; ADDRESS_BITS];
        let mut map = [0u8; ADDRESS_BITS];
        for (position, &target) in bits.iter().enumerate() {
            if target >= ADDRESS_BITS {
                return Err(ConfigError::BitOutOfRange { position, target });
            }
            if let Some(first) = owner[target] {
                return Err(ConfigError::DuplicateBit {
                    first,
                    second: position,
                    target,
                });
            }
            owner[target] = Some(position);
            map[position] = target as u8;
        }
        Ok(Self { map })
    }

    /// The identity permutation.
    pub fn identity() -> Self {
        let mut map = [0u8; ADDRESS_BITS];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { map }
    }

    /// Builds one of the named preset tables.
    pub fn preset(preset: MappingPreset) -> Self {
        let low: &[u8; 32] = match preset {
            MappingPreset::Identity => return Self::identity(),
            MappingPreset::ChannelInterleave => &CHANNEL_INTERLEAVE_LOW,
            MappingPreset::Rorabgbachco => &RORABGBACHCO_LOW,
            MappingPreset::Hbm2eFpga => &HBM2E_FPGA_LOW,
        };
        let mut map = Self::identity().map;
        map[..32].copy_from_slice(low);
        Self { map }
    }

    /// Returns the inverse permutation, so that remapping with the inverse
    /// undoes a remap with `self`.
    pub fn inverse(&self) -> Self {
        let mut map = [0u8; ADDRESS_BITS];
        for (src, &dst) in self.map.iter().enumerate() {
            map[dst as usize] = src as u8;
        }
        Self { map }
    }

    /// Destination bit for source bit `bit`.
    #[inline]
    pub fn target(&self, bit: usize) -> usize {
        self.map[bit] as usize
    }

    /// Returns `true` if every bit maps onto itself.
    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(i, &b)| i == b as usize)
    }

    /// The raw destination table.
    pub const fn as_array(&self) -> &[u8; ADDRESS_BITS] {
        &self.map
    }
}

impl Default for BitPermutationTable {
    fn default() -> Self {
        Self::identity()
    }
}

/// Named permutation tables. Only the low 32 bits differ from identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingPreset {
    /// No remapping.
    Identity,
    /// First alternative mapping: spreads bits 5..13 across channel and bank fields.
    ChannelInterleave,
    /// Second mapping, tuned for the `rorabgbachco` controller address layout.
    Rorabgbachco,
    /// Offset, column, channel, bank group/bank, row layout of the FPGA HBM2E stack.
    Hbm2eFpga,
}

impl MappingPreset {
    /// Configuration name of the preset.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::ChannelInterleave => "channel_interleave",
            Self::Rorabgbachco => "rorabgbachco",
            Self::Hbm2eFpga => "hbm2e_fpga",
        }
    }
}

#[rustfmt::skip]
const CHANNEL_INTERLEAVE_LOW: [u8; 32] = [
    0,  1,  2,  3,  4,
    5,  29, 28, 10, 11, 14, 15, 16, 17,
    6,  7,  30, 12, 18, 19, 20, 21, 22,
    8,  9,  31, 13, 23, 24, 25, 26, 27,
];

#[rustfmt::skip]
const RORABGBACHCO_LOW: [u8; 32] = [
    0,  1,  2,  3,  4,
    28, 29, 5,  10, 14, 15, 16, 17, 18,
    30, 6,  11, 12, 19, 20, 21, 22, 23,
    31, 7,  8,  9,  13, 24, 25, 26, 27,
];

#[rustfmt::skip]
const HBM2E_FPGA_LOW: [u8; 32] = [
    0,  1,  2,  3,  4,                  // offset
    5,  6,  7,  8,  9,                  // column
    28, 29, 30, 31,                     // channel
    10, 11, 12, 13,                     // bank group, bank
    14, 15, 16, 17, 18, 19, 20,
    21, 22, 23, 24, 25, 26, 27,         // row
];

/// Scatters the bits of `address` according to `table`.
///
/// For every set bit `i` of the input, bit `table.target(i)` is set in the
/// output; all other output bits are zero.
pub fn remap(address: u64, table: &BitPermutationTable) -> u64 {
    let mut out = 0u64;
    let mut rest = address;
    while rest != 0 {
        let bit = rest.trailing_zeros() as usize;
        out |= 1u64 << table.target(bit);
        rest &= rest - 1;
    }
    out
}

/// Remaps every transaction of a trace, keeping order and direction.
pub fn remap_all(trace: &[Transaction], table: &BitPermutationTable) -> Vec<Transaction> {
    trace
        .iter()
        .map(|t| Transaction::new(remap(t.address, table), t.is_write))
        .collect()
}
