//! Stage-wise transform access patterns.
//!
//! Models the memory footprint of one stage of a blocked NTT-like transform
//! whose data is tiled across channels. The IC-wise variants walk across
//! channels, the IR-wise variants walk sub-tiles within a row. All generated
//! requests are reads.

use serde::Deserialize;

use super::generator::{checked, request_count, word_address};
use crate::common::{ConfigError, Transaction};

/// Tiling constants of the transform. The defaults describe the HBM2 tile
/// layout; every count is a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StageGeometry {
    /// Channels the tile is spread across.
    pub channels: u64,
    /// Outer iterations per stage.
    pub iterations: u64,
    /// Elements per tile row.
    pub row_elements: u64,
    /// Sub-tiles per row.
    pub subtiles: u64,
    /// Word distance between two channels' slices.
    pub channel_span: u64,
    /// Shift from word index to byte address.
    pub word_shift: u32,
    /// Word distance between consecutive inner rows in the IR-wise sweeps.
    pub ir_row_pitch: u64,
}

impl Default for StageGeometry {
    fn default() -> Self {
        Self {
            channels: 1 << 4,
            iterations: 1 << 5,
            row_elements: 1 << 9,
            subtiles: 1 << 4,
            channel_span: 1 << 27,
            word_shift: 5,
            ir_row_pitch: 29,
        }
    }
}

impl StageGeometry {
    /// Word distance between two tile planes. Only meaningful for a geometry
    /// that passed `validate`.
    #[inline]
    pub const fn plane_span(&self) -> u64 {
        self.row_elements * self.row_elements
    }

    /// Rejects geometries whose patterns cannot be generated in 64-bit
    /// addresses or whose request counts are unbounded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.word_shift >= u64::BITS {
            return Err(ConfigError::InvalidParameter {
                name: "word_shift",
                reason: format!("{} exceeds the 64-bit address width", self.word_shift),
            });
        }
        let _ = checked("row_elements", self.row_elements.checked_mul(self.row_elements))?;
        let _ = request_count("iterations", self.iterations.checked_mul(self.channels))?;
        let _ = request_count("subtiles", Some(self.subtiles))?;
        for variant in StageVariant::ALL {
            let _ = variant.last_address(0, self)?;
        }
        Ok(())
    }
}

/// The four stage generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageVariant {
    /// IC-wise, stages 0 to 4: iteration-major over channels.
    IcWiseFirstHalf,
    /// IC-wise, stages 5 to 8: channel-major over iterations.
    IcWiseSecondHalf,
    /// IR-wise, stages 0 to 4: consecutive sub-tiles.
    IrWiseFirstHalf,
    /// IR-wise, stages 5 to 8: sub-tiles strided by the sub-tile count.
    IrWiseSecondHalf,
}

impl StageVariant {
    /// Every variant, in stage order.
    pub const ALL: [Self; 4] = [
        Self::IcWiseFirstHalf,
        Self::IcWiseSecondHalf,
        Self::IrWiseFirstHalf,
        Self::IrWiseSecondHalf,
    ];

    /// Generates the access pattern of this variant starting at `start`.
    pub fn generate(
        self,
        start: u64,
        geometry: &StageGeometry,
    ) -> Result<Vec<Transaction>, ConfigError> {
        match self {
            Self::IcWiseFirstHalf => ic_wise_first_half(start, geometry),
            Self::IcWiseSecondHalf => ic_wise_second_half(start, geometry),
            Self::IrWiseFirstHalf => ir_wise_first_half(start, geometry),
            Self::IrWiseSecondHalf => ir_wise_second_half(start, geometry),
        }
    }

    /// Largest address this variant emits from `start`, or the parameter to
    /// blame if it does not fit in 64 bits.
    pub fn last_address(self, start: u64, g: &StageGeometry) -> Result<u64, ConfigError> {
        let last_channel = g.channels.saturating_sub(1);
        let last_iteration = g.iterations.saturating_sub(1);
        let ic_word = |step: Option<u64>| -> Result<u64, ConfigError> {
            let channel_base = checked("channel_span", last_channel.checked_mul(g.channel_span))?;
            let offset = checked("iterations", step.and_then(|s| last_iteration.checked_mul(s)))?;
            let word = checked(
                "start",
                channel_base.checked_add(start).and_then(|w| w.checked_add(offset)),
            )?;
            checked("word_shift", word_address(word, g.word_shift))
        };
        match self {
            Self::IcWiseFirstHalf => ic_word(g.row_elements.checked_mul(g.subtiles)),
            Self::IcWiseSecondHalf => ic_word(Some(g.row_elements)),
            Self::IrWiseFirstHalf => {
                checked("start", start.checked_add(g.subtiles.saturating_sub(1)))
            }
            Self::IrWiseSecondHalf => checked(
                "start",
                last_iteration
                    .checked_mul(g.subtiles)
                    .and_then(|offset| start.checked_add(offset)),
            ),
        }
    }

    fn check(self, start: u64, g: &StageGeometry) -> Result<(), ConfigError> {
        g.validate()?;
        let _ = self.last_address(start, g)?;
        Ok(())
    }
}

/// `(channel * span + (start + i * row * subtiles)) << shift`, iteration-major.
pub fn ic_wise_first_half(start: u64, g: &StageGeometry) -> Result<Vec<Transaction>, ConfigError> {
    StageVariant::IcWiseFirstHalf.check(start, g)?;
    let len = request_count("iterations", g.iterations.checked_mul(g.channels))?;
    let mut trace = Vec::with_capacity(len);
    for i in 0..g.iterations {
        for channel in 0..g.channels {
            let word = channel * g.channel_span + (start + i * g.row_elements * g.subtiles);
            trace.push(Transaction::read(word << g.word_shift));
        }
    }
    Ok(trace)
}

/// `(channel * span + (start + i * row)) << shift`, channel-major.
pub fn ic_wise_second_half(start: u64, g: &StageGeometry) -> Result<Vec<Transaction>, ConfigError> {
    StageVariant::IcWiseSecondHalf.check(start, g)?;
    let len = request_count("iterations", g.iterations.checked_mul(g.channels))?;
    let mut trace = Vec::with_capacity(len);
    for channel in 0..g.channels {
        for i in 0..g.iterations {
            let word = channel * g.channel_span + (start + i * g.row_elements);
            trace.push(Transaction::read(word << g.word_shift));
        }
    }
    Ok(trace)
}

/// `start + subtile` for every sub-tile.
pub fn ir_wise_first_half(start: u64, g: &StageGeometry) -> Result<Vec<Transaction>, ConfigError> {
    StageVariant::IrWiseFirstHalf.check(start, g)?;
    Ok((0..g.subtiles)
        .map(|subtile| Transaction::read(start + subtile))
        .collect())
}

/// `start + subtile * subtiles` for `iterations` sub-tiles.
pub fn ir_wise_second_half(start: u64, g: &StageGeometry) -> Result<Vec<Transaction>, ConfigError> {
    StageVariant::IrWiseSecondHalf.check(start, g)?;
    Ok((0..g.iterations)
        .map(|subtile| Transaction::read(start + subtile * g.subtiles))
        .collect())
}

/// Start addresses of the full sweep over a stage, one per generator call.
///
/// # Arguments
///
/// * `variant` - Stage generator the start addresses feed.
/// * `butterfly_units` - Parallel butterfly units; divides the outer and inner
///   extents of the second-half and IR-wise sweeps. Must be non-zero.
/// * `geometry` - Tiling constants.
pub fn stage_start_addresses(
    variant: StageVariant,
    butterfly_units: u64,
    g: &StageGeometry,
) -> Result<Vec<u64>, ConfigError> {
    if butterfly_units == 0 || butterfly_units > g.row_elements {
        return Err(ConfigError::InvalidParameter {
            name: "butterfly_units",
            reason: format!("must be in 1..={}", g.row_elements),
        });
    }
    g.validate()?;
    let plane = g.plane_span();
    let blocks = g.row_elements / butterfly_units;
    let row = g.row_elements;
    let last = |n: u64| n.saturating_sub(1);
    // Request count and largest start address of each sweep.
    let (count, max_start) = match variant {
        StageVariant::IcWiseFirstHalf => (
            g.subtiles.checked_mul(g.iterations).and_then(|n| n.checked_mul(row)),
            last(g.iterations)
                .checked_mul(plane)
                .zip(last(g.subtiles).checked_mul(row))
                .and_then(|(a, b)| a.checked_add(b))
                .and_then(|a| a.checked_add(last(row))),
        ),
        StageVariant::IcWiseSecondHalf => (
            g.iterations.checked_mul(blocks).and_then(|n| n.checked_mul(blocks)),
            last(blocks)
                .checked_mul(plane)
                .zip(row.checked_mul(g.subtiles).and_then(|s| last(g.iterations).checked_mul(s)))
                .and_then(|(a, b)| a.checked_add(b))
                .and_then(|a| a.checked_add(last(blocks))),
        ),
        StageVariant::IrWiseFirstHalf | StageVariant::IrWiseSecondHalf => (
            blocks.checked_mul(row),
            last(blocks)
                .checked_mul(plane)
                .zip(last(row).checked_mul(g.ir_row_pitch))
                .and_then(|(a, b)| a.checked_add(b)),
        ),
    };
    let count = request_count("butterfly_units", count)?;
    let _ = checked("geometry", max_start)?;
    let mut starts = Vec::with_capacity(count);

    match variant {
        StageVariant::IcWiseFirstHalf => {
            for subtile in 0..g.subtiles {
                for outer in 0..g.iterations {
                    for inner in 0..g.row_elements {
                        starts.push(outer * plane + subtile * g.row_elements + inner);
                    }
                }
            }
        }
        StageVariant::IcWiseSecondHalf => {
            for subtile in 0..g.iterations {
                for outer in 0..blocks {
                    for inner in 0..blocks {
                        starts.push(outer * plane + subtile * g.row_elements * g.subtiles + inner);
                    }
                }
            }
        }
        StageVariant::IrWiseFirstHalf | StageVariant::IrWiseSecondHalf => {
            for outer in 0..blocks {
                for inner_row in 0..g.row_elements {
                    starts.push(outer * plane + inner_row * g.ir_row_pitch);
                }
            }
        }
    }
    Ok(starts)
}
