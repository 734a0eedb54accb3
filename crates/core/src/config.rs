//! Configuration system for the harness.
//!
//! This module defines all configuration structures used to parameterize a
//! run. It provides:
//! 1. **Defaults:** Baseline paths, burst geometry and built-in model timing.
//! 2. **Structures:** Hierarchical config for general, mapping, preprocessing, workload and memory.
//! 3. **Validation:** The address mapping is checked once, when the remap table is built.
//!
//! Configuration is supplied as JSON (`Config::from_json_file`) or taken from `Config::default()`.
//!
//! ```json
//! {
//!   "general": { "trace_path": "traces/ntt.trace", "debug": "issue" },
//!   "mapping": { "preset": "rorabgbachco" },
//!   "preprocess": { "strategy": "RowLocality" },
//!   "workload": { "kind": "Sequential", "num_elements": 512 },
//!   "memory": { "model": "RowBuffer", "queue_depth": 16 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::constants::{DEFAULT_BURST_SIZE, DEFAULT_ELEMENT_SIZE, DEFAULT_NUM_ELEMENTS};
use crate::common::{ConfigError, Transaction};
use crate::memory::controller::AddressGeometry;
use crate::remap::{BitPermutationTable, MappingPreset};
use crate::sim::distributor::PreprocessStrategy;
use crate::sim::logger::Verbosity;
use crate::trace::generator;
use crate::trace::stage::{StageGeometry, StageVariant};

/// Default configuration constants.
mod defaults {
    /// Trace file read when the workload is `File`.
    pub const TRACE_PATH: &str = "traces/test.trace";

    /// Directory receiving the event log streams.
    pub const OUTPUT_DIR: &str = "output";

    /// Data bus width of one HBM2 pseudo-channel pair.
    pub const BUS_BITS: u64 = 128;

    /// Beats per burst.
    pub const BURST_LENGTH: u64 = 4;

    /// Clock period in nanoseconds.
    pub const TCK_NS: f64 = 1.0;

    /// In-flight requests accepted per pseudo-channel.
    pub const QUEUE_DEPTH: usize = 32;

    /// Read latency of the fixed model.
    pub const READ_LATENCY: u64 = 10;

    /// Write latency of the fixed model.
    pub const WRITE_LATENCY: u64 = 10;

    /// CAS latency of the row-buffer model.
    pub const T_CAS: u64 = 14;

    /// Activation latency of the row-buffer model.
    pub const T_RAS: u64 = 14;

    /// Precharge latency of the row-buffer model.
    pub const T_PRE: u64 = 14;

    /// Pseudo-channel field sits directly above a 32-column, 32-byte page slice.
    pub const CHANNEL_SHIFT: u32 = 10;

    /// Bank group and bank field.
    pub const BANK_SHIFT: u32 = 14;

    /// Four bank bits (bank group + bank).
    pub const BANK_BITS: u32 = 4;

    /// Row field.
    pub const ROW_SHIFT: u32 = 18;
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Paths and console verbosity.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Address bit permutation applied to the workload.
    #[serde(default)]
    pub mapping: MappingConfig,
    /// Channel distribution strategy.
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    /// Trace source.
    #[serde(default)]
    pub workload: WorkloadConfig,
    /// Built-in memory model.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Configuration file path.
    ///
    /// # Returns
    ///
    /// The validated configuration, or the read, parse or validation error.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Checks every cross-field constraint that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.mapping.remap_table()?;
        self.workload.validate()?;
        self.memory.validate()
    }

    /// The validated remap table, or `None` when no mapping is configured.
    pub fn remap_table(&self) -> Result<Option<BitPermutationTable>, ConfigError> {
        self.mapping.remap_table()
    }
}

/// Paths and console output.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Trace file used by the `File` workload.
    #[serde(default = "GeneralConfig::default_trace_path")]
    pub trace_path: PathBuf,

    /// Directory receiving `log.txt`, `issue.txt` and `return.txt`.
    #[serde(default = "GeneralConfig::default_output_dir")]
    pub output_dir: PathBuf,

    /// Which event streams are echoed to the console.
    #[serde(default)]
    pub debug: Verbosity,
}

impl GeneralConfig {
    fn default_trace_path() -> PathBuf {
        PathBuf::from(defaults::TRACE_PATH)
    }

    fn default_output_dir() -> PathBuf {
        PathBuf::from(defaults::OUTPUT_DIR)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_path: Self::default_trace_path(),
            output_dir: Self::default_output_dir(),
            debug: Verbosity::default(),
        }
    }
}

/// Address remapping: a named preset or an explicit 64-entry bit map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingConfig {
    /// Named preset table.
    #[serde(default)]
    pub preset: Option<MappingPreset>,

    /// Explicit destination bit for every source bit.
    #[serde(default)]
    pub bit_map: Option<Vec<usize>>,
}

impl MappingConfig {
    /// Builds and validates the configured table.
    pub fn remap_table(&self) -> Result<Option<BitPermutationTable>, ConfigError> {
        match (&self.preset, &self.bit_map) {
            (Some(preset), Some(_)) => Err(ConfigError::AmbiguousMapping(preset.name().to_string())),
            (Some(preset), None) => Ok(Some(BitPermutationTable::preset(*preset))),
            (None, Some(bits)) => BitPermutationTable::new(bits).map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// Channel distribution settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PreprocessConfig {
    /// Order policy applied inside each pseudo-channel bucket.
    #[serde(default)]
    pub strategy: PreprocessStrategy,
}

/// Trace source of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind")]
pub enum WorkloadConfig {
    /// Read `general.trace_path`.
    #[default]
    File,
    /// Burst-aligned linear sweep.
    Sequential {
        /// First byte address.
        #[serde(default)]
        start: u64,
        /// Logical elements.
        #[serde(default = "WorkloadConfig::default_num_elements")]
        num_elements: u64,
        /// Element size in bytes.
        #[serde(default = "WorkloadConfig::default_element_size")]
        element_size: u64,
        /// Burst size in bytes.
        #[serde(default = "WorkloadConfig::default_burst_size")]
        burst_size: u64,
        /// Direction.
        #[serde(default)]
        is_write: bool,
    },
    /// Column-wise (or cube-wise, with a plane-sized stride) gather.
    Columnwise {
        /// First byte address.
        #[serde(default)]
        start: u64,
        /// Logical elements.
        #[serde(default = "WorkloadConfig::default_num_elements")]
        num_elements: u64,
        /// Element stride.
        #[serde(default = "WorkloadConfig::default_stride")]
        stride: u64,
        /// Element size in bytes.
        #[serde(default = "WorkloadConfig::default_element_size")]
        element_size: u64,
        /// Burst size in bytes.
        #[serde(default = "WorkloadConfig::default_burst_size")]
        burst_size: u64,
        /// Direction.
        #[serde(default)]
        is_write: bool,
    },
    /// Word-granular stride.
    Strided {
        /// First byte address.
        #[serde(default)]
        start: u64,
        /// Word stride.
        #[serde(default = "WorkloadConfig::default_stride")]
        stride: u64,
        /// Number of requests.
        #[serde(default = "WorkloadConfig::default_num_elements")]
        elements: u64,
        /// Direction.
        #[serde(default)]
        is_write: bool,
    },
    /// One stage-wise transform pattern.
    Stage {
        /// Which stage generator.
        variant: StageVariant,
        /// Start word.
        #[serde(default)]
        start: u64,
        /// Tiling constants.
        #[serde(default)]
        geometry: StageGeometry,
    },
}

impl WorkloadConfig {
    fn default_num_elements() -> u64 {
        DEFAULT_NUM_ELEMENTS
    }

    fn default_element_size() -> u64 {
        DEFAULT_ELEMENT_SIZE
    }

    fn default_burst_size() -> u64 {
        DEFAULT_BURST_SIZE
    }

    fn default_stride() -> u64 {
        generator::COLUMN_STRIDE
    }

    /// Tiling constants of a `Stage` workload.
    pub const fn stage_geometry(&self) -> Option<StageGeometry> {
        match self {
            Self::Stage { geometry, .. } => Some(*geometry),
            _ => None,
        }
    }

    /// Checks the tiling of a `Stage` workload. Other generators check their
    /// own arithmetic when they run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Stage {
            variant,
            start,
            ref geometry,
        } = *self
        {
            geometry.validate()?;
            let _ = variant.last_address(start, geometry)?;
        }
        Ok(())
    }

    /// Materializes a synthetic workload. Returns `None` for `File`, which the
    /// caller resolves through the trace loader.
    pub fn synthesize(&self) -> Result<Option<Vec<Transaction>>, ConfigError> {
        let trace = match *self {
            Self::File => return Ok(None),
            Self::Sequential {
                start,
                num_elements,
                element_size,
                burst_size,
                is_write,
            } => generator::sequential(start, num_elements, element_size, burst_size, is_write)?,
            Self::Columnwise {
                start,
                num_elements,
                stride,
                element_size,
                burst_size,
                is_write,
            } => generator::columnwise(start, num_elements, stride, element_size, burst_size, is_write)?,
            Self::Strided {
                start,
                stride,
                elements,
                is_write,
            } => generator::strided(start, stride, elements, is_write)?,
            Self::Stage {
                variant,
                start,
                ref geometry,
            } => variant.generate(start, geometry)?,
        };
        Ok(Some(trace))
    }
}

/// Built-in memory model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryModel {
    /// Constant read and write latency.
    #[default]
    Fixed,
    /// Per-bank row buffer with CAS, RAS and precharge timing.
    #[serde(alias = "DRAM")]
    RowBuffer,
}

/// Parameters of the built-in memory model.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Which latency model to use.
    #[serde(default)]
    pub model: MemoryModel,

    /// Data bus width in bits.
    #[serde(default = "MemoryConfig::default_bus_bits")]
    pub bus_bits: u64,

    /// Beats per burst.
    #[serde(default = "MemoryConfig::default_burst_length")]
    pub burst_length: u64,

    /// Clock period in nanoseconds.
    #[serde(default = "MemoryConfig::default_tck_ns")]
    pub tck_ns: f64,

    /// In-flight request bound per pseudo-channel.
    #[serde(default = "MemoryConfig::default_queue_depth")]
    pub queue_depth: usize,

    /// Fixed model read latency.
    #[serde(default = "MemoryConfig::default_read_latency")]
    pub read_latency: u64,

    /// Fixed model write latency.
    #[serde(default = "MemoryConfig::default_write_latency")]
    pub write_latency: u64,

    /// Row-buffer model CAS latency.
    #[serde(default = "MemoryConfig::default_t_cas")]
    pub t_cas: u64,

    /// Row-buffer model activation latency.
    #[serde(default = "MemoryConfig::default_t_ras")]
    pub t_ras: u64,

    /// Row-buffer model precharge latency.
    #[serde(default = "MemoryConfig::default_t_pre")]
    pub t_pre: u64,

    /// Lowest bit of the 4-bit pseudo-channel field.
    #[serde(default = "MemoryConfig::default_channel_shift")]
    pub channel_shift: u32,

    /// Lowest bit of the bank field.
    #[serde(default = "MemoryConfig::default_bank_shift")]
    pub bank_shift: u32,

    /// Width of the bank field.
    #[serde(default = "MemoryConfig::default_bank_bits")]
    pub bank_bits: u32,

    /// Lowest bit of the row field.
    #[serde(default = "MemoryConfig::default_row_shift")]
    pub row_shift: u32,
}

impl MemoryConfig {
    fn default_bus_bits() -> u64 {
        defaults::BUS_BITS
    }

    fn default_burst_length() -> u64 {
        defaults::BURST_LENGTH
    }

    fn default_tck_ns() -> f64 {
        defaults::TCK_NS
    }

    fn default_queue_depth() -> usize {
        defaults::QUEUE_DEPTH
    }

    fn default_read_latency() -> u64 {
        defaults::READ_LATENCY
    }

    fn default_write_latency() -> u64 {
        defaults::WRITE_LATENCY
    }

    fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    fn default_t_ras() -> u64 {
        defaults::T_RAS
    }

    fn default_t_pre() -> u64 {
        defaults::T_PRE
    }

    fn default_channel_shift() -> u32 {
        defaults::CHANNEL_SHIFT
    }

    fn default_bank_shift() -> u32 {
        defaults::BANK_SHIFT
    }

    fn default_bank_bits() -> u32 {
        defaults::BANK_BITS
    }

    fn default_row_shift() -> u32 {
        defaults::ROW_SHIFT
    }

    /// Address field layout used by the built-in model.
    pub const fn geometry(&self) -> AddressGeometry {
        AddressGeometry {
            channel_shift: self.channel_shift,
            bank_shift: self.bank_shift,
            bank_bits: self.bank_bits,
            row_shift: self.row_shift,
        }
    }

    /// Bytes moved per burst.
    pub const fn burst_size(&self) -> u64 {
        self.bus_bits / 8 * self.burst_length
    }

    /// Rejects parameter combinations the model cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name, reason: &str| {
            Err(ConfigError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };
        if self.queue_depth == 0 {
            return invalid("queue_depth", "a zero-depth queue never admits a request");
        }
        if self.bus_bits < 8 || self.burst_length == 0 {
            return invalid("bus_bits", "burst must move at least one byte");
        }
        if self.channel_shift > 60 || self.bank_shift >= 64 || self.row_shift >= 64 {
            return invalid("channel_shift", "address fields must lie inside 64 bits");
        }
        if self.bank_bits == 0 || self.bank_bits > 8 {
            return invalid("bank_bits", "must be between 1 and 8");
        }
        if !(self.tck_ns.is_finite() && self.tck_ns > 0.0) {
            return invalid("tck_ns", "must be a positive number of nanoseconds");
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            model: MemoryModel::default(),
            bus_bits: defaults::BUS_BITS,
            burst_length: defaults::BURST_LENGTH,
            tck_ns: defaults::TCK_NS,
            queue_depth: defaults::QUEUE_DEPTH,
            read_latency: defaults::READ_LATENCY,
            write_latency: defaults::WRITE_LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            channel_shift: defaults::CHANNEL_SHIFT,
            bank_shift: defaults::BANK_SHIFT,
            bank_bits: defaults::BANK_BITS,
            row_shift: defaults::ROW_SHIFT,
        }
    }
}
