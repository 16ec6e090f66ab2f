//! Configuration system for the Tomasulo simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! machine. It provides:
//! 1. **Defaults:** Baseline hardware constants (station counts, latencies, queue sizes).
//! 2. **Structures:** Hierarchical config for general, units, LSQ, ROB, CDB, memory and predictor.
//! 3. **Validation:** Rejection of machine shapes the pipeline cannot be built with.
//!
//! Configuration is supplied as the `config` section of a machine image (JSON),
//! or use `Config::default()` for a stock machine.

use serde::Deserialize;

use crate::common::error::{SimError, SimResult};
use crate::isa::instruction::UnitKind;

/// Default configuration constants for the simulator.
///
/// These values define the baseline machine when not explicitly overridden
/// in the machine image.
mod defaults {
    /// Cycle budget before a run is abandoned.
    pub const MAX_CYCLES: u64 = 100_000;

    /// Integer adder: reservation stations per instance.
    pub const INT_ADDER_STATIONS: usize = 2;
    /// Integer adder: execute latency in cycles.
    pub const INT_ADDER_LATENCY: u64 = 1;

    /// Floating-point adder: reservation stations per instance.
    pub const FP_ADDER_STATIONS: usize = 3;
    /// Floating-point adder: execute latency in cycles.
    pub const FP_ADDER_LATENCY: u64 = 3;

    /// Floating-point multiplier: reservation stations per instance.
    pub const FP_MULTIPLIER_STATIONS: usize = 2;
    /// Floating-point multiplier: execute latency in cycles.
    ///
    /// Multiplication is the long pole of the default machine.
    pub const FP_MULTIPLIER_LATENCY: u64 = 20;

    /// Instances of each functional unit kind.
    pub const UNIT_COUNT: usize = 1;

    /// Load/store queue capacity.
    pub const LSQ_ENTRIES: usize = 3;
    /// Cycles spent in the LSQ address adder.
    pub const ADDRESS_LATENCY: u64 = 1;
    /// Cycles spent accessing data memory.
    pub const MEMORY_LATENCY: u64 = 4;

    /// Reorder buffer capacity.
    pub const ROB_ENTRIES: usize = 64;

    /// Result buffer depth per CDB source.
    pub const CDB_BUFFER_ENTRIES: usize = 1;

    /// Data memory size in bytes.
    pub const MEMORY_SIZE: usize = 256;
    /// Data memory word size in bytes.
    pub const WORD_BYTES: usize = 4;

    /// Registers in each architectural file.
    pub const REGISTER_COUNT: usize = 32;

    /// Branch target buffer entries.
    pub const BTB_ENTRIES: usize = 8;
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use tomasim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.rob.entries, 64);
/// assert_eq!(config.units.fp_multiplier.latency, 20);
/// ```
///
/// Deserializing a partial document:
///
/// ```
/// use tomasim_core::config::Config;
///
/// let json = r#"{
///     "units": { "int_adder": { "stations": 1, "latency": 2 } },
///     "rob": { "entries": 8 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.units.int_adder.stations, 1);
/// assert_eq!(config.units.int_adder.count, 1);
/// assert_eq!(config.units.fp_adder.latency, 3);
/// assert_eq!(config.rob.entries, 8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Functional unit shapes
    #[serde(default)]
    pub units: UnitsConfig,
    /// Load/store queue
    #[serde(default)]
    pub lsq: LsqConfig,
    /// Reorder buffer
    #[serde(default)]
    pub rob: RobConfig,
    /// Common data bus
    #[serde(default)]
    pub cdb: CdbConfig,
    /// Data memory
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Architectural register files
    #[serde(default)]
    pub registers: RegisterConfig,
    /// Branch predictor
    #[serde(default)]
    pub predictor: PredictorConfig,
}

impl Config {
    /// Checks that every capacity and latency describes a buildable machine.
    ///
    /// # Returns
    ///
    /// `SimError::Config` naming the first offending field.
    pub fn validate(&self) -> SimResult<()> {
        fn nonzero<T: PartialEq + Default>(value: T, field: &str) -> SimResult<()> {
            if value == T::default() {
                Err(SimError::Config(format!("{field} must be non-zero")))
            } else {
                Ok(())
            }
        }

        for kind in UnitKind::ALL {
            let unit = self.units.get(kind);
            nonzero(unit.stations, &format!("units.{}.stations", kind.key()))?;
            nonzero(unit.latency, &format!("units.{}.latency", kind.key()))?;
            nonzero(unit.count, &format!("units.{}.count", kind.key()))?;
        }
        nonzero(self.lsq.entries, "lsq.entries")?;
        nonzero(self.lsq.address_latency, "lsq.address_latency")?;
        nonzero(self.lsq.memory_latency, "lsq.memory_latency")?;
        nonzero(self.rob.entries, "rob.entries")?;
        nonzero(self.cdb.buffer_entries, "cdb.buffer_entries")?;
        nonzero(self.memory.word_bytes, "memory.word_bytes")?;
        nonzero(self.memory.size_bytes, "memory.size_bytes")?;
        nonzero(self.registers.count, "registers.count")?;
        nonzero(self.predictor.btb_entries, "predictor.btb_entries")?;
        nonzero(self.general.max_cycles, "general.max_cycles")?;

        if self.memory.word_bytes > 8 {
            return Err(SimError::Config(format!(
                "memory.word_bytes must be at most 8, got {}",
                self.memory.word_bytes
            )));
        }
        if self.memory.size_bytes % self.memory.word_bytes != 0 {
            return Err(SimError::Config(format!(
                "memory.size_bytes ({}) must be a multiple of memory.word_bytes ({})",
                self.memory.size_bytes, self.memory.word_bytes
            )));
        }
        if self.registers.count > usize::from(u8::MAX) + 1 {
            return Err(SimError::Config(format!(
                "registers.count must be at most 256, got {}",
                self.registers.count
            )));
        }
        Ok(())
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Emit per-stage debug events while simulating.
    #[serde(default)]
    pub trace: bool,

    /// Abort with `SimError::CycleLimit` after this many cycles.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,
}

impl GeneralConfig {
    /// Returns the default cycle budget.
    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

/// Shape of one functional unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UnitConfig {
    /// Reservation stations per instance
    pub stations: usize,
    /// Execute latency in cycles
    pub latency: u64,
    /// Number of independent instances
    #[serde(default = "UnitConfig::default_count")]
    pub count: usize,
}

impl UnitConfig {
    /// Returns the default number of instances.
    fn default_count() -> usize {
        defaults::UNIT_COUNT
    }
}

/// Functional unit configuration, one entry per unit kind.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitsConfig {
    /// Integer adder (also resolves branches)
    #[serde(default = "UnitsConfig::default_int_adder")]
    pub int_adder: UnitConfig,
    /// Floating-point adder
    #[serde(default = "UnitsConfig::default_fp_adder")]
    pub fp_adder: UnitConfig,
    /// Floating-point multiplier
    #[serde(default = "UnitsConfig::default_fp_multiplier")]
    pub fp_multiplier: UnitConfig,
}

impl UnitsConfig {
    /// Returns the configuration for a unit kind.
    pub const fn get(&self, kind: UnitKind) -> &UnitConfig {
        match kind {
            UnitKind::IntAdder => &self.int_adder,
            UnitKind::FpAdder => &self.fp_adder,
            UnitKind::FpMultiplier => &self.fp_multiplier,
        }
    }

    fn default_int_adder() -> UnitConfig {
        UnitConfig {
            stations: defaults::INT_ADDER_STATIONS,
            latency: defaults::INT_ADDER_LATENCY,
            count: defaults::UNIT_COUNT,
        }
    }

    fn default_fp_adder() -> UnitConfig {
        UnitConfig {
            stations: defaults::FP_ADDER_STATIONS,
            latency: defaults::FP_ADDER_LATENCY,
            count: defaults::UNIT_COUNT,
        }
    }

    fn default_fp_multiplier() -> UnitConfig {
        UnitConfig {
            stations: defaults::FP_MULTIPLIER_STATIONS,
            latency: defaults::FP_MULTIPLIER_LATENCY,
            count: defaults::UNIT_COUNT,
        }
    }
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            int_adder: Self::default_int_adder(),
            fp_adder: Self::default_fp_adder(),
            fp_multiplier: Self::default_fp_multiplier(),
        }
    }
}

/// Load/store queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LsqConfig {
    /// Queue capacity
    #[serde(default = "LsqConfig::default_entries")]
    pub entries: usize,
    /// Cycles in the address adder
    #[serde(default = "LsqConfig::default_address_latency")]
    pub address_latency: u64,
    /// Cycles per data memory access
    #[serde(default = "LsqConfig::default_memory_latency")]
    pub memory_latency: u64,
}

impl LsqConfig {
    fn default_entries() -> usize {
        defaults::LSQ_ENTRIES
    }

    fn default_address_latency() -> u64 {
        defaults::ADDRESS_LATENCY
    }

    fn default_memory_latency() -> u64 {
        defaults::MEMORY_LATENCY
    }
}

impl Default for LsqConfig {
    fn default() -> Self {
        Self {
            entries: defaults::LSQ_ENTRIES,
            address_latency: defaults::ADDRESS_LATENCY,
            memory_latency: defaults::MEMORY_LATENCY,
        }
    }
}

/// Reorder buffer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RobConfig {
    /// Number of in-flight instructions
    #[serde(default = "RobConfig::default_entries")]
    pub entries: usize,
}

impl RobConfig {
    fn default_entries() -> usize {
        defaults::ROB_ENTRIES
    }
}

impl Default for RobConfig {
    fn default() -> Self {
        Self {
            entries: defaults::ROB_ENTRIES,
        }
    }
}

/// Common data bus configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CdbConfig {
    /// Results each source may buffer while waiting for the bus
    #[serde(default = "CdbConfig::default_buffer_entries")]
    pub buffer_entries: usize,
}

impl CdbConfig {
    fn default_buffer_entries() -> usize {
        defaults::CDB_BUFFER_ENTRIES
    }
}

impl Default for CdbConfig {
    fn default() -> Self {
        Self {
            buffer_entries: defaults::CDB_BUFFER_ENTRIES,
        }
    }
}

/// Data memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Total size in bytes
    #[serde(default = "MemoryConfig::default_size_bytes")]
    pub size_bytes: usize,
    /// Word size in bytes; every access must be aligned to it
    #[serde(default = "MemoryConfig::default_word_bytes")]
    pub word_bytes: usize,
}

impl MemoryConfig {
    fn default_size_bytes() -> usize {
        defaults::MEMORY_SIZE
    }

    fn default_word_bytes() -> usize {
        defaults::WORD_BYTES
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::MEMORY_SIZE,
            word_bytes: defaults::WORD_BYTES,
        }
    }
}

/// Architectural register file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConfig {
    /// Registers per file (integer and floating-point)
    #[serde(default = "RegisterConfig::default_count")]
    pub count: usize,
}

impl RegisterConfig {
    fn default_count() -> usize {
        defaults::REGISTER_COUNT
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            count: defaults::REGISTER_COUNT,
        }
    }
}

/// Branch predictor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// Entries in the branch target buffer
    #[serde(default = "PredictorConfig::default_btb_entries")]
    pub btb_entries: usize,
}

impl PredictorConfig {
    fn default_btb_entries() -> usize {
        defaults::BTB_ENTRIES
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            btb_entries: defaults::BTB_ENTRIES,
        }
    }
}
