//! Simulator configuration.
//!
//! This module defines all configuration structures used to parameterize a
//! run. It provides:
//! 1. **Defaults:** Baseline constants matching the reference machine (four
//!    cores, 100-cycle memory, 2-cycle-per-word bus).
//! 2. **Structures:** Cache geometry, timing, and the top-level run config.
//! 3. **Validation:** Range checks applied before any component is built.
//!
//! Configuration is normally assembled from command-line flags, but every
//! structure also deserializes from JSON for scripted experiments.

use serde::Deserialize;
use std::path::PathBuf;

use crate::common::{CacheGeometry, SimError};

/// Default configuration constants.
///
/// These values define the baseline system when a parameter is not
/// explicitly overridden.
mod defaults {
    /// Number of processor cores sharing the bus.
    pub const NUM_CORES: usize = 4;

    /// Set-index bits (64 sets).
    pub const SET_BITS: u32 = 6;

    /// Associativity (lines per set).
    pub const ASSOCIATIVITY: usize = 2;

    /// Block-offset bits (32-byte blocks).
    pub const BLOCK_BITS: u32 = 5;

    /// Main-memory access latency in cycles, charged for a block fetch or a
    /// dirty write-back.
    pub const MEM_LATENCY: u64 = 100;

    /// Bus transfer time per word, in cycles. Control packets (upgrades and
    /// invalidates) occupy the bus for one word time.
    pub const BUS_WORD_LATENCY: u64 = 2;

    /// Word size in bytes. Blocks are transferred word by word.
    pub const WORD_BYTES: usize = 4;

    /// Safety cap on simulated cycles, guarding against pathological traces.
    pub const MAX_CYCLES: u64 = 10_000_000;
}

/// Cache geometry parameters shared by every private L1 cache.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheParams {
    /// Number of set-index bits (`s`); the cache has `2^s` sets.
    #[serde(default = "CacheParams::default_set_bits")]
    pub set_bits: u32,

    /// Associativity (`E`): number of lines per set.
    #[serde(default = "CacheParams::default_associativity")]
    pub associativity: usize,

    /// Number of block-offset bits (`b`); blocks are `2^b` bytes.
    #[serde(default = "CacheParams::default_block_bits")]
    pub block_bits: u32,
}

impl CacheParams {
    fn default_set_bits() -> u32 {
        defaults::SET_BITS
    }

    fn default_associativity() -> usize {
        defaults::ASSOCIATIVITY
    }

    fn default_block_bits() -> u32 {
        defaults::BLOCK_BITS
    }

    /// Returns the address-split geometry for these parameters.
    pub fn geometry(&self) -> CacheGeometry {
        CacheGeometry::new(self.set_bits, self.block_bits)
    }

    /// Block size in bytes (`2^b`).
    pub fn block_bytes(&self) -> usize {
        1usize << self.block_bits
    }

    /// Number of sets (`2^s`).
    pub fn num_sets(&self) -> usize {
        1usize << self.set_bits
    }
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            set_bits: defaults::SET_BITS,
            associativity: defaults::ASSOCIATIVITY,
            block_bits: defaults::BLOCK_BITS,
        }
    }
}

/// Timing parameters for the bus and main memory.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimingParams {
    /// Main-memory latency in cycles.
    #[serde(default = "TimingParams::default_mem_latency")]
    pub mem_latency: u64,

    /// Bus transfer time per word in cycles.
    #[serde(default = "TimingParams::default_bus_word_latency")]
    pub bus_word_latency: u64,

    /// Word size in bytes.
    #[serde(default = "TimingParams::default_word_bytes")]
    pub word_bytes: usize,
}

impl TimingParams {
    fn default_mem_latency() -> u64 {
        defaults::MEM_LATENCY
    }

    fn default_bus_word_latency() -> u64 {
        defaults::BUS_WORD_LATENCY
    }

    fn default_word_bytes() -> usize {
        defaults::WORD_BYTES
    }

    /// Cycles to move one block of `block_bytes` across the bus.
    pub fn block_transfer_cycles(&self, block_bytes: usize) -> u64 {
        self.bus_word_latency * (block_bytes / self.word_bytes) as u64
    }
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            mem_latency: defaults::MEM_LATENCY,
            bus_word_latency: defaults::BUS_WORD_LATENCY,
            word_bytes: defaults::WORD_BYTES,
        }
    }
}

/// Top-level configuration for one simulation run.
///
/// # Examples
///
/// ```
/// use l1sim_core::config::SimConfig;
///
/// let json = r#"{
///     "app_name": "app1",
///     "cache": { "set_bits": 2, "associativity": 2, "block_bits": 4 }
/// }"#;
///
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.app_name, "app1");
/// assert_eq!(config.num_cores, 4);
/// assert_eq!(config.cache.num_sets(), 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Application name; core `i` reads `{app_name}_proc{i}.trace`.
    #[serde(default)]
    pub app_name: String,

    /// Number of cores (and private caches) sharing the bus.
    #[serde(default = "SimConfig::default_num_cores")]
    pub num_cores: usize,

    /// Cache geometry.
    #[serde(default)]
    pub cache: CacheParams,

    /// Bus and memory timing.
    #[serde(default)]
    pub timing: TimingParams,

    /// Cap on simulated cycles; the run is abandoned with a warning if
    /// reached.
    #[serde(default = "SimConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Optional file the final statistics report is written to.
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

impl SimConfig {
    fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }

    /// Checks every parameter range the simulator depends on.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigInvalid`] if any parameter is non-positive,
    /// the block is too small to hold a word, or the set and block bits do
    /// not leave room for a tag in a 32-bit address.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_cores == 0 {
            return Err(SimError::ConfigInvalid(
                "number of cores must be positive".into(),
            ));
        }
        if self.cache.set_bits == 0 {
            return Err(SimError::ConfigInvalid(
                "set-index bits (-s) must be positive".into(),
            ));
        }
        if self.cache.associativity == 0 {
            return Err(SimError::ConfigInvalid(
                "associativity (-E) must be positive".into(),
            ));
        }
        if self.cache.block_bits < 2 {
            return Err(SimError::ConfigInvalid(
                "block bits (-b) must be at least 2 to hold a 4-byte word".into(),
            ));
        }
        if self.cache.set_bits + self.cache.block_bits >= 32 {
            return Err(SimError::ConfigInvalid(format!(
                "set bits + block bits must be below 32, got {}",
                self.cache.set_bits + self.cache.block_bits
            )));
        }
        if self.timing.word_bytes == 0 || self.cache.block_bytes() < self.timing.word_bytes {
            return Err(SimError::ConfigInvalid(
                "block must hold at least one word".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            num_cores: defaults::NUM_CORES,
            cache: CacheParams::default(),
            timing: TimingParams::default(),
            max_cycles: defaults::MAX_CYCLES,
            output_file: None,
        }
    }
}
