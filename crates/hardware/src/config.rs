//! Configuration system for the pipeline simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline latencies, stack size and memory timing.
//! 2. **Structures:** ALU and syscall cycle costs, the cache topology list, and the root `Config`.
//! 3. **Validation:** Start-up checks that reject malformed hierarchies before a run begins.
//! 4. **Latency Tables:** Read-only per-operation cost tables derived once from the config.
//!
//! Configuration is supplied as JSON (see `Config::from_json`) or built with `Config::default()`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::common::error::{Result, SimError};
use crate::core::units::alu::AluOp;

/// Name under which main memory appears in `cache_for`.
pub const MEMORY_LEVEL_NAME: &str = "memory";

/// Default configuration constants for the simulator.
mod defaults {
    /// Stack reservation in KiB.
    pub const STACK_SIZE_KB: u64 = 1024;

    /// Main memory latency in cycles.
    pub const MEMORY_CYCLES: u64 = crate::common::constants::DEFAULT_MEMORY_CYCLES;

    /// Cache line size in bytes.
    pub const CACHE_LINE: u64 = 64;

    /// Add and subtract latency.
    pub const ADD_SUB_CYCLES: u64 = 1;

    /// Multiply latency (all four variants).
    pub const MUL_CYCLES: u64 = 3;

    /// Divide and remainder latency.
    pub const DIV_REM_CYCLES: u64 = 30;

    /// Shift and bitwise logic latency.
    pub const BIT_OP_CYCLES: u64 = 1;

    /// Set-less-than latency.
    pub const SLT_CYCLES: u64 = 1;

    /// Console output syscall cost.
    pub const CPUTCHAR_CYCLES: u64 = 2000;

    /// Heap growth syscall cost.
    pub const SBRK_CYCLES: u64 = 1000;

    /// Blocking integer read syscall cost.
    pub const READINT_CYCLES: u64 = 10000;

    /// Wall-clock syscall cost.
    pub const TIME_CYCLES: u64 = 1000;
}

/// Branch prediction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchPredictorKind {
    /// Always predict the fall-through pc.
    NeverTaken,
    /// Always predict the branch target.
    AlwaysTaken,
    /// Backward taken, forward not taken.
    #[serde(alias = "BTFNT")]
    Btfnt,
    /// Table of 2-bit saturating counters.
    #[default]
    BranchHistoryTable,
}

impl std::str::FromStr for BranchPredictorKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "never_taken" => Ok(Self::NeverTaken),
            "always_taken" => Ok(Self::AlwaysTaken),
            "btfnt" | "BTFNT" => Ok(Self::Btfnt),
            "branch_history_table" => Ok(Self::BranchHistoryTable),
            other => Err(SimError::Configuration(format!(
                "no branch prediction strategy named {other}"
            ))),
        }
    }
}

/// Cycle cost of each ALU operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AluCycles {
    /// `add`, `sub` and everything that reduces to an addition.
    #[serde(default = "AluCycles::default_add_sub")]
    pub add_sub: u64,
    /// `mul`, `mulh`, `mulhsu`, `mulhu`.
    #[serde(default = "AluCycles::default_mul")]
    pub mul: u64,
    /// `div`, `divu`, `rem`, `remu`.
    #[serde(default = "AluCycles::default_div_rem")]
    pub div_rem: u64,
    /// Shifts and bitwise logic.
    #[serde(default = "AluCycles::default_bit_op")]
    pub bit_op: u64,
    /// `slt`, `sltu`.
    #[serde(default = "AluCycles::default_slt")]
    pub slt: u64,
}

impl AluCycles {
    const fn default_add_sub() -> u64 {
        defaults::ADD_SUB_CYCLES
    }

    const fn default_mul() -> u64 {
        defaults::MUL_CYCLES
    }

    const fn default_div_rem() -> u64 {
        defaults::DIV_REM_CYCLES
    }

    const fn default_bit_op() -> u64 {
        defaults::BIT_OP_CYCLES
    }

    const fn default_slt() -> u64 {
        defaults::SLT_CYCLES
    }

    /// Returns the configured cost of `op`.
    pub const fn cost(&self, op: AluOp) -> u64 {
        match op {
            AluOp::Add | AluOp::Sub => self.add_sub,
            AluOp::Mul | AluOp::Mulh | AluOp::Mulhsu | AluOp::Mulhu => self.mul,
            AluOp::Div | AluOp::Divu | AluOp::Rem | AluOp::Remu => self.div_rem,
            AluOp::Sll | AluOp::Sra | AluOp::Srl | AluOp::Xor | AluOp::Or | AluOp::And => {
                self.bit_op
            }
            AluOp::Slt | AluOp::Sltu => self.slt,
        }
    }
}

impl Default for AluCycles {
    fn default() -> Self {
        Self {
            add_sub: defaults::ADD_SUB_CYCLES,
            mul: defaults::MUL_CYCLES,
            div_rem: defaults::DIV_REM_CYCLES,
            bit_op: defaults::BIT_OP_CYCLES,
            slt: defaults::SLT_CYCLES,
        }
    }
}

/// Cycle cost charged for each host-serviced syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcallCycles {
    /// Console character output.
    #[serde(default = "EcallCycles::default_cputchar")]
    pub cputchar: u64,
    /// Heap growth.
    #[serde(default = "EcallCycles::default_sbrk")]
    pub sbrk: u64,
    /// Blocking integer read.
    #[serde(default = "EcallCycles::default_readint")]
    pub readint: u64,
    /// Wall-clock read.
    #[serde(default = "EcallCycles::default_time")]
    pub time: u64,
}

impl EcallCycles {
    const fn default_cputchar() -> u64 {
        defaults::CPUTCHAR_CYCLES
    }

    const fn default_sbrk() -> u64 {
        defaults::SBRK_CYCLES
    }

    const fn default_readint() -> u64 {
        defaults::READINT_CYCLES
    }

    const fn default_time() -> u64 {
        defaults::TIME_CYCLES
    }
}

impl Default for EcallCycles {
    fn default() -> Self {
        Self {
            cputchar: defaults::CPUTCHAR_CYCLES,
            sbrk: defaults::SBRK_CYCLES,
            readint: defaults::READINT_CYCLES,
            time: defaults::TIME_CYCLES,
        }
    }
}

/// One level of the cache hierarchy.
///
/// # Examples
///
/// ```
/// use rvpipe_core::config::CacheConfig;
///
/// let l1: CacheConfig = serde_json::from_str(
///     r#"{ "name": "L1D", "size": 32, "associativity": 8, "hit_cycles": 1,
///          "cache_for": "memory", "data_entry": true }"#,
/// ).unwrap();
/// assert_eq!(l1.cache_line_bytes, 64);
/// assert!(l1.write_back && l1.write_allocate);
/// assert_eq!(l1.num_sets(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Unique level name referenced by other levels' `cache_for`.
    pub name: String,

    /// Capacity in KiB.
    pub size: u64,

    /// Ways per set.
    pub associativity: u64,

    /// Line size in bytes.
    #[serde(default = "CacheConfig::default_line")]
    pub cache_line_bytes: u64,

    /// Dirty lines reach the next level only on eviction.
    #[serde(default = "CacheConfig::default_true")]
    pub write_back: bool,

    /// Missed writes fill the line before writing.
    #[serde(default = "CacheConfig::default_true")]
    pub write_allocate: bool,

    /// Latency of a hit at this level.
    pub hit_cycles: u64,

    /// Name of the next level (another cache or `"memory"`).
    pub cache_for: String,

    /// Instruction fetches enter the hierarchy here.
    #[serde(default)]
    pub instruction_entry: bool,

    /// Loads and stores enter the hierarchy here.
    #[serde(default)]
    pub data_entry: bool,
}

impl CacheConfig {
    const fn default_line() -> u64 {
        defaults::CACHE_LINE
    }

    const fn default_true() -> bool {
        true
    }

    /// Capacity in bytes.
    pub const fn size_bytes(&self) -> u64 {
        self.size * 1024
    }

    /// Number of sets implied by capacity, line size and associativity.
    pub const fn num_sets(&self) -> u64 {
        if self.cache_line_bytes == 0 || self.associativity == 0 {
            0
        } else {
            self.size_bytes() / self.cache_line_bytes / self.associativity
        }
    }

    fn validate(&self) -> Result<()> {
        let bad = |why: &str| SimError::Configuration(format!("cache {}: {why}", self.name));
        if self.name.is_empty() || self.name == MEMORY_LEVEL_NAME {
            return Err(SimError::Configuration(format!(
                "invalid cache name {:?}",
                self.name
            )));
        }
        if self.size == 0 || self.associativity == 0 {
            return Err(bad("size and associativity must be non-zero"));
        }
        if !self.cache_line_bytes.is_power_of_two() || self.cache_line_bytes < 8 {
            return Err(bad("cache_line_bytes must be a power of two and at least 8"));
        }
        if self.cache_line_bytes > crate::common::constants::PAGE_SIZE {
            return Err(bad("cache_line_bytes must not exceed the page size"));
        }
        let sets = self.num_sets();
        if sets == 0 || !sets.is_power_of_two() {
            return Err(bad("size / line / associativity must be a power of two"));
        }
        if self.cache_for == self.name {
            return Err(bad("a cache cannot be its own next level"));
        }
        Ok(())
    }
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use rvpipe_core::config::{BranchPredictorKind, Config};
///
/// let config = Config::default();
/// assert!(config.data_forwarding);
/// assert_eq!(config.branch_predictor, BranchPredictorKind::BranchHistoryTable);
/// assert!(config.cache.is_empty());
/// ```
///
/// Deserializing a two-level hierarchy from JSON:
///
/// ```
/// use rvpipe_core::config::{BranchPredictorKind, Config};
///
/// let json = r#"{
///     "data_forwarding": false,
///     "branch_predictor": "btfnt",
///     "alu_cycles": { "div_rem": 40 },
///     "cache": [
///         { "name": "L1", "size": 32, "associativity": 8, "hit_cycles": 1,
///           "cache_for": "L2", "instruction_entry": true, "data_entry": true },
///         { "name": "L2", "size": 256, "associativity": 8, "hit_cycles": 8,
///           "cache_for": "memory" }
///     ]
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(!config.data_forwarding);
/// assert_eq!(config.branch_predictor, BranchPredictorKind::Btfnt);
/// assert_eq!(config.alu_cycles.div_rem, 40);
/// assert_eq!(config.alu_cycles.mul, 3);
/// assert_eq!(config.cache.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Bypass results from EX/MEM/WB instead of stalling on every dependency.
    #[serde(default = "Config::default_true")]
    pub data_forwarding: bool,

    /// Stack reservation in KiB.
    #[serde(default = "Config::default_stack_size")]
    pub stack_size: u64,

    /// Branch predictor variant.
    #[serde(default)]
    pub branch_predictor: BranchPredictorKind,

    /// Main memory latency in cycles.
    #[serde(default = "Config::default_memory_cycles")]
    pub memory_cycles: u64,

    /// Per-class ALU latencies.
    #[serde(default)]
    pub alu_cycles: AluCycles,

    /// Per-service syscall latencies.
    #[serde(default)]
    pub ecall_cycles: EcallCycles,

    /// Cache levels; empty means every access goes straight to memory.
    #[serde(default)]
    pub cache: Vec<CacheConfig>,
}

impl Config {
    const fn default_true() -> bool {
        true
    }

    const fn default_stack_size() -> u64 {
        defaults::STACK_SIZE_KB
    }

    const fn default_memory_cycles() -> u64 {
        defaults::MEMORY_CYCLES
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` for malformed JSON, missing
    /// required cache fields, or a hierarchy `validate` rejects.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SimError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cache topology.
    ///
    /// Every level must have sane geometry, names must be unique, every
    /// `cache_for` must resolve, the chain must end in main memory, and at
    /// most one level may be the instruction or data entry.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for level in &self.cache {
            level.validate()?;
            if !names.insert(level.name.as_str()) {
                return Err(SimError::Configuration(format!(
                    "duplicate cache name {}",
                    level.name
                )));
            }
        }

        let next: HashMap<&str, &str> = self
            .cache
            .iter()
            .map(|c| (c.name.as_str(), c.cache_for.as_str()))
            .collect();
        for level in &self.cache {
            let mut cur = level.cache_for.as_str();
            let mut hops = 0;
            while cur != MEMORY_LEVEL_NAME {
                cur = next.get(cur).copied().ok_or_else(|| {
                    SimError::Configuration(format!(
                        "cache {} names unknown next level {}",
                        level.name, cur
                    ))
                })?;
                hops += 1;
                if hops > self.cache.len() {
                    return Err(SimError::Configuration(format!(
                        "cache chain starting at {} never reaches memory",
                        level.name
                    )));
                }
            }
        }

        for (what, count) in [
            (
                "instruction",
                self.cache.iter().filter(|c| c.instruction_entry).count(),
            ),
            ("data", self.cache.iter().filter(|c| c.data_entry).count()),
        ] {
            if count > 1 {
                return Err(SimError::Configuration(format!(
                    "{count} caches claim to be the {what} entry"
                )));
            }
        }

        if self.memory_cycles == 0 {
            return Err(SimError::Configuration(
                "memory_cycles must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Builds the read-only latency tables consumed by the pipeline.
    pub fn latencies(&self) -> LatencyTable {
        LatencyTable::new(&self.alu_cycles, &self.ecall_cycles)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_forwarding: true,
            stack_size: defaults::STACK_SIZE_KB,
            branch_predictor: BranchPredictorKind::default(),
            memory_cycles: defaults::MEMORY_CYCLES,
            alu_cycles: AluCycles::default(),
            ecall_cycles: EcallCycles::default(),
            cache: Vec::new(),
        }
    }
}

/// Per-operation latencies, resolved once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyTable {
    alu: [u64; AluOp::COUNT],
    /// Syscall costs by service.
    pub ecall: EcallCycles,
}

impl LatencyTable {
    /// Expands the per-class costs into a per-op table.
    pub fn new(alu: &AluCycles, ecall: &EcallCycles) -> Self {
        let mut table = [0; AluOp::COUNT];
        for op in AluOp::ALL {
            table[op as usize] = alu.cost(op);
        }
        Self {
            alu: table,
            ecall: *ecall,
        }
    }

    /// Cycles charged for one ALU evaluation of `op`.
    #[inline]
    pub const fn alu(&self, op: AluOp) -> u64 {
        self.alu[op as usize]
    }
}

impl Default for LatencyTable {
    fn default() -> Self {
        Self::new(&AluCycles::default(), &EcallCycles::default())
    }
}
