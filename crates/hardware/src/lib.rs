//! RV64 five-stage pipeline simulator library.
//!
//! This crate implements a cycle-approximate RV64IMC simulator with the following:
//! 1. **Core:** In-order pipeline (fetch, decode, execute, memory, writeback) with forwarding and hazard control.
//! 2. **Memory:** Demand-paged guest memory timed by a configurable cache hierarchy.
//! 3. **ISA:** Decoding of 32-bit and compressed integer instructions, plus a disassembler.
//! 4. **Prediction:** Static and 2-bit history-table branch predictors.
//! 5. **Simulation:** ELF loader, stack setup, configuration, and statistics collection.

/// Common types and constants (addresses, registers, errors, access types).
pub mod common;
/// Simulator configuration (defaults, cache topology, latency tables).
pub mod config;
/// CPU core (pipeline, execution units, syscall service).
pub mod core;
/// Instruction set (decode, instruction record, ABI, RV64I/M, RVC, disassembly).
pub mod isa;
/// Guest memory (page table, storage chain, timed accesses).
pub mod memory;
/// Program loader and run driver.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Fatal error type and crate-wide result alias.
pub use crate::common::error::{Result, RunOutcome, SimError, Stage, StageError};
/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Main CPU type; holds pipeline, predictor, memory, and stats.
pub use crate::core::Cpu;
/// Run driver; loads a program and ticks it to completion.
pub use crate::sim::Simulator;
