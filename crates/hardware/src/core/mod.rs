//! Core processor implementation.
//!
//! This module contains the CPU, the five-stage in-order pipeline that
//! drives it, and the execution units the stages use.

/// CPU state and syscall service.
pub mod cpu;

/// Pipeline registers, hazard unit, stages and the tick engine.
pub mod pipeline;

/// Execution units (ALU, branch predictors, caches).
pub mod units;

pub use self::cpu::Cpu;
