//! Instruction pipeline implementation.
//!
//! This module contains the five-stage in-order pipeline.
//! It includes the following components:
//! 1. **Latches:** the five pipeline registers and their commit rule.
//! 2. **Hazards:** forwarding, branch resolution and stall/bubble control.
//! 3. **Stages:** Fetch, Decode, Execute, Memory and Writeback.
//! 4. **Engine:** the per-tick driver tying them together.

/// Per-tick pipeline driver.
pub mod engine;

/// Forwarding, branch resolution and control signals.
pub mod hazards;

/// Pipeline registers (F, IF/ID, ID/EX, EX/MEM, MEM/WB).
pub mod latches;

/// Pipeline stage implementations (fetch, decode, execute, memory, writeback).
pub mod stages;
