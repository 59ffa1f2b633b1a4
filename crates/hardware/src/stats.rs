//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for one run. It provides:
//! 1. **Cycle and CPI:** total cycles and retired instructions.
//! 2. **Branch prediction:** resolved conditional branches and accuracy.
//! 3. **Control events:** ticks lost to mispredictions, `jalr` waits and data stalls.
//!
//! Memory-side figures (AMAT, cache hit rates, heap size) live in
//! [`crate::memory::MemoryReport`].

use std::fmt;

use crate::core::pipeline::hazards::ControlSignals;

/// Counters collected by the tick engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Name of the active branch predictor.
    pub predictor: &'static str,
    /// Total cycles (sum of the slowest stage of every tick).
    pub cycles: u64,
    /// Instructions that reached write-back.
    pub instructions: u64,
    /// Conditional branches resolved in execute.
    pub total_branch: u64,
    /// Of those, correctly predicted.
    pub correct_branch: u64,
    /// Ticks with a misprediction flush.
    pub mispredicted_time: u64,
    /// Ticks fetch waited for a `jalr` target.
    pub meet_jalr_time: u64,
    /// Ticks decode stalled on an operand or an in-flight `ecall`.
    pub data_dependent_time: u64,
}

impl SimStats {
    /// Fresh counters for a run using `predictor`.
    pub fn new(predictor: &'static str) -> Self {
        Self {
            predictor,
            ..Self::default()
        }
    }

    /// Cycles per instruction, 0 before anything retires.
    pub fn cpi(&self) -> f64 {
        if self.instructions == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions as f64
        }
    }

    /// Percentage of correctly predicted branches, 0 without branches.
    pub fn branch_accuracy(&self) -> f64 {
        if self.total_branch == 0 {
            0.0
        } else {
            self.correct_branch as f64 / self.total_branch as f64 * 100.0
        }
    }

    /// Counts one resolved branch.
    pub fn record_branch(&mut self, correct: bool) {
        self.total_branch += 1;
        self.correct_branch += u64::from(correct);
    }

    /// Counts the control events of one tick.
    pub fn record_signals(&mut self, signals: ControlSignals) {
        self.mispredicted_time += u64::from(signals.mispredicted);
        self.meet_jalr_time += u64::from(signals.meet_jalr);
        self.data_dependent_time += u64::from(signals.data_dependent);
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "instructions={} cycles={} CPI={:.3}",
            self.instructions,
            self.cycles,
            self.cpi()
        )?;
        writeln!(
            f,
            "branch ({}): total_branch={} accuracy={:.3}%",
            self.predictor,
            self.total_branch,
            self.branch_accuracy()
        )?;
        writeln!(f, "mispredicted_time={}", self.mispredicted_time)?;
        writeln!(f, "meet_jalr_time={}", self.meet_jalr_time)?;
        writeln!(f, "data_dependent_time={}", self.data_dependent_time)
    }
}
