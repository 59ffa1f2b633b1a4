//! Static Branch Predictors.
//!
//! Fixed policies that ignore history; `feedback` is a no-op for all three.

use super::BranchPredictor;

/// Predicts every branch falls through.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverTakenPredictor;

impl BranchPredictor for NeverTakenPredictor {
    fn predict(&self, next_pc: u64, _target_pc: u64) -> u64 {
        next_pc
    }

    fn feedback(&mut self, _next_pc: u64, _taken: bool) {}

    fn name(&self) -> &'static str {
        "never taken"
    }
}

/// Predicts every branch is taken.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysTakenPredictor;

impl BranchPredictor for AlwaysTakenPredictor {
    fn predict(&self, _next_pc: u64, target_pc: u64) -> u64 {
        target_pc
    }

    fn feedback(&mut self, _next_pc: u64, _taken: bool) {}

    fn name(&self) -> &'static str {
        "always taken"
    }
}

/// Backward taken, forward not taken.
///
/// Picks the lower of the two addresses, so loop back-edges are predicted
/// taken and forward skips fall through.
#[derive(Clone, Copy, Debug, Default)]
pub struct BtfntPredictor;

impl BranchPredictor for BtfntPredictor {
    fn predict(&self, next_pc: u64, target_pc: u64) -> u64 {
        next_pc.min(target_pc)
    }

    fn feedback(&mut self, _next_pc: u64, _taken: bool) {}

    fn name(&self) -> &'static str {
        "backward taken, forward not taken"
    }
}
