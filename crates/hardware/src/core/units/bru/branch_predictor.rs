//! Branch Predictor Interface.
//!
//! Every predictor answers one question: given the fall-through address and
//! the taken target of a conditional branch, which one should fetch follow?
//! Both addresses are known at fetch time (the offset is in the instruction),
//! so no target buffer is needed.

/// Trait for conditional branch direction predictors.
pub trait BranchPredictor {
    /// Returns the predicted next pc, always one of `next_pc` or `target_pc`.
    ///
    /// # Arguments
    ///
    /// * `next_pc` - Address of the instruction after the branch (`pc + size`)
    /// * `target_pc` - Address the branch jumps to when taken
    fn predict(&self, next_pc: u64, target_pc: u64) -> u64;

    /// Trains the predictor with the resolved outcome.
    ///
    /// Called exactly once per executed conditional branch, keyed by the
    /// same `next_pc` that was passed to [`BranchPredictor::predict`].
    fn feedback(&mut self, next_pc: u64, taken: bool);

    /// Human-readable name used in the statistics report.
    fn name(&self) -> &'static str;
}
