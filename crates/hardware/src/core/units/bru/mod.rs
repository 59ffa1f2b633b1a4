//! Branch prediction unit (BRU).
//!
//! Conditional branch direction predictors and the enum wrapper the fetch
//! stage dispatches through.

pub use self::branch_predictor::BranchPredictor;

/// Branch predictor trait.
pub mod branch_predictor;

/// 2-bit branch history table.
pub mod bht;

/// Static policies (never taken, always taken, BTFNT).
pub mod static_bp;

use self::{
    bht::BhtPredictor,
    static_bp::{AlwaysTakenPredictor, BtfntPredictor, NeverTakenPredictor},
};
use crate::config::BranchPredictorKind;

/// Enum wrapper for static dispatch of Branch Predictors.
/// This avoids vtable lookups in the fetch path.
#[derive(Clone, Debug)]
pub enum BranchPredictorWrapper {
    /// Always falls through.
    NeverTaken(NeverTakenPredictor),
    /// Always jumps.
    AlwaysTaken(AlwaysTakenPredictor),
    /// Backward taken, forward not taken.
    Btfnt(BtfntPredictor),
    /// 2-bit history table.
    Bht(BhtPredictor),
}

impl BranchPredictorWrapper {
    /// Creates the predictor selected by `kind` in its initial state.
    pub fn new(kind: BranchPredictorKind) -> Self {
        match kind {
            BranchPredictorKind::NeverTaken => Self::NeverTaken(NeverTakenPredictor),
            BranchPredictorKind::AlwaysTaken => Self::AlwaysTaken(AlwaysTakenPredictor),
            BranchPredictorKind::Btfnt => Self::Btfnt(BtfntPredictor),
            BranchPredictorKind::BranchHistoryTable => Self::Bht(BhtPredictor::new()),
        }
    }
}

impl BranchPredictor for BranchPredictorWrapper {
    #[inline(always)]
    fn predict(&self, next_pc: u64, target_pc: u64) -> u64 {
        match self {
            Self::NeverTaken(bp) => bp.predict(next_pc, target_pc),
            Self::AlwaysTaken(bp) => bp.predict(next_pc, target_pc),
            Self::Btfnt(bp) => bp.predict(next_pc, target_pc),
            Self::Bht(bp) => bp.predict(next_pc, target_pc),
        }
    }

    #[inline(always)]
    fn feedback(&mut self, next_pc: u64, taken: bool) {
        match self {
            Self::NeverTaken(bp) => bp.feedback(next_pc, taken),
            Self::AlwaysTaken(bp) => bp.feedback(next_pc, taken),
            Self::Btfnt(bp) => bp.feedback(next_pc, taken),
            Self::Bht(bp) => bp.feedback(next_pc, taken),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NeverTaken(bp) => bp.name(),
            Self::AlwaysTaken(bp) => bp.name(),
            Self::Btfnt(bp) => bp.name(),
            Self::Bht(bp) => bp.name(),
        }
    }
}
