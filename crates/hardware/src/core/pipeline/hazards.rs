//! Data Hazard Detection, Forwarding and Control Signals.
//!
//! This module keeps the pipeline consistent while five instructions are in
//! flight. It provides:
//! 1. **Operand Forwarding:** bypasses results still in EX, MEM or WB to decode.
//! 2. **Branch Resolution:** misprediction detection and predictor training.
//! 3. **Control Signals:** stall and bubble bits for the next commit.
//!
//! Signal priority: a misprediction suppresses data and jalr stalls, and a
//! data stall suppresses the jalr fetch hold.

use crate::common::reg::RegisterFile;
use crate::core::pipeline::latches::{ExecuteReg, Latches, MemoryReg};
use crate::core::units::bru::BranchPredictor;
use crate::isa::instruction::OpClass;

/// Returns the value of register `rs` as seen by the instruction in decode.
///
/// With forwarding on, the nearest older producer wins: the instruction in
/// execute (its ALU result, or link address for jumps and branches), then
/// memory (its load or pass-through value), then write-back. Otherwise the
/// register file is read.
///
/// # Arguments
///
/// * `cur` - Pipeline registers at the start of the tick.
/// * `next` - Stage outputs computed so far this tick (`m` and `w` filled).
pub fn select_value(
    cur: &Latches,
    next: &Latches,
    regs: &RegisterFile,
    forwarding: bool,
    rs: usize,
) -> u64 {
    if forwarding && rs != 0 {
        if cur.e.inst.rd == rs {
            return if cur.e.inst.class.is_control_transfer() {
                next.m.val2
            } else {
                next.m.val_e
            };
        } else if cur.m.inst.rd == rs {
            return next.w.val;
        } else if cur.w.inst.rd == rs {
            return cur.w.val;
        }
    }
    regs.read(rs)
}

/// Hazard and control-flow conditions detected at the end of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlSignals {
    /// The branch in execute went the other way than fetch assumed.
    pub mispredicted: bool,
    /// A `jalr` is in decode or execute; fetch waits for its target.
    pub meet_jalr: bool,
    /// Decode must wait (operand not ready, or an `ecall` is in flight).
    pub data_dependent: bool,
}

/// Resolves the conditional branch leaving execute, if any.
///
/// Re-predicts with the same inputs fetch used, compares against the actual
/// outcome, then trains the predictor once. Returns `None` when execute does
/// not hold a branch.
pub fn resolve_branch<B: BranchPredictor>(
    e: &ExecuteReg,
    m: &MemoryReg,
    predictor: &mut B,
) -> Option<bool> {
    if e.slot.bubble || e.inst.class != OpClass::Branch {
        return None;
    }
    // m.val2 is the fall-through address, m.val_e the taken target
    let predicted = predictor.predict(m.val2, m.val_e);
    let actual = if m.cond { m.val_e } else { m.val2 };
    predictor.feedback(m.val2, m.cond);
    Some(predicted != actual)
}

/// Computes the control signals from the current registers and this tick's
/// decode output `next.e`.
pub fn detect(cur: &Latches, next: &Latches, forwarding: bool, mispredicted: bool) -> ControlSignals {
    let decoding = &next.e.inst;
    let sources = [decoding.rs1, decoding.rs2];

    let mut meet_jalr =
        decoding.class == OpClass::Jalr || cur.e.inst.class == OpClass::Jalr;

    let meet_ecall = cur.e.inst.class == OpClass::Ecall
        || cur.m.inst.class == OpClass::Ecall
        || cur.w.inst.class == OpClass::Ecall;

    let mut data_dependent = if forwarding {
        cur.e.inst.class == OpClass::Load
            && sources.iter().any(|&rs| rs != 0 && rs == cur.e.inst.rd)
    } else {
        sources.iter().any(|&rs| {
            rs != 0 && (cur.e.inst.rd == rs || cur.m.inst.rd == rs || cur.w.inst.rd == rs)
        })
    };

    data_dependent |= meet_ecall;
    data_dependent &= !mispredicted;
    meet_jalr &= !mispredicted && !data_dependent;

    ControlSignals {
        mispredicted,
        meet_jalr,
        data_dependent,
    }
}

/// Writes the control bits that decide how each register commits.
pub fn apply(cur: &mut Latches, signals: ControlSignals) {
    let ControlSignals {
        mispredicted,
        meet_jalr,
        data_dependent,
    } = signals;

    cur.w.slot.bubble = cur.m.slot.bubble;
    cur.m.slot.bubble = cur.e.slot.bubble;
    cur.e.slot.bubble = cur.d.slot.bubble || mispredicted || data_dependent;
    cur.d.slot.bubble = mispredicted || meet_jalr;
    cur.d.slot.stall = data_dependent;
    cur.f.slot.stall = data_dependent || meet_jalr;
}
