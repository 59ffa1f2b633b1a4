//! Instruction Fetch (IF) Stage.
//!
//! Selects the fetch pc, reads one instruction word through the
//! instruction-side chain and predicts the pc of the following fetch.
//!
//! The pc normally comes from `F`. Two events in the memory stage override
//! it: a branch that was mispredicted last tick (redirect to its real
//! outcome) and a `jalr` (its target is known once it leaves execute).

use crate::common::constants::{INSTRUCTION_SIZE_16, INSTRUCTION_SIZE_32};
use crate::common::error::SimError;
use crate::core::Cpu;
use crate::core::pipeline::latches::{DecodeReg, Latches, PendingFault};
use crate::core::units::bru::BranchPredictor;
use crate::isa::decode::{decode, is_compressed};
use crate::isa::instruction::OpClass;

/// Executes the fetch stage, filling `next.d` and `next.f`.
///
/// Never fails: an unmapped fetch address is recorded in `next.d` and only
/// reported if that instruction turns out to be on the committed path.
///
/// # Returns
///
/// Cycles charged by the instruction-side memory chain.
pub fn fetch_stage(cpu: &mut Cpu, next: &mut Latches) -> u64 {
    let pc = select_pc(cpu);

    match cpu.mem.read_inst(pc) {
        Ok((word, cycles)) => {
            next.d = DecodeReg {
                pc,
                inst: word,
                ..DecodeReg::default()
            };
            next.f.pred_pc = predict_next(cpu, pc, word);
            cycles
        }
        Err(err) => {
            let addr = match err {
                SimError::UnmappedAddress { addr, .. } => addr,
                _ => pc,
            };
            tracing::debug!(pc = format_args!("{pc:#x}"), "fetch from unmapped address");
            next.d = DecodeReg {
                pc,
                fault: Some(PendingFault::Fetch { addr }),
                ..DecodeReg::default()
            };
            next.f.pred_pc = pc.wrapping_add(INSTRUCTION_SIZE_32);
            0
        }
    }
}

fn select_pc(cpu: &Cpu) -> u64 {
    let cur = &cpu.latches;
    match cur.m.inst.class {
        OpClass::Branch if cpu.mispredicted => {
            if cur.m.cond {
                cur.m.val_e
            } else {
                cur.m.val2
            }
        }
        OpClass::Jalr if !cur.m.slot.bubble => cur.m.val_e,
        _ => cur.f.pred_pc,
    }
}

/// Next fetch address for the word just read from `pc`.
///
/// Only conditional branches consult the predictor; `jal` targets are
/// known from the word itself. Words that fail to decode predict
/// fall-through.
fn predict_next(cpu: &Cpu, pc: u64, word: u32) -> u64 {
    let Ok(inst) = decode(word) else {
        let size = if is_compressed(word) {
            INSTRUCTION_SIZE_16
        } else {
            INSTRUCTION_SIZE_32
        };
        return pc.wrapping_add(size);
    };

    let sequential = pc.wrapping_add(inst.size());
    let target = pc.wrapping_add_signed(inst.imm);
    match inst.class {
        OpClass::Branch => cpu.branch_predictor.predict(sequential, target),
        OpClass::Jal => target,
        _ => sequential,
    }
}
