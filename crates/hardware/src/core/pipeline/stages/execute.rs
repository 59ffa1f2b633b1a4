//! Execute (EX) Stage.
//!
//! Runs the ALU, resolves branch conditions and computes link addresses.
//! Instructions arriving here are on the committed path, so this is also
//! where faults deferred by fetch and decode are finally reported.

use crate::common::error::StageError;
use crate::core::Cpu;
use crate::core::pipeline::latches::{Latches, MemoryReg};
use crate::core::units::alu::Alu;
use crate::isa::instruction::OpClass;
use crate::isa::rv64i::funct3;

/// Executes the execute stage, filling `next.m`.
///
/// # Errors
///
/// The deferred fetch or decode fault of the instruction in `E`, if any.
///
/// # Returns
///
/// The configured latency of the ALU operation, or 0 for a bubble.
pub fn execute_stage(cpu: &Cpu, next: &mut Latches) -> Result<u64, StageError> {
    let e = &cpu.latches.e;
    if e.slot.bubble {
        return Ok(0);
    }
    if let Some(fault) = e.fault {
        return Err(fault.raise(e.pc));
    }

    let inst = e.inst;
    let imm = inst.imm as u64;
    let link = e.pc.wrapping_add(inst.size());

    let (a, b) = match inst.class {
        OpClass::RegReg | OpClass::RegRegW => (e.val1, e.val2),
        OpClass::Branch | OpClass::Auipc | OpClass::Jal => (e.pc, imm),
        _ => (e.val1, imm),
    };
    let mut val_e = Alu::evaluate(inst.alu_op, a, b, inst.class.is_word());
    if inst.class == OpClass::Jalr {
        val_e &= !1;
    }

    next.m = MemoryReg {
        pc: e.pc,
        inst,
        cond: inst.class == OpClass::Branch && branch_taken(inst.funct3, e.val1, e.val2),
        val_e,
        val2: if inst.class.is_control_transfer() {
            link
        } else {
            e.val2
        },
        ..MemoryReg::default()
    };
    Ok(cpu.latencies.alu(inst.alu_op))
}

/// Evaluates a branch condition selected by `funct3`.
pub const fn branch_taken(f3: u32, a: u64, b: u64) -> bool {
    match f3 {
        funct3::BEQ => a == b,
        funct3::BNE => a != b,
        funct3::BLT => (a as i64) < (b as i64),
        funct3::BGE => (a as i64) >= (b as i64),
        funct3::BLTU => a < b,
        funct3::BGEU => a >= b,
        _ => false,
    }
}
