//! Instruction Decode (ID) Stage.
//!
//! Decodes the word in `D` and reads both source operands, forwarding
//! from later stages when enabled. A word that fails to decode becomes a
//! pending fault instead of stopping the run, since decode may be working
//! on a wrong-path fetch.

use crate::core::Cpu;
use crate::core::pipeline::hazards::select_value;
use crate::core::pipeline::latches::{ExecuteReg, Latches, PendingFault};
use crate::isa::decode::decode;

/// Executes the decode stage, filling `next.e`.
///
/// Must run after execute and memory so that `next.m` and `next.w` hold
/// this tick's forwarding sources.
///
/// # Returns
///
/// 1 cycle, or 0 for a bubble.
pub fn decode_stage(cpu: &Cpu, next: &mut Latches) -> u64 {
    let d = &cpu.latches.d;
    if d.slot.bubble {
        return 0;
    }

    let decoded = match d.fault {
        Some(fault) => Err(fault),
        None => decode(d.inst).map_err(PendingFault::Decode),
    };
    let inst = match decoded {
        Ok(inst) => inst,
        Err(fault) => {
            next.e = ExecuteReg {
                pc: d.pc,
                fault: Some(fault),
                ..ExecuteReg::default()
            };
            return 1;
        }
    };

    let val1 = select_value(&cpu.latches, next, &cpu.regs, cpu.forwarding, inst.rs1);
    let val2 = select_value(&cpu.latches, next, &cpu.regs, cpu.forwarding, inst.rs2);

    next.e = ExecuteReg {
        pc: d.pc,
        inst,
        val1,
        val2,
        ..ExecuteReg::default()
    };
    1
}
