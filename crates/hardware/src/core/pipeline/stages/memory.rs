//! Memory Access (MEM) Stage.
//!
//! Performs loads and stores through the data-side chain and selects the
//! value write-back will commit.

use crate::common::error::Result;
use crate::core::Cpu;
use crate::core::pipeline::latches::{Latches, WritebackReg};
use crate::isa::instruction::{OpClass, sign_extend};

/// `funct3` values at or above this load zero-extended.
const UNSIGNED_LOAD_BASE: u32 = 4;

/// Executes the memory stage, filling `next.w`.
///
/// # Errors
///
/// [`crate::common::SimError::UnmappedAddress`] for a load or store
/// outside every mapped page.
///
/// # Returns
///
/// Data-side latency for loads and stores, 1 for other instructions and
/// 0 for a bubble.
pub fn memory_stage(cpu: &mut Cpu, next: &mut Latches) -> Result<u64> {
    let m = cpu.latches.m;
    if m.slot.bubble {
        return Ok(0);
    }

    let mut cycles = 1;
    let val = match m.inst.class {
        OpClass::Load => {
            let f3 = m.inst.funct3;
            let (bytes, signed) = if f3 < UNSIGNED_LOAD_BASE {
                (1u64 << f3, true)
            } else {
                (1u64 << (f3 - UNSIGNED_LOAD_BASE), false)
            };
            let (raw, c) = cpu.mem.read_data(m.val_e, bytes)?;
            cycles = c;
            if signed {
                sign_extend(raw, (bytes * 8) as u32) as u64
            } else {
                raw
            }
        }
        OpClass::Store => {
            cycles = cpu.mem.write_data(m.val_e, m.val2, 1u64 << m.inst.funct3)?;
            0
        }
        class if class.is_control_transfer() => m.val2,
        _ => m.val_e,
    };

    next.w = WritebackReg {
        pc: m.pc,
        inst: m.inst,
        val,
        ..WritebackReg::default()
    };
    Ok(cycles)
}
