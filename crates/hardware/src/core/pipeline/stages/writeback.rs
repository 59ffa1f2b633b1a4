//! Writeback (WB) Stage.
//!
//! Commits the value in `W` to the register file. Writes to `x0` are
//! dropped by the register file itself.

use crate::core::Cpu;
use crate::isa::disasm::disassemble;

/// Executes the writeback stage.
///
/// # Returns
///
/// 1 cycle, or 0 for a bubble.
pub fn writeback_stage(cpu: &mut Cpu) -> u64 {
    let w = &cpu.latches.w;
    if w.slot.bubble {
        return 0;
    }

    cpu.regs.write(w.inst.rd, w.val);
    tracing::debug!(
        pc = format_args!("{:#x}", w.pc),
        inst = %disassemble(&w.inst),
        "retire"
    );
    1
}
