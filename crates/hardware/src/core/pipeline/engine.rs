//! Tick Engine.
//!
//! One call to [`tick`] is one pipeline transition:
//! 1. **Stages:** WB, MEM, EX, ID and IF run in that order against the current registers.
//! 2. **Syscall:** an `ecall` sitting in WB is serviced.
//! 3. **Control:** branch resolution and hazard detection set the stall and bubble bits.
//! 4. **Commit:** every register holds, bubbles or advances.
//!
//! The tick costs as many cycles as its slowest stage.

use crate::common::error::{RunOutcome, Stage, StageError};
use crate::core::Cpu;
use crate::core::cpu::syscall::{self, SyscallOutcome};
use crate::core::pipeline::hazards;
use crate::core::pipeline::latches::Latches;
use crate::core::pipeline::stages::{
    decode_stage, execute_stage, fetch_stage, memory_stage, writeback_stage,
};
use crate::isa::instruction::OpClass;

/// Advances `cpu` by one tick.
///
/// # Errors
///
/// A [`StageError`] naming the stage and pc of the first fatal error. The
/// registers are left as they were at the start of the failing tick so
/// they can be dumped.
pub fn tick(cpu: &mut Cpu) -> Result<RunOutcome, StageError> {
    let mut next = Latches::default();
    let mut cycles = 0;

    cycles = cycles.max(writeback_stage(cpu));

    let mem_pc = cpu.latches.m.pc;
    cycles = cycles.max(
        memory_stage(cpu, &mut next).map_err(|e| StageError::new(Stage::Memory, mem_pc, e))?,
    );
    cycles = cycles.max(execute_stage(cpu, &mut next)?);
    cycles = cycles.max(decode_stage(cpu, &mut next));
    cycles = cycles.max(fetch_stage(cpu, &mut next));

    let w = cpu.latches.w;
    if !w.slot.bubble && w.inst.class == OpClass::Ecall {
        match syscall::service(cpu).map_err(|e| StageError::new(Stage::Ecall, w.pc, e))? {
            SyscallOutcome::Exit { code } => {
                tracing::info!(code, "guest exited");
                return Ok(RunOutcome::Exited { code });
            }
            SyscallOutcome::Continue { cycles: c } => cycles = cycles.max(c),
        }
    }

    let branch = hazards::resolve_branch(&cpu.latches.e, &next.m, &mut cpu.branch_predictor);
    let signals = hazards::detect(&cpu.latches, &next, cpu.forwarding, branch.unwrap_or(false));
    hazards::apply(&mut cpu.latches, signals);
    cpu.mispredicted = signals.mispredicted;

    if signals.mispredicted {
        tracing::debug!(pc = format_args!("{:#x}", cpu.latches.e.pc), "branch mispredicted");
    }
    cpu.stats.record_signals(signals);
    if let Some(mispredicted) = branch {
        cpu.stats.record_branch(!mispredicted);
    }
    if !cpu.latches.w.slot.stall && !cpu.latches.w.slot.bubble {
        cpu.stats.instructions += 1;
    }
    cpu.stats.cycles += cycles;

    cpu.latches.update(next);
    Ok(RunOutcome::Running)
}
