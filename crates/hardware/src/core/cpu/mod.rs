//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, which serves as the container for the
//! entire processor state. It coordinates the following:
//! 1. **State Management:** Maintains the integer register file.
//! 2. **Pipeline Control:** Holds the five pipeline registers and the misprediction flag.
//! 3. **Memory Hierarchy:** Owns the page table and the cache chain.
//! 4. **Host Services:** Routes `ecall` console traffic through a [`Console`].

/// Guest system call service.
pub mod syscall;

use std::fmt::Write as _;

use crate::common::error::{Result, RunOutcome, StageError};
use crate::common::reg::RegisterFile;
use crate::config::{BranchPredictorKind, Config, LatencyTable};
use crate::core::pipeline::engine;
use crate::core::pipeline::latches::Latches;
use crate::core::units::bru::{BranchPredictor as _, BranchPredictorWrapper};
use crate::isa::abi;
use crate::isa::decode::decode;
use crate::isa::disasm::disassemble;
use crate::memory::MemorySystem;
use crate::stats::SimStats;

pub use self::syscall::Console;

/// Main CPU structure containing all processor state and components.
///
/// The CPU runs instructions through the five-stage pipeline one tick at a
/// time, times memory through the cache hierarchy, and tracks performance
/// statistics.
#[derive(Debug)]
pub struct Cpu {
    /// Integer registers.
    pub regs: RegisterFile,
    /// Current pipeline registers.
    pub latches: Latches,
    /// The branch leaving execute last tick was mispredicted; fetch redirects.
    pub mispredicted: bool,
    /// Operand forwarding enabled.
    pub forwarding: bool,
    /// ALU and syscall latencies.
    pub latencies: LatencyTable,
    /// Branch direction predictor.
    pub branch_predictor: BranchPredictorWrapper,
    /// Guest memory and caches.
    pub mem: MemorySystem,
    /// Performance counters.
    pub stats: SimStats,
    /// Guest console.
    pub console: Console,
    /// Ticks since the last reset.
    pub tick_count: u64,
    predictor_kind: BranchPredictorKind,
}

impl Cpu {
    /// Creates a CPU on stdin and stdout.
    ///
    /// # Errors
    ///
    /// [`crate::SimError::Configuration`] if `config` does not validate.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_console(config, Console::stdio())
    }

    /// Creates a CPU whose guest console is `console`.
    ///
    /// # Errors
    ///
    /// [`crate::SimError::Configuration`] if `config` does not validate.
    pub fn with_console(config: &Config, console: Console) -> Result<Self> {
        config.validate()?;
        let branch_predictor = BranchPredictorWrapper::new(config.branch_predictor);
        let stats = SimStats::new(branch_predictor.name());
        Ok(Self {
            regs: RegisterFile::new(),
            latches: Latches::reset(0),
            mispredicted: false,
            forwarding: config.data_forwarding,
            latencies: config.latencies(),
            branch_predictor,
            mem: MemorySystem::new(config)?,
            stats,
            console,
            tick_count: 0,
            predictor_kind: config.branch_predictor,
        })
    }

    /// Returns the machine to its power-on state, keeping configuration and
    /// console. Memory is unmapped and caches are invalidated.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.reset();
        self.latches = Latches::reset(0);
        self.mispredicted = false;
        self.branch_predictor = BranchPredictorWrapper::new(self.predictor_kind);
        self.stats = SimStats::new(self.branch_predictor.name());
        self.tick_count = 0;
    }

    /// Points fetch at `pc` with an empty pipeline.
    pub fn set_entry(&mut self, pc: u64) {
        self.latches = Latches::reset(pc);
        self.mispredicted = false;
    }

    /// Advances the pipeline by one tick.
    ///
    /// # Errors
    ///
    /// The first fatal [`StageError`]; see [`engine::tick`].
    pub fn tick(&mut self) -> std::result::Result<RunOutcome, StageError> {
        let outcome = engine::tick(self)?;
        if outcome == RunOutcome::Running {
            self.tick_count += 1;
        }
        Ok(outcome)
    }

    /// Pipeline contents, one line per stage.
    pub fn dump_pipeline(&self) -> String {
        let l = &self.latches;
        let mut out = format!("tick = {}\n", self.tick_count);

        let fetch = if l.f.slot.bubble {
            "bubble".to_owned()
        } else {
            format!("pc={:#x}", l.f.pred_pc)
        };
        let _ = writeln!(out, "IF: {fetch}");

        let decode_line = if l.d.slot.bubble {
            "bubble".to_owned()
        } else {
            match decode(l.d.inst) {
                Ok(d) => format!("{:#x}: {}", l.d.pc, disassemble(&d)),
                Err(_) => format!("{:#x}: <{:#010x}>", l.d.pc, l.d.inst),
            }
        };
        let _ = writeln!(out, "ID: {decode_line}");

        let rows = [
            ("EX", l.e.slot.bubble, l.e.pc, &l.e.inst),
            ("MM", l.m.slot.bubble, l.m.pc, &l.m.inst),
            ("WB", l.w.slot.bubble, l.w.pc, &l.w.inst),
        ];
        for (name, bubble, pc, inst) in rows {
            if bubble {
                let _ = writeln!(out, "{name}: bubble");
            } else {
                let _ = writeln!(out, "{name}: {pc:#x}: {}", disassemble(inst));
            }
        }
        out
    }

    /// Register file, eight registers per row.
    pub fn dump_registers(&self) -> String {
        let mut out = String::new();
        for i in 0..abi::REG_NAMES.len() {
            let _ = write!(out, "{:>4}={:<6x}", abi::reg_name(i), self.regs.read(i));
            out.push(if i % 8 == 7 { '\n' } else { ' ' });
        }
        out
    }
}
