//! Simulation errors and run outcomes.
//!
//! This module defines how a run can end. It provides:
//! 1. **Fatal Errors:** `SimError`, every condition that stops the current run for good.
//! 2. **Stage Attribution:** `StageError`, a fatal error tagged with the pipeline stage and pc.
//! 3. **Normal Termination:** `RunOutcome`, which carries the guest exit status on the `Ok` path.
//!
//! A guest calling `exit` is not an error and never travels through `SimError`.

use std::fmt;
use std::io;

use thiserror::Error;

use super::data::AccessType;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, SimError>;

/// Fatal simulation errors.
///
/// None of these are retried: each one signals a guest bug, an
/// unimplemented feature or a broken configuration.
#[derive(Debug, Error)]
pub enum SimError {
    /// The instruction word does not map to any supported encoding.
    #[error("unknown instruction {bits:#010x} at pc {pc:#x} ({reason})")]
    Decode {
        /// Address the word was fetched from.
        pc: u64,
        /// Raw instruction bits (upper half is zero for compressed words).
        bits: u32,
        /// Which field failed to match.
        reason: &'static str,
    },

    /// The page table has no entry covering the address.
    #[error("invalid {access} address: {addr:#x}")]
    UnmappedAddress {
        /// Faulting virtual address.
        addr: u64,
        /// What the guest was doing when it faulted.
        access: AccessType,
    },

    /// An arithmetic case the active ALU policy leaves undefined.
    ///
    /// The built-in ALU defines every case (RISC-V M semantics) and never
    /// returns this; it is for embedders that evaluate ops under a stricter
    /// policy.
    #[error("undefined arithmetic: {op} {lhs:#x}, {rhs:#x}")]
    Arithmetic {
        /// Operation mnemonic.
        op: &'static str,
        /// First operand.
        lhs: u64,
        /// Second operand.
        rhs: u64,
    },

    /// `sbrk` would move the break past the bottom of the stack.
    #[error("heap exhausted: cannot grow break {brk:#x} by {size:#x} bytes")]
    HeapExhausted {
        /// Break before the request.
        brk: u64,
        /// Requested increment.
        size: u64,
    },

    /// `ecall` with a service number the host does not implement.
    #[error("unsupported syscall number {number}")]
    UnsupportedSyscall {
        /// Value of `a7` at the time of the call.
        number: u64,
    },

    /// Malformed cache topology or latency setup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The program image could not be placed in memory.
    #[error("loader error: {0}")]
    Loader(String),

    /// A memory trace line could not be parsed.
    #[error("trace line {line}: {reason}")]
    Trace {
        /// 1-based line number in the trace input.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Host I/O failure (trace files, guest console input).
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Pipeline stage (or the syscall slot) in which a fatal error surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Instruction fetch.
    Fetch,
    /// Decode and operand selection.
    Decode,
    /// ALU and branch resolution.
    Execute,
    /// Loads and stores.
    Memory,
    /// Register file commit.
    Writeback,
    /// Syscall service for an `ecall` sitting in write-back.
    Ecall,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "IF",
            Self::Decode => "ID",
            Self::Execute => "EX",
            Self::Memory => "MEM",
            Self::Writeback => "WB",
            Self::Ecall => "ecall",
        };
        f.write_str(name)
    }
}

/// A fatal error attributed to the stage and instruction that raised it.
#[derive(Debug, Error)]
#[error("runtime error in {stage} (pc {pc:#x}): {source}")]
pub struct StageError {
    /// Stage that was being evaluated.
    pub stage: Stage,
    /// Program counter of the instruction occupying that stage.
    pub pc: u64,
    /// Underlying cause.
    #[source]
    pub source: SimError,
}

impl StageError {
    /// Attributes `source` to `stage` at `pc`.
    pub const fn new(stage: Stage, pc: u64, source: SimError) -> Self {
        Self { stage, pc, source }
    }
}

/// Result of advancing the machine by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program is still running.
    Running,
    /// The guest invoked the exit service.
    Exited {
        /// Status passed in `a0`.
        code: u64,
    },
}

impl RunOutcome {
    /// Returns the exit status if the run has ended.
    pub const fn exit_code(self) -> Option<u64> {
        match self {
            Self::Running => None,
            Self::Exited { code } => Some(code),
        }
    }
}
