//! Pipeline register structures for inter-stage communication.
//!
//! Five registers sit in front of the five stages:
//! `F` (before fetch) → `D` (IF/ID) → `E` (ID/EX) → `M` (EX/MEM) → `W` (MEM/WB).
//!
//! 1. **Shared Control:** every register embeds a [`StageSlot`] with its `stall` and `bubble` bits.
//! 2. **Instruction Flow:** the decoded record moves by value from `E` to `W`.
//! 3. **Deferred Faults:** fetch and decode failures ride along as [`PendingFault`] until execute.

use crate::common::data::AccessType;
use crate::common::error::{SimError, Stage, StageError};
use crate::isa::instruction::{DecodeFault, DecodedInstruction};

/// Control bits shared by every pipeline register.
///
/// `stall` holds the register for one tick and wins over `bubble`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageSlot {
    /// Keep the current contents instead of adopting the next value.
    pub stall: bool,
    /// Discard the next value and hold no instruction.
    pub bubble: bool,
}

/// Access to the embedded [`StageSlot`].
pub trait PipelineRegister: Default {
    /// Shared control bits.
    fn slot(&self) -> &StageSlot;

    /// Mutable shared control bits.
    fn slot_mut(&mut self) -> &mut StageSlot;

    /// Commits `next` according to the control bits.
    ///
    /// Exactly one of hold, bubble or advance applies.
    fn update(&mut self, next: Self) {
        let slot = *self.slot();
        if slot.stall {
            return;
        }
        if slot.bubble {
            *self = Self::default();
            self.slot_mut().bubble = true;
        } else {
            *self = next;
        }
    }

    /// A register holding no instruction.
    fn bubble() -> Self {
        let mut reg = Self::default();
        reg.slot_mut().bubble = true;
        reg
    }
}

macro_rules! impl_pipeline_register {
    ($($ty:ty),* $(,)?) => {
        $(impl PipelineRegister for $ty {
            #[inline(always)]
            fn slot(&self) -> &StageSlot {
                &self.slot
            }

            #[inline(always)]
            fn slot_mut(&mut self) -> &mut StageSlot {
                &mut self.slot
            }
        })*
    };
}

/// Fault detected on a possibly speculative path, raised only once the
/// instruction reaches execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingFault {
    /// The instruction bytes could not be read.
    Fetch {
        /// Unmapped address.
        addr: u64,
    },
    /// The word does not decode.
    Decode(DecodeFault),
}

impl PendingFault {
    /// Turns the fault into the fatal error of the instruction at `pc`.
    pub fn raise(self, pc: u64) -> StageError {
        match self {
            Self::Fetch { addr } => StageError::new(
                Stage::Fetch,
                pc,
                SimError::UnmappedAddress {
                    addr,
                    access: AccessType::Fetch,
                },
            ),
            Self::Decode(fault) => StageError::new(Stage::Decode, pc, fault.at(pc)),
        }
    }
}

/// `F`: the pc fetch will use next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchReg {
    /// Shared control bits.
    pub slot: StageSlot,
    /// Predicted next pc.
    pub pred_pc: u64,
}

/// `D` (IF/ID): a fetched but undecoded word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeReg {
    /// Shared control bits.
    pub slot: StageSlot,
    /// Fetch address.
    pub pc: u64,
    /// Raw instruction word (upper half zero if compressed).
    pub inst: u32,
    /// Fetch failure to report if this reaches execute.
    pub fault: Option<PendingFault>,
}

/// `E` (ID/EX): decoded instruction with operand values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecuteReg {
    /// Shared control bits.
    pub slot: StageSlot,
    /// Instruction address.
    pub pc: u64,
    /// Decoded record.
    pub inst: DecodedInstruction,
    /// Value of `rs1` (register file or forwarded).
    pub val1: u64,
    /// Value of `rs2` (register file or forwarded).
    pub val2: u64,
    /// Fetch or decode failure to report on entering execute.
    pub fault: Option<PendingFault>,
}

/// `M` (EX/MEM): ALU result and store data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryReg {
    /// Shared control bits.
    pub slot: StageSlot,
    /// Instruction address.
    pub pc: u64,
    /// Decoded record.
    pub inst: DecodedInstruction,
    /// Branch condition outcome.
    pub cond: bool,
    /// ALU result: effective address, branch target or arithmetic value.
    pub val_e: u64,
    /// Store data, or the link address `pc + size` for control transfers.
    pub val2: u64,
}

/// `W` (MEM/WB): value to commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WritebackReg {
    /// Shared control bits.
    pub slot: StageSlot,
    /// Instruction address.
    pub pc: u64,
    /// Decoded record.
    pub inst: DecodedInstruction,
    /// Value written to `rd`.
    pub val: u64,
}

impl_pipeline_register!(FetchReg, DecodeReg, ExecuteReg, MemoryReg, WritebackReg);

/// One full set of pipeline registers.
///
/// The CPU keeps the current set; each tick builds a second set as the
/// stage outputs and commits it with [`Latches::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Latches {
    /// Before fetch.
    pub f: FetchReg,
    /// IF/ID.
    pub d: DecodeReg,
    /// ID/EX.
    pub e: ExecuteReg,
    /// EX/MEM.
    pub m: MemoryReg,
    /// MEM/WB.
    pub w: WritebackReg,
}

impl Latches {
    /// Run-start state: fetch at `entry`, every later register a bubble.
    pub fn reset(entry: u64) -> Self {
        Self {
            f: FetchReg {
                pred_pc: entry,
                ..FetchReg::default()
            },
            d: DecodeReg::bubble(),
            e: ExecuteReg::bubble(),
            m: MemoryReg::bubble(),
            w: WritebackReg::bubble(),
        }
    }

    /// Commits `next` register by register.
    pub fn update(&mut self, next: Self) {
        self.f.update(next.f);
        self.d.update(next.d);
        self.e.update(next.e);
        self.m.update(next.m);
        self.w.update(next.w);
    }
}
