//! Instruction encoding and decoded-instruction structures.
//!
//! Provides bit extraction for 32-bit encodings and the normalized record
//! that both the 32-bit and the compressed decoder produce.

use std::fmt;

use crate::common::error::SimError;
use crate::core::units::alu::AluOp;

/// Bit mask for extracting the opcode field (bits 0-6).
pub const OPCODE_MASK: u32 = 0x7F;
/// Bit mask for extracting a register field.
pub const REG_MASK: u32 = 0x1F;
/// Bit mask for extracting the funct3 field (bits 12-14).
pub const FUNCT3_MASK: u32 = 0x7;
/// Bit mask for extracting the funct7 field (bits 25-31).
pub const FUNCT7_MASK: u32 = 0x7F;

/// Trait for extracting instruction fields from encoded instructions.
pub trait InstructionBits {
    /// Extracts the opcode field (bits 0-6).
    fn opcode(&self) -> u32;

    /// Extracts the destination register field (bits 7-11).
    fn rd(&self) -> usize;

    /// Extracts the first source register field (bits 15-19).
    fn rs1(&self) -> usize;

    /// Extracts the second source register field (bits 20-24).
    fn rs2(&self) -> usize;

    /// Extracts the funct3 field (bits 12-14).
    fn funct3(&self) -> u32;

    /// Extracts the funct7 field (bits 25-31).
    fn funct7(&self) -> u32;

    /// Extracts `count` bits starting at `start`, shifted left by `shamt`.
    fn bits(&self, start: u32, count: u32, shamt: u32) -> u32;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self & OPCODE_MASK
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 7) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        ((self >> 15) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        ((self >> 20) & REG_MASK) as usize
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        (self >> 12) & FUNCT3_MASK
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        (self >> 25) & FUNCT7_MASK
    }

    #[inline(always)]
    fn bits(&self, start: u32, count: u32, shamt: u32) -> u32 {
        ((self >> start) & ((1 << count) - 1)) << shamt
    }
}

/// Sign extends the low `bits` bits of `val` to a 64-bit signed integer.
///
/// # Examples
///
/// ```
/// use rvpipe_core::isa::instruction::sign_extend;
///
/// assert_eq!(sign_extend(0b10_0000, 6), -32);
/// assert_eq!(sign_extend(0b01_1111, 6), 31);
/// assert_eq!(sign_extend(0x8000_0000, 32), -0x8000_0000);
/// ```
#[inline]
pub const fn sign_extend(val: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((val << shift) as i64) >> shift
}

/// Instruction class, one per major opcode the pipeline distinguishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OpClass {
    /// No architectural effect (pipeline bubbles, `c.ebreak`).
    #[default]
    Nop,
    /// Integer register-register (`OP`).
    RegReg,
    /// 32-bit register-register (`OP-32`).
    RegRegW,
    /// Integer register-immediate (`OP-IMM`).
    RegImm,
    /// 32-bit register-immediate (`OP-IMM-32`).
    RegImmW,
    /// Loads.
    Load,
    /// Stores.
    Store,
    /// Conditional branches.
    Branch,
    /// Jump and link.
    Jal,
    /// Jump and link register.
    Jalr,
    /// Load upper immediate.
    Lui,
    /// Add upper immediate to pc.
    Auipc,
    /// Environment call.
    Ecall,
}

impl OpClass {
    /// Writes a link address (`pc + size`) instead of an ALU result.
    pub const fn is_control_transfer(self) -> bool {
        matches!(self, Self::Branch | Self::Jal | Self::Jalr)
    }

    /// W-suffix classes truncate the ALU result to 32 bits.
    pub const fn is_word(self) -> bool {
        matches!(self, Self::RegRegW | Self::RegImmW)
    }
}

/// Normalized decoded instruction.
///
/// Produced once per instruction by the decoder and carried unchanged from
/// decode to execute. Register *values* are not part of the record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Raw encoding (upper half zero for compressed words).
    pub raw: u32,
    /// Instruction class.
    pub class: OpClass,
    /// Minor opcode: access width for loads/stores, condition for branches.
    pub funct3: u32,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// Destination register index (0 discards the result).
    pub rd: usize,
    /// Sign- or zero-extended immediate.
    pub imm: i64,
    /// Operation the ALU performs in execute.
    pub alu_op: AluOp,
    /// Fetched as a 16-bit word.
    pub compressed: bool,
}

impl DecodedInstruction {
    /// Encoded size in bytes.
    #[inline]
    pub const fn size(&self) -> u64 {
        if self.compressed { 2 } else { 4 }
    }
}

/// Reason a word failed to decode, before the pc is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeFault {
    /// Offending bits.
    pub bits: u32,
    /// Which field failed to match.
    pub reason: &'static str,
}

impl DecodeFault {
    /// Creates a fault for `bits`.
    pub const fn new(bits: u32, reason: &'static str) -> Self {
        Self { bits, reason }
    }

    /// Attaches the fetch address, producing the fatal error.
    pub fn at(self, pc: u64) -> SimError {
        SimError::Decode {
            pc,
            bits: self.bits,
            reason: self.reason,
        }
    }
}

impl fmt::Display for DecodeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown instruction {:#010x} ({})", self.bits, self.reason)
    }
}
