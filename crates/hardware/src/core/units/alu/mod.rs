//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used in the Execute stage.
//! It handles standard arithmetic, logical operations, and shifts
//! for both 64-bit and 32-bit (W-suffix) operands, including the
//! Multiply/Divide (M) extension.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub, Mul, Mulh, Mulhsu, Mulhu, Div, Divu, Rem, Remu
//! - [`logic`]:      Or, And, Xor, Slt, Sltu
//! - [`shifts`]:     Sll, Srl, Sra
//!
//! Division never traps. Dividing by zero yields all ones for the quotient
//! and the dividend for the remainder; `MIN / -1` yields `MIN` with a zero
//! remainder.

/// Integer arithmetic operations (add, subtract, multiply, divide).
pub mod arithmetic;

/// Bitwise logical and comparison operations (or, and, xor, slt).
pub mod logic;

/// Shift operations (sll, srl, sra).
pub mod shifts;

use std::fmt;

/// ALU operation resolved by the decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Addition; also used for address and target computation.
    #[default]
    Add,
    /// Subtraction.
    Sub,
    /// Multiply, low 64 bits.
    Mul,
    /// Multiply high, signed × signed.
    Mulh,
    /// Multiply high, signed × unsigned.
    Mulhsu,
    /// Multiply high, unsigned × unsigned.
    Mulhu,
    /// Signed division.
    Div,
    /// Unsigned division.
    Divu,
    /// Signed remainder.
    Rem,
    /// Unsigned remainder.
    Remu,
    /// Shift left logical.
    Sll,
    /// Shift right arithmetic.
    Sra,
    /// Shift right logical.
    Srl,
    /// Bitwise XOR.
    Xor,
    /// Bitwise OR.
    Or,
    /// Bitwise AND.
    And,
    /// Set less than, signed.
    Slt,
    /// Set less than, unsigned.
    Sltu,
}

impl AluOp {
    /// Number of distinct operations.
    pub const COUNT: usize = 18;

    /// Every operation, in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Mulh,
        Self::Mulhsu,
        Self::Mulhu,
        Self::Div,
        Self::Divu,
        Self::Rem,
        Self::Remu,
        Self::Sll,
        Self::Sra,
        Self::Srl,
        Self::Xor,
        Self::Or,
        Self::And,
        Self::Slt,
        Self::Sltu,
    ];

    /// Lower-case mnemonic of the register-register form.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Mulh => "mulh",
            Self::Mulhsu => "mulhsu",
            Self::Mulhu => "mulhu",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Rem => "rem",
            Self::Remu => "remu",
            Self::Sll => "sll",
            Self::Sra => "sra",
            Self::Srl => "srl",
            Self::Xor => "xor",
            Self::Or => "or",
            Self::And => "and",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
        }
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Arithmetic Logic Unit (ALU) for integer operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Evaluates an integer ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op`   - The ALU operation to perform
    /// * `a`    - First operand
    /// * `b`    - Second operand (also the shift amount)
    /// * `is32` - Perform the W-suffix variant: operate on the low 32 bits
    ///   and sign-extend the 32-bit result
    ///
    /// # Examples
    ///
    /// ```
    /// use rvpipe_core::core::units::alu::{Alu, AluOp};
    ///
    /// assert_eq!(Alu::evaluate(AluOp::Add, 42, 8, false), 50);
    /// // addw wraps at 32 bits and sign-extends
    /// assert_eq!(Alu::evaluate(AluOp::Add, 0x7FFF_FFFF, 1, true), 0xFFFF_FFFF_8000_0000);
    /// assert_eq!(Alu::evaluate(AluOp::Slt, -5_i64 as u64, 10, false), 1);
    /// // division by zero follows the M extension
    /// assert_eq!(Alu::evaluate(AluOp::Divu, 100, 0, false), u64::MAX);
    /// assert_eq!(Alu::evaluate(AluOp::Rem, 100, 0, false), 100);
    /// ```
    pub fn evaluate(op: AluOp, a: u64, b: u64, is32: bool) -> u64 {
        match op {
            AluOp::Add
            | AluOp::Sub
            | AluOp::Mul
            | AluOp::Mulh
            | AluOp::Mulhsu
            | AluOp::Mulhu
            | AluOp::Div
            | AluOp::Divu
            | AluOp::Rem
            | AluOp::Remu => arithmetic::execute(op, a, b, is32),

            AluOp::Or | AluOp::And | AluOp::Xor | AluOp::Slt | AluOp::Sltu => {
                logic::execute(op, a, b, is32)
            }

            AluOp::Sll | AluOp::Srl | AluOp::Sra => shifts::execute(op, a, b, is32),
        }
    }
}

/// Truncates to 32 bits and sign-extends back to 64.
#[inline(always)]
pub const fn sext32(v: u64) -> u64 {
    v as i32 as i64 as u64
}
