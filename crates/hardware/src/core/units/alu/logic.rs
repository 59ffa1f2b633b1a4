//! ALU logical and comparison operations.
//!
//! Bitwise OR, AND, XOR and set-less-than. The comparison result is always
//! 0 or 1. Word variants compare the low 32 bits and sign-extend bitwise
//! results from bit 31.

use super::{AluOp, sext32};

/// Executes a logical or comparison operation.
///
/// Returns `0` for non-logic opcodes.
pub fn execute(op: AluOp, a: u64, b: u64, is32: bool) -> u64 {
    let full = match op {
        AluOp::Or => a | b,
        AluOp::And => a & b,
        AluOp::Xor => a ^ b,
        AluOp::Slt => {
            if is32 {
                return ((a as i32) < (b as i32)) as u64;
            }
            ((a as i64) < (b as i64)) as u64
        }
        AluOp::Sltu => {
            if is32 {
                return ((a as u32) < (b as u32)) as u64;
            }
            (a < b) as u64
        }
        _ => 0,
    };
    if is32 { sext32(full) } else { full }
}
