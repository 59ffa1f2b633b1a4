//! ALU shift operations.
//!
//! Shift amounts are masked to 6 bits (0–63) for 64-bit shifts and 5 bits
//! (0–31) for the word variants, so oversized amounts never reach the host
//! shifter. Word results are sign-extended from bit 31.

use super::AluOp;

/// Bit mask for the 64-bit shift amount.
const SHAMT_MASK_RV64: u64 = 0x3f;

/// Bit mask for the word shift amount.
const SHAMT_MASK_RV32: u32 = 0x1f;

/// Executes a shift operation.
///
/// Returns `0` for non-shift opcodes.
pub fn execute(op: AluOp, a: u64, b: u64, is32: bool) -> u64 {
    let sh6 = (b & SHAMT_MASK_RV64) as u32;
    let sh5 = b as u32 & SHAMT_MASK_RV32;
    match op {
        AluOp::Sll => {
            if is32 {
                (a as i32).wrapping_shl(sh5) as i64 as u64
            } else {
                a.wrapping_shl(sh6)
            }
        }
        AluOp::Srl => {
            if is32 {
                ((a as u32).wrapping_shr(sh5)) as i32 as i64 as u64
            } else {
                a.wrapping_shr(sh6)
            }
        }
        AluOp::Sra => {
            if is32 {
                ((a as i32) >> sh5) as i64 as u64
            } else {
                ((a as i64) >> sh6) as u64
            }
        }
        _ => 0,
    }
}
