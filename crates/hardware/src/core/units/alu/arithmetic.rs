//! ALU arithmetic operations.
//!
//! Add, subtract, multiply and divide. Word variants work on the low 32
//! bits of each operand and the result is sign-extended from bit 31.
//!
//! Division by zero and signed overflow never trap:
//!
//! | case            | quotient     | remainder |
//! |-----------------|--------------|-----------|
//! | `x / 0`         | all ones     | `x`       |
//! | `MIN / -1`      | `MIN`        | `0`       |

use super::{AluOp, sext32};

/// Executes an integer arithmetic operation.
///
/// Returns `0` for non-arithmetic opcodes.
pub fn execute(op: AluOp, a: u64, b: u64, is32: bool) -> u64 {
    if is32 {
        sext32(word(op, a as u32, b as u32))
    } else {
        doubleword(op, a, b)
    }
}

/// 64-bit forms; high multiplies take the upper half of the 128-bit product.
fn doubleword(op: AluOp, a: u64, b: u64) -> u64 {
    let (sa, sb) = (a as i64, b as i64);
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Mulh => ((i128::from(sa) * i128::from(sb)) >> 64) as u64,
        AluOp::Mulhsu => ((i128::from(sa) * i128::from(b)) >> 64) as u64,
        AluOp::Mulhu => ((u128::from(a) * u128::from(b)) >> 64) as u64,
        AluOp::Div if b == 0 => u64::MAX,
        AluOp::Div => sa.wrapping_div(sb) as u64,
        AluOp::Divu => a.checked_div(b).unwrap_or(u64::MAX),
        AluOp::Rem if b == 0 => a,
        AluOp::Rem => sa.wrapping_rem(sb) as u64,
        AluOp::Remu => a.checked_rem(b).unwrap_or(a),
        _ => 0,
    }
}

/// 32-bit forms; only the low word of the result is meaningful.
fn word(op: AluOp, a: u32, b: u32) -> u64 {
    let (sa, sb) = (a as i32, b as i32);
    let low = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Mulh => ((i64::from(sa) * i64::from(sb)) >> 32) as u32,
        AluOp::Mulhsu => ((i64::from(sa) * i64::from(b)) >> 32) as u32,
        AluOp::Mulhu => ((u64::from(a) * u64::from(b)) >> 32) as u32,
        AluOp::Div if b == 0 => u32::MAX,
        AluOp::Div => sa.wrapping_div(sb) as u32,
        AluOp::Divu => a.checked_div(b).unwrap_or(u32::MAX),
        AluOp::Rem if b == 0 => a,
        AluOp::Rem => sa.wrapping_rem(sb) as u32,
        AluOp::Remu => a.checked_rem(b).unwrap_or(a),
        _ => 0,
    };
    u64::from(low)
}
