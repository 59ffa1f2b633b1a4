//! Compressed Instruction Decoder.
//!
//! Decodes a 16-bit RVC word directly into the same `DecodedInstruction` the
//! 32-bit decoder produces, with `compressed` set so the pipeline advances
//! the pc by 2. The register fields `rd'`/`rs1'`/`rs2'` address `x8`-`x15`.

use crate::core::units::alu::AluOp;
use crate::isa::abi;
use crate::isa::instruction::{DecodeFault, DecodedInstruction, InstructionBits, OpClass, sign_extend};
use crate::isa::rv64i::funct3;

use super::constants::{CREG_BASE, QUADRANT_0, QUADRANT_1, QUADRANT_2, q0, q1, q2};

/// Width of the `nzimm`/`imm` field of C.ADDI, C.ADDIW, C.LI and C.ANDI.
const CI_IMM_BITS: u32 = 6;

/// Width of the C.ADDI16SP immediate.
const ADDI16SP_IMM_BITS: u32 = 10;

/// Width of the C.LUI immediate (already shifted by 12).
const LUI_IMM_BITS: u32 = 18;

/// Width of the C.J offset.
const CJ_IMM_BITS: u32 = 12;

/// Width of the C.BEQZ/C.BNEZ offset.
const CB_IMM_BITS: u32 = 9;

/// Decodes the low 16 bits of `inst`.
///
/// # Errors
///
/// Returns a [`DecodeFault`] for reserved encodings, floating-point forms and
/// the all-zero word.
pub fn decode_compressed(inst: u32) -> Result<DecodedInstruction, DecodeFault> {
    let base = DecodedInstruction {
        raw: inst,
        compressed: true,
        ..DecodedInstruction::default()
    };
    let cf3 = inst.bits(13, 3, 0);

    match inst & 0x3 {
        QUADRANT_0 => decode_q0(inst, cf3, base),
        QUADRANT_1 => decode_q1(inst, cf3, base),
        QUADRANT_2 => decode_q2(inst, cf3, base),
        _ => Err(DecodeFault::new(inst, "not a compressed word")),
    }
}

#[inline]
fn creg(inst: u32, start: u32) -> usize {
    inst.bits(start, 3, 0) as usize + CREG_BASE
}

#[inline]
fn full_reg(inst: u32, start: u32) -> usize {
    inst.bits(start, 5, 0) as usize
}

/// 6-bit immediate split as `imm[5]` at bit 12 and `imm[4:0]` at bits 6-2.
#[inline]
fn ci_imm(inst: u32) -> u32 {
    inst.bits(2, 5, 0) | inst.bits(12, 1, 5)
}

fn decode_q0(
    inst: u32,
    cf3: u32,
    base: DecodedInstruction,
) -> Result<DecodedInstruction, DecodeFault> {
    let word_off = inst.bits(5, 1, 6) | inst.bits(6, 1, 2) | inst.bits(10, 3, 3);
    let dword_off = inst.bits(5, 2, 6) | inst.bits(10, 3, 3);

    let decoded = match cf3 {
        q0::C_ADDI4SPN => {
            let nzuimm =
                inst.bits(5, 1, 3) | inst.bits(6, 1, 2) | inst.bits(7, 4, 6) | inst.bits(11, 2, 4);
            if nzuimm == 0 {
                return Err(DecodeFault::new(inst, "C.ADDI4SPN with zero immediate"));
            }
            DecodedInstruction {
                class: OpClass::RegImm,
                rd: creg(inst, 2),
                rs1: abi::REG_SP,
                imm: i64::from(nzuimm),
                ..base
            }
        }
        q0::C_LW | q0::C_LD => DecodedInstruction {
            class: OpClass::Load,
            funct3: if cf3 == q0::C_LW { funct3::LW } else { funct3::LD },
            rd: creg(inst, 2),
            rs1: creg(inst, 7),
            imm: i64::from(if cf3 == q0::C_LW { word_off } else { dword_off }),
            ..base
        },
        q0::C_SW | q0::C_SD => DecodedInstruction {
            class: OpClass::Store,
            funct3: if cf3 == q0::C_SW { funct3::SW } else { funct3::SD },
            rs1: creg(inst, 7),
            rs2: creg(inst, 2),
            imm: i64::from(if cf3 == q0::C_SW { word_off } else { dword_off }),
            ..base
        },
        _ => return Err(DecodeFault::new(inst, "compressed quadrant 0 funct3")),
    };
    Ok(decoded)
}

fn decode_q1(
    inst: u32,
    cf3: u32,
    base: DecodedInstruction,
) -> Result<DecodedInstruction, DecodeFault> {
    let rd = full_reg(inst, 7);
    let imm6 = sign_extend(u64::from(ci_imm(inst)), CI_IMM_BITS);

    let decoded = match cf3 {
        q1::C_ADDI => DecodedInstruction {
            class: OpClass::RegImm,
            rd,
            rs1: rd,
            imm: imm6,
            ..base
        },
        q1::C_ADDIW => {
            if rd == abi::REG_ZERO {
                return Err(DecodeFault::new(inst, "C.ADDIW with rd = x0"));
            }
            DecodedInstruction {
                class: OpClass::RegImmW,
                rd,
                rs1: rd,
                imm: imm6,
                ..base
            }
        }
        q1::C_LI => DecodedInstruction {
            class: OpClass::RegImm,
            rd,
            rs1: abi::REG_ZERO,
            imm: imm6,
            ..base
        },
        q1::C_LUI_ADDI16SP if rd == abi::REG_SP => {
            let raw = inst.bits(2, 1, 5)
                | inst.bits(3, 2, 7)
                | inst.bits(5, 1, 6)
                | inst.bits(6, 1, 4)
                | inst.bits(12, 1, 9);
            if raw == 0 {
                return Err(DecodeFault::new(inst, "C.ADDI16SP with zero immediate"));
            }
            DecodedInstruction {
                class: OpClass::RegImm,
                rd,
                rs1: rd,
                imm: sign_extend(u64::from(raw), ADDI16SP_IMM_BITS),
                ..base
            }
        }
        q1::C_LUI_ADDI16SP => {
            let raw = inst.bits(2, 5, 12) | inst.bits(12, 1, 17);
            if raw == 0 {
                return Err(DecodeFault::new(inst, "C.LUI with zero immediate"));
            }
            DecodedInstruction {
                class: OpClass::Lui,
                rd,
                imm: sign_extend(u64::from(raw), LUI_IMM_BITS),
                ..base
            }
        }
        q1::C_MISC_ALU => decode_q1_misc(inst, base)?,
        q1::C_J => {
            let raw = inst.bits(2, 1, 5)
                | inst.bits(3, 3, 1)
                | inst.bits(6, 1, 7)
                | inst.bits(7, 1, 6)
                | inst.bits(8, 1, 10)
                | inst.bits(9, 2, 8)
                | inst.bits(11, 1, 4)
                | inst.bits(12, 1, 11);
            DecodedInstruction {
                class: OpClass::Jal,
                rd: abi::REG_ZERO,
                imm: sign_extend(u64::from(raw), CJ_IMM_BITS),
                ..base
            }
        }
        // C_BEQZ | C_BNEZ
        _ => {
            let raw = inst.bits(2, 1, 5)
                | inst.bits(3, 2, 1)
                | inst.bits(5, 2, 6)
                | inst.bits(10, 2, 3)
                | inst.bits(12, 1, 8);
            DecodedInstruction {
                class: OpClass::Branch,
                funct3: if cf3 == q1::C_BEQZ { funct3::BEQ } else { funct3::BNE },
                rs1: creg(inst, 7),
                rs2: abi::REG_ZERO,
                imm: sign_extend(u64::from(raw), CB_IMM_BITS),
                ..base
            }
        }
    };
    Ok(decoded)
}

/// C.SRLI, C.SRAI, C.ANDI and the C.SUB..C.ADDW register group.
fn decode_q1_misc(
    inst: u32,
    base: DecodedInstruction,
) -> Result<DecodedInstruction, DecodeFault> {
    let rd = creg(inst, 7);
    let base = DecodedInstruction {
        rd,
        rs1: rd,
        ..base
    };

    let decoded = match inst.bits(10, 2, 0) {
        q1::misc::C_SRLI => DecodedInstruction {
            class: OpClass::RegImm,
            alu_op: AluOp::Srl,
            imm: i64::from(ci_imm(inst)),
            ..base
        },
        q1::misc::C_SRAI => DecodedInstruction {
            class: OpClass::RegImm,
            alu_op: AluOp::Sra,
            imm: i64::from(ci_imm(inst)),
            ..base
        },
        q1::misc::C_ANDI => DecodedInstruction {
            class: OpClass::RegImm,
            alu_op: AluOp::And,
            imm: sign_extend(u64::from(ci_imm(inst)), CI_IMM_BITS),
            ..base
        },
        // C_ARITH: funct2 at bits 6-5, word flag at bit 12
        _ => {
            let (class, alu_op) = match inst.bits(5, 2, 2) | inst.bits(12, 1, 0) {
                0b0000 => (OpClass::RegReg, AluOp::Sub),
                0b0100 => (OpClass::RegReg, AluOp::Xor),
                0b1000 => (OpClass::RegReg, AluOp::Or),
                0b1100 => (OpClass::RegReg, AluOp::And),
                0b0001 => (OpClass::RegRegW, AluOp::Sub),
                0b0101 => (OpClass::RegRegW, AluOp::Add),
                _ => return Err(DecodeFault::new(inst, "compressed register group")),
            };
            DecodedInstruction {
                class,
                alu_op,
                rs2: creg(inst, 2),
                ..base
            }
        }
    };
    Ok(decoded)
}

fn decode_q2(
    inst: u32,
    cf3: u32,
    base: DecodedInstruction,
) -> Result<DecodedInstruction, DecodeFault> {
    let rd = full_reg(inst, 7);
    let rs2 = full_reg(inst, 2);

    let decoded = match cf3 {
        q2::C_SLLI => DecodedInstruction {
            class: OpClass::RegImm,
            alu_op: AluOp::Sll,
            rd,
            rs1: rd,
            imm: i64::from(ci_imm(inst)),
            ..base
        },
        q2::C_LWSP | q2::C_LDSP => {
            if rd == abi::REG_ZERO {
                return Err(DecodeFault::new(inst, "stack-pointer load with rd = x0"));
            }
            let (f3, off) = if cf3 == q2::C_LWSP {
                (funct3::LW, inst.bits(12, 1, 5) | inst.bits(2, 2, 6) | inst.bits(4, 3, 2))
            } else {
                (funct3::LD, inst.bits(12, 1, 5) | inst.bits(2, 3, 6) | inst.bits(5, 2, 3))
            };
            DecodedInstruction {
                class: OpClass::Load,
                funct3: f3,
                rd,
                rs1: abi::REG_SP,
                imm: i64::from(off),
                ..base
            }
        }
        q2::C_MISC_ALU => decode_q2_misc(inst, rd, rs2, base)?,
        q2::C_SWSP | q2::C_SDSP => {
            let (f3, off) = if cf3 == q2::C_SWSP {
                (funct3::SW, inst.bits(7, 2, 6) | inst.bits(9, 4, 2))
            } else {
                (funct3::SD, inst.bits(7, 3, 6) | inst.bits(10, 3, 3))
            };
            DecodedInstruction {
                class: OpClass::Store,
                funct3: f3,
                rs1: abi::REG_SP,
                rs2,
                imm: i64::from(off),
                ..base
            }
        }
        _ => return Err(DecodeFault::new(inst, "compressed quadrant 2 funct3")),
    };
    Ok(decoded)
}

/// C.JR, C.MV, C.EBREAK, C.JALR and C.ADD, split on bit 12.
fn decode_q2_misc(
    inst: u32,
    rd: usize,
    rs2: usize,
    base: DecodedInstruction,
) -> Result<DecodedInstruction, DecodeFault> {
    let high = inst.bits(12, 1, 0) == 1;
    let decoded = match (high, rd, rs2) {
        (false, abi::REG_ZERO, abi::REG_ZERO) => {
            return Err(DecodeFault::new(inst, "C.JR with rs1 = x0"));
        }
        (false, _, abi::REG_ZERO) => DecodedInstruction {
            class: OpClass::Jalr,
            rd: abi::REG_ZERO,
            rs1: rd,
            ..base
        },
        (false, _, _) => DecodedInstruction {
            class: OpClass::RegReg,
            rd,
            rs1: abi::REG_ZERO,
            rs2,
            ..base
        },
        (true, abi::REG_ZERO, abi::REG_ZERO) => {
            tracing::warn!(inst = format_args!("{inst:#06x}"), "c.ebreak treated as nop");
            base
        }
        (true, _, abi::REG_ZERO) => DecodedInstruction {
            class: OpClass::Jalr,
            rd: abi::REG_RA,
            rs1: rd,
            ..base
        },
        (true, _, _) => DecodedInstruction {
            class: OpClass::RegReg,
            rd,
            rs1: rd,
            rs2,
            ..base
        },
    };
    Ok(decoded)
}
