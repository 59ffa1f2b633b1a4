//! RISC-V Instruction Decoder.
//!
//! This module turns a raw instruction word into a `DecodedInstruction`.
//! Classification proceeds from encoding width (low two bits), to the major
//! opcode, to the `funct3`/`funct7` fields. Immediates are sign-extended from
//! exactly the width of their source field: 12 bits for I/S-type, 13 for
//! B-type, 21 for J-type and 32 for U-type. Compressed words are handed to
//! [`crate::isa::rvc::decode`].

use crate::core::units::alu::AluOp;
use crate::isa::instruction::{
    DecodeFault, DecodedInstruction, InstructionBits, OpClass, sign_extend,
};
use crate::isa::rv64i::{funct3, funct7, opcodes};
use crate::isa::rv64m::opcodes::M_EXTENSION;
use crate::isa::rvc;

/// Bit shift for extracting I-Type immediate field (bits 20-31).
const I_IMM_SHIFT: u32 = 20;

/// Width of I-Type and S-Type immediates.
const I_IMM_BITS: u32 = 12;

/// Mask for the 6-bit RV64 shift amount of SLLI/SRLI/SRAI.
const SHAMT6_MASK: i64 = 0x3F;

/// Mask for the 5-bit shift amount of SLLIW/SRLIW/SRAIW.
const SHAMT5_MASK: i64 = 0x1F;

/// Total number of bits in B-Type immediate (13 bits, sign-extended).
const B_IMM_BITS: u32 = 13;

/// Total number of bits in J-Type immediate (21 bits, sign-extended).
const J_IMM_BITS: u32 = 21;

/// Total number of bits in U-Type immediate.
const U_IMM_BITS: u32 = 32;

/// Decodes one instruction word of either width.
///
/// Words whose low two bits are not `0b11` are compressed; only their low
/// 16 bits are examined.
///
/// # Errors
///
/// Returns a [`DecodeFault`] naming the raw bits for any unassigned
/// opcode/funct combination. Attach the pc with [`DecodeFault::at`].
///
/// # Examples
///
/// ```
/// use rvpipe_core::core::units::alu::AluOp;
/// use rvpipe_core::isa::decode::decode;
/// use rvpipe_core::isa::instruction::OpClass;
///
/// // add a0, a0, a1
/// let d = decode(0x00b5_0533).unwrap();
/// assert_eq!(d.class, OpClass::RegReg);
/// assert_eq!((d.rd, d.rs1, d.rs2), (10, 10, 11));
/// assert_eq!(d.alu_op, AluOp::Add);
///
/// // c.li a0, -1
/// let d = decode(0x557d).unwrap();
/// assert!(d.compressed);
/// assert_eq!((d.rd, d.imm), (10, -1));
/// ```
pub fn decode(inst: u32) -> Result<DecodedInstruction, DecodeFault> {
    if is_compressed(inst) {
        rvc::decode::decode_compressed(inst & 0xFFFF)
    } else {
        decode_32(inst)
    }
}

/// Returns true when the low two bits select the 16-bit encoding.
#[inline(always)]
pub const fn is_compressed(inst: u32) -> bool {
    inst & crate::common::constants::COMPRESSED_INSTRUCTION_MASK
        != crate::common::constants::UNCOMPRESSED_INSTRUCTION_VALUE
}

/// Decodes a 32-bit encoding.
fn decode_32(inst: u32) -> Result<DecodedInstruction, DecodeFault> {
    let f3 = inst.funct3();
    let f7 = inst.funct7();
    let base = DecodedInstruction {
        raw: inst,
        funct3: f3,
        ..DecodedInstruction::default()
    };

    let decoded = match inst.opcode() {
        opcodes::OP_REG => DecodedInstruction {
            class: OpClass::RegReg,
            rd: inst.rd(),
            rs1: inst.rs1(),
            rs2: inst.rs2(),
            alu_op: reg_alu_op(f3, f7).ok_or(DecodeFault::new(inst, "OP funct3/funct7"))?,
            ..base
        },
        opcodes::OP_REG_32 => DecodedInstruction {
            class: OpClass::RegRegW,
            rd: inst.rd(),
            rs1: inst.rs1(),
            rs2: inst.rs2(),
            alu_op: reg_w_alu_op(f3, f7)
                .ok_or(DecodeFault::new(inst, "OP-32 funct3/funct7"))?,
            ..base
        },
        opcodes::OP_LOAD => {
            if f3 > funct3::LWU {
                return Err(DecodeFault::new(inst, "LOAD funct3"));
            }
            DecodedInstruction {
                class: OpClass::Load,
                rd: inst.rd(),
                rs1: inst.rs1(),
                imm: decode_i_type_imm(inst),
                ..base
            }
        }
        opcodes::OP_IMM => {
            let raw_imm = decode_i_type_imm(inst);
            let (alu_op, imm) = match f3 {
                funct3::SLL if f7 >> 1 == funct7::DEFAULT => (AluOp::Sll, raw_imm & SHAMT6_MASK),
                funct3::SRL_SRA if f7 >> 1 == funct7::DEFAULT => {
                    (AluOp::Srl, raw_imm & SHAMT6_MASK)
                }
                funct3::SRL_SRA if f7 >> 1 == funct7::SRAI_FUNCT6 => {
                    (AluOp::Sra, raw_imm & SHAMT6_MASK)
                }
                funct3::SLL | funct3::SRL_SRA => {
                    return Err(DecodeFault::new(inst, "OP-IMM shift funct6"));
                }
                _ => (imm_alu_op(f3), raw_imm),
            };
            DecodedInstruction {
                class: OpClass::RegImm,
                rd: inst.rd(),
                rs1: inst.rs1(),
                imm,
                alu_op,
                ..base
            }
        }
        opcodes::OP_IMM_32 => {
            let raw_imm = decode_i_type_imm(inst);
            let (alu_op, imm) = match (f3, f7) {
                (funct3::ADD_SUB, _) => (AluOp::Add, raw_imm),
                (funct3::SLL, funct7::DEFAULT) => (AluOp::Sll, raw_imm & SHAMT5_MASK),
                (funct3::SRL_SRA, funct7::DEFAULT) => (AluOp::Srl, raw_imm & SHAMT5_MASK),
                (funct3::SRL_SRA, funct7::SRA) => (AluOp::Sra, raw_imm & SHAMT5_MASK),
                _ => return Err(DecodeFault::new(inst, "OP-IMM-32 funct3/funct7")),
            };
            DecodedInstruction {
                class: OpClass::RegImmW,
                rd: inst.rd(),
                rs1: inst.rs1(),
                imm,
                alu_op,
                ..base
            }
        }
        opcodes::OP_JALR => {
            if f3 != funct3::JALR {
                return Err(DecodeFault::new(inst, "JALR funct3"));
            }
            DecodedInstruction {
                class: OpClass::Jalr,
                rd: inst.rd(),
                rs1: inst.rs1(),
                imm: decode_i_type_imm(inst),
                ..base
            }
        }
        opcodes::OP_SYSTEM => match inst {
            opcodes::ECALL => DecodedInstruction {
                class: OpClass::Ecall,
                ..base
            },
            opcodes::EBREAK => {
                tracing::warn!(inst = format_args!("{inst:#010x}"), "ebreak treated as nop");
                base
            }
            _ => return Err(DecodeFault::new(inst, "SYSTEM (only ecall/ebreak supported)")),
        },
        opcodes::OP_STORE => {
            if f3 > funct3::SD {
                return Err(DecodeFault::new(inst, "STORE funct3"));
            }
            DecodedInstruction {
                class: OpClass::Store,
                rs1: inst.rs1(),
                rs2: inst.rs2(),
                imm: decode_s_type_imm(inst),
                ..base
            }
        }
        opcodes::OP_BRANCH => {
            if matches!(f3, 0b010 | 0b011) {
                return Err(DecodeFault::new(inst, "BRANCH funct3"));
            }
            DecodedInstruction {
                class: OpClass::Branch,
                rs1: inst.rs1(),
                rs2: inst.rs2(),
                imm: decode_b_type_imm(inst),
                ..base
            }
        }
        opcodes::OP_AUIPC => DecodedInstruction {
            class: OpClass::Auipc,
            rd: inst.rd(),
            imm: decode_u_type_imm(inst),
            ..base
        },
        opcodes::OP_LUI => DecodedInstruction {
            class: OpClass::Lui,
            rd: inst.rd(),
            imm: decode_u_type_imm(inst),
            ..base
        },
        opcodes::OP_JAL => DecodedInstruction {
            class: OpClass::Jal,
            rd: inst.rd(),
            imm: decode_j_type_imm(inst),
            ..base
        },
        _ => return Err(DecodeFault::new(inst, "opcode")),
    };
    Ok(decoded)
}

/// ALU op of an `OP` (R-type) instruction.
fn reg_alu_op(f3: u32, f7: u32) -> Option<AluOp> {
    let op = match (f7, f3) {
        (funct7::DEFAULT, funct3::ADD_SUB) => AluOp::Add,
        (funct7::SUB, funct3::ADD_SUB) => AluOp::Sub,
        (funct7::DEFAULT, funct3::SLL) => AluOp::Sll,
        (funct7::DEFAULT, funct3::SLT) => AluOp::Slt,
        (funct7::DEFAULT, funct3::SLTU) => AluOp::Sltu,
        (funct7::DEFAULT, funct3::XOR) => AluOp::Xor,
        (funct7::DEFAULT, funct3::SRL_SRA) => AluOp::Srl,
        (funct7::SRA, funct3::SRL_SRA) => AluOp::Sra,
        (funct7::DEFAULT, funct3::OR) => AluOp::Or,
        (funct7::DEFAULT, funct3::AND) => AluOp::And,
        (M_EXTENSION, _) => m_alu_op(f3),
        _ => return None,
    };
    Some(op)
}

/// ALU op of an `OP-32` instruction; only the RV64 word subset exists.
fn reg_w_alu_op(f3: u32, f7: u32) -> Option<AluOp> {
    use crate::isa::rv64m::funct3 as m;
    let op = match (f7, f3) {
        (funct7::DEFAULT, funct3::ADD_SUB) => AluOp::Add,
        (funct7::SUB, funct3::ADD_SUB) => AluOp::Sub,
        (funct7::DEFAULT, funct3::SLL) => AluOp::Sll,
        (funct7::DEFAULT, funct3::SRL_SRA) => AluOp::Srl,
        (funct7::SRA, funct3::SRL_SRA) => AluOp::Sra,
        (M_EXTENSION, m::MUL | m::DIV | m::DIVU | m::REM | m::REMU) => m_alu_op(f3),
        _ => return None,
    };
    Some(op)
}

/// M-extension op selected by `funct3`.
const fn m_alu_op(f3: u32) -> AluOp {
    use crate::isa::rv64m::funct3 as m;
    match f3 {
        m::MUL => AluOp::Mul,
        m::MULH => AluOp::Mulh,
        m::MULHSU => AluOp::Mulhsu,
        m::MULHU => AluOp::Mulhu,
        m::DIV => AluOp::Div,
        m::DIVU => AluOp::Divu,
        m::REM => AluOp::Rem,
        _ => AluOp::Remu,
    }
}

/// ALU op of a non-shift `OP-IMM` instruction.
const fn imm_alu_op(f3: u32) -> AluOp {
    match f3 {
        funct3::SLT => AluOp::Slt,
        funct3::SLTU => AluOp::Sltu,
        funct3::XOR => AluOp::Xor,
        funct3::OR => AluOp::Or,
        funct3::AND => AluOp::And,
        _ => AluOp::Add,
    }
}

/// I-Type format: `imm[11:0] | rs1 | funct3 | rd | opcode`
fn decode_i_type_imm(inst: u32) -> i64 {
    sign_extend(u64::from(inst >> I_IMM_SHIFT), I_IMM_BITS)
}

/// S-Type format: `imm[11:5] | rs2 | rs1 | funct3 | imm[4:0] | opcode`
fn decode_s_type_imm(inst: u32) -> i64 {
    let combined = inst.bits(25, 7, 5) | inst.bits(7, 5, 0);
    sign_extend(u64::from(combined), I_IMM_BITS)
}

/// B-Type format: `imm[12] | imm[10:5] | rs2 | rs1 | funct3 | imm[4:1] | imm[11] | opcode`
fn decode_b_type_imm(inst: u32) -> i64 {
    let combined =
        inst.bits(31, 1, 12) | inst.bits(25, 6, 5) | inst.bits(8, 4, 1) | inst.bits(7, 1, 11);
    sign_extend(u64::from(combined), B_IMM_BITS)
}

/// U-Type format: `imm[31:12] | rd | opcode`
fn decode_u_type_imm(inst: u32) -> i64 {
    sign_extend(u64::from(inst.bits(12, 20, 12)), U_IMM_BITS)
}

/// J-Type format: `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`
fn decode_j_type_imm(inst: u32) -> i64 {
    let combined =
        inst.bits(31, 1, 20) | inst.bits(21, 10, 1) | inst.bits(20, 1, 11) | inst.bits(12, 8, 12);
    sign_extend(u64::from(combined), J_IMM_BITS)
}
