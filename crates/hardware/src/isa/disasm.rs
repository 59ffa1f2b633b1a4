//! Instruction disassembler for pipeline dumps and trace logging.
//!
//! Works on the decoded record rather than raw bits, so compressed and
//! 32-bit forms print as their base-ISA equivalent (`c.li a0, 1` shows as
//! `addi a0, zero, 1`).
//!
//! ```
//! use rvpipe_core::isa::decode::decode;
//! use rvpipe_core::isa::disasm::disassemble;
//!
//! let d = decode(0x00a0_0513).unwrap(); // addi a0, zero, 10
//! assert_eq!(disassemble(&d), "addi a0, zero, 10");
//! ```

use crate::core::units::alu::AluOp;
use crate::isa::abi::reg_name;
use crate::isa::instruction::{DecodedInstruction, OpClass};
use crate::isa::rv64i::funct3;

/// Renders `d` as assembly text.
pub fn disassemble(d: &DecodedInstruction) -> String {
    let rd = reg_name(d.rd);
    let rs1 = reg_name(d.rs1);
    let rs2 = reg_name(d.rs2);
    let imm = d.imm;

    match d.class {
        OpClass::Nop => "nop".to_owned(),
        OpClass::Ecall => "ecall".to_owned(),
        OpClass::RegReg => format!("{} {rd}, {rs1}, {rs2}", d.alu_op.mnemonic()),
        OpClass::RegRegW => format!("{}w {rd}, {rs1}, {rs2}", d.alu_op.mnemonic()),
        OpClass::RegImm => format!("{} {rd}, {rs1}, {imm}", imm_mnemonic(d.alu_op)),
        OpClass::RegImmW => format!("{}w {rd}, {rs1}, {imm}", imm_mnemonic(d.alu_op)),
        OpClass::Load => format!("{} {rd}, {imm}({rs1})", load_mnemonic(d.funct3)),
        OpClass::Store => format!("{} {rs2}, {imm}({rs1})", store_mnemonic(d.funct3)),
        OpClass::Branch => format!("{} {rs1}, {rs2}, {imm}", branch_mnemonic(d.funct3)),
        OpClass::Jal => format!("jal {rd}, {imm}"),
        OpClass::Jalr => format!("jalr {rd}, {imm}({rs1})"),
        OpClass::Lui => format!("lui {rd}, {:#x}", (imm >> 12) & 0xF_FFFF),
        OpClass::Auipc => format!("auipc {rd}, {:#x}", (imm >> 12) & 0xF_FFFF),
    }
}

fn imm_mnemonic(op: AluOp) -> &'static str {
    match op {
        AluOp::Add => "addi",
        AluOp::Slt => "slti",
        AluOp::Sltu => "sltiu",
        AluOp::Xor => "xori",
        AluOp::Or => "ori",
        AluOp::And => "andi",
        AluOp::Sll => "slli",
        AluOp::Srl => "srli",
        AluOp::Sra => "srai",
        _ => "?i",
    }
}

const fn load_mnemonic(f3: u32) -> &'static str {
    match f3 {
        funct3::LB => "lb",
        funct3::LH => "lh",
        funct3::LW => "lw",
        funct3::LD => "ld",
        funct3::LBU => "lbu",
        funct3::LHU => "lhu",
        _ => "lwu",
    }
}

const fn store_mnemonic(f3: u32) -> &'static str {
    match f3 {
        funct3::SB => "sb",
        funct3::SH => "sh",
        funct3::SW => "sw",
        _ => "sd",
    }
}

const fn branch_mnemonic(f3: u32) -> &'static str {
    match f3 {
        funct3::BEQ => "beq",
        funct3::BNE => "bne",
        funct3::BLT => "blt",
        funct3::BGE => "bge",
        funct3::BLTU => "bltu",
        _ => "bgeu",
    }
}
