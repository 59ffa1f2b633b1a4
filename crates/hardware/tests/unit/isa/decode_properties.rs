//! Instruction Decode Properties.
//!
//! Verifies that `decode()` recovers register fields, sign-extended
//! immediates and the ALU operation for every 32-bit format, and rejects
//! unassigned encodings.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use rvpipe_core::core::units::alu::AluOp;
use rvpipe_core::isa::decode::decode;
use rvpipe_core::isa::instruction::{OpClass, sign_extend};

use crate::common::builder::instruction::InstructionBuilder;

type RegCtor = fn(InstructionBuilder, u32, u32, u32) -> InstructionBuilder;

/// Every `OP` encoding with the ALU op it must decode to.
const REG_OPS: [(RegCtor, AluOp); 14] = [
    (InstructionBuilder::add, AluOp::Add),
    (InstructionBuilder::sub, AluOp::Sub),
    (InstructionBuilder::and, AluOp::And),
    (InstructionBuilder::or, AluOp::Or),
    (InstructionBuilder::xor, AluOp::Xor),
    (InstructionBuilder::sll, AluOp::Sll),
    (InstructionBuilder::srl, AluOp::Srl),
    (InstructionBuilder::sra, AluOp::Sra),
    (InstructionBuilder::slt, AluOp::Slt),
    (InstructionBuilder::sltu, AluOp::Sltu),
    (InstructionBuilder::mul, AluOp::Mul),
    (InstructionBuilder::div, AluOp::Div),
    (InstructionBuilder::divu, AluOp::Divu),
    (InstructionBuilder::rem, AluOp::Rem),
];

proptest! {
    #[test]
    fn r_type_round_trip(idx in 0..REG_OPS.len(), rd in 0u32..32, rs1 in 0u32..32, rs2 in 0u32..32) {
        let (ctor, op) = REG_OPS[idx];
        let d = decode(ctor(InstructionBuilder::new(), rd, rs1, rs2).build()).unwrap();
        prop_assert_eq!(d.class, OpClass::RegReg);
        prop_assert_eq!((d.rd, d.rs1, d.rs2), (rd as usize, rs1 as usize, rs2 as usize));
        prop_assert_eq!(d.alu_op, op);
        prop_assert!(!d.compressed);
    }

    #[test]
    fn i_type_round_trip(rd in 0u32..32, rs1 in 0u32..32, imm in -2048i32..2048) {
        let d = decode(InstructionBuilder::new().addi(rd, rs1, imm).build()).unwrap();
        prop_assert_eq!(d.class, OpClass::RegImm);
        prop_assert_eq!((d.rd, d.rs1, d.rs2), (rd as usize, rs1 as usize, 0));
        prop_assert_eq!(d.imm, i64::from(imm));
        prop_assert_eq!(d.alu_op, AluOp::Add);
    }

    #[test]
    fn s_type_round_trip(rs1 in 0u32..32, rs2 in 0u32..32, imm in -2048i32..2048) {
        let d = decode(InstructionBuilder::new().sd(rs1, rs2, imm).build()).unwrap();
        prop_assert_eq!(d.class, OpClass::Store);
        prop_assert_eq!((d.rd, d.rs1, d.rs2), (0, rs1 as usize, rs2 as usize));
        prop_assert_eq!(d.imm, i64::from(imm));
    }

    #[test]
    fn b_type_round_trip(rs1 in 0u32..32, rs2 in 0u32..32, half in -2048i32..2048) {
        let imm = half * 2;
        let d = decode(InstructionBuilder::new().bne(rs1, rs2, imm).build()).unwrap();
        prop_assert_eq!(d.class, OpClass::Branch);
        prop_assert_eq!((d.rd, d.rs1, d.rs2), (0, rs1 as usize, rs2 as usize));
        prop_assert_eq!(d.imm, i64::from(imm));
    }

    #[test]
    fn j_type_round_trip(rd in 0u32..32, half in -(1i32 << 19)..(1i32 << 19)) {
        let imm = half * 2;
        let d = decode(InstructionBuilder::new().jal(rd, imm).build()).unwrap();
        prop_assert_eq!(d.class, OpClass::Jal);
        prop_assert_eq!(d.rd, rd as usize);
        prop_assert_eq!(d.imm, i64::from(imm));
    }

    #[test]
    fn u_type_round_trip(rd in 0u32..32, upper in 0u32..(1 << 20)) {
        let imm = (upper << 12) as i32;
        let d = decode(InstructionBuilder::new().lui(rd, imm).build()).unwrap();
        prop_assert_eq!(d.class, OpClass::Lui);
        prop_assert_eq!(d.rd, rd as usize);
        prop_assert_eq!(d.imm, i64::from(imm));
    }
}

#[rstest]
#[case(6)]
#[case(12)]
#[case(13)]
#[case(18)]
#[case(20)]
#[case(21)]
#[case(32)]
fn sign_extension_widths(#[case] width: u32) {
    let sign = 1u64 << (width - 1);
    assert_eq!(sign_extend(sign, width), -(sign as i64));
    assert_eq!(sign_extend(sign - 1, width), (sign - 1) as i64);
    assert_eq!(sign_extend((sign << 1) - 1, width), -1);
    assert!(sign_extend(1, width) > 0);
}

#[test]
fn word_ops_decode_to_their_own_class() {
    let d = decode(InstructionBuilder::new().addw(5, 6, 7).build()).unwrap();
    assert_eq!(d.class, OpClass::RegRegW);
    assert_eq!(d.alu_op, AluOp::Add);

    let d = decode(InstructionBuilder::new().subw(5, 6, 7).build()).unwrap();
    assert_eq!(d.alu_op, AluOp::Sub);

    let d = decode(InstructionBuilder::new().addiw(5, 6, -1).build()).unwrap();
    assert_eq!(d.class, OpClass::RegImmW);
    assert_eq!(d.imm, -1);
}

#[test]
fn shift_immediates_keep_only_the_shift_amount() {
    let d = decode(InstructionBuilder::new().srai(5, 6, 63).build()).unwrap();
    assert_eq!(d.alu_op, AluOp::Sra);
    assert_eq!(d.imm, 63);

    let d = decode(InstructionBuilder::new().slli(5, 6, 40).build()).unwrap();
    assert_eq!(d.alu_op, AluOp::Sll);
    assert_eq!(d.imm, 40);
}

#[test]
fn loads_keep_their_width_in_funct3() {
    let d = decode(InstructionBuilder::new().lbu(10, 2, -8).build()).unwrap();
    assert_eq!(d.class, OpClass::Load);
    assert_eq!((d.funct3, d.rd, d.rs1, d.imm), (0b100, 10, 2, -8));
}

#[test]
fn ecall_decodes() {
    let d = decode(InstructionBuilder::new().ecall().build()).unwrap();
    assert_eq!(d.class, OpClass::Ecall);
    assert_eq!(d.rd, 0);
}

#[rstest]
#[case::all_ones(0xFFFF_FFFF)]
#[case::unknown_opcode(0x0000_007F)]
#[case::bad_branch_funct3(0x0000_2063)]
#[case::bad_load_funct3(0x0000_7003)]
#[case::bad_store_funct3(0x0000_4023)]
#[case::csr_access(0x3000_2573)]
#[case::bad_op_funct7(0x4000_4033)]
fn unassigned_encodings_are_rejected(#[case] word: u32) {
    assert!(decode(word).is_err(), "{word:#010x} should not decode");
}
