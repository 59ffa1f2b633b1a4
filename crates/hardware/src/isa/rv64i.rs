//! Encoding constants for RV64I.
//!
//! Grouped by the instruction field they are matched against: the 7-bit
//! major opcode, `funct3` in bits 14:12 and `funct7` in bits 31:25.

/// Major opcodes (bits 6:0) plus the two fixed `SYSTEM` words.
pub mod opcodes {
    /// `lb` .. `lwu`.
    pub const OP_LOAD: u32 = 0x03;
    /// `addi`, `slti`, logic and shift immediates.
    pub const OP_IMM: u32 = 0x13;
    /// `auipc`.
    pub const OP_AUIPC: u32 = 0x17;
    /// `addiw`, `slliw`, `srliw`, `sraiw`.
    pub const OP_IMM_32: u32 = 0x1b;
    /// `sb` .. `sd`.
    pub const OP_STORE: u32 = 0x23;
    /// Register-register arithmetic, including the M group.
    pub const OP_REG: u32 = 0x33;
    /// `lui`.
    pub const OP_LUI: u32 = 0x37;
    /// Word register-register arithmetic, including the M group.
    pub const OP_REG_32: u32 = 0x3b;
    /// Conditional branches.
    pub const OP_BRANCH: u32 = 0x63;
    /// `jalr`.
    pub const OP_JALR: u32 = 0x67;
    /// `jal`.
    pub const OP_JAL: u32 = 0x6f;
    /// `ecall`, `ebreak` and CSR access.
    pub const OP_SYSTEM: u32 = 0x73;

    /// The only accepted `ecall` word.
    pub const ECALL: u32 = 0x0000_0073;
    /// The only accepted `ebreak` word.
    pub const EBREAK: u32 = 0x0010_0073;
}

/// `funct3` selectors. Values repeat across opcodes, so each group only
/// has meaning under its own major opcode.
pub mod funct3 {
    // OP_LOAD: bit 2 set means zero-extend, bits 1:0 are log2(width).
    /// 8-bit signed load.
    pub const LB: u32 = 0;
    /// 16-bit signed load.
    pub const LH: u32 = 1;
    /// 32-bit signed load.
    pub const LW: u32 = 2;
    /// 64-bit load.
    pub const LD: u32 = 3;
    /// 8-bit unsigned load.
    pub const LBU: u32 = 4;
    /// 16-bit unsigned load.
    pub const LHU: u32 = 5;
    /// 32-bit unsigned load; the largest valid load selector.
    pub const LWU: u32 = 6;

    // OP_STORE: log2(width).
    /// 8-bit store.
    pub const SB: u32 = 0;
    /// 16-bit store.
    pub const SH: u32 = 1;
    /// 32-bit store.
    pub const SW: u32 = 2;
    /// 64-bit store.
    pub const SD: u32 = 3;

    // OP_BRANCH: 2 and 3 are unassigned.
    /// `==`.
    pub const BEQ: u32 = 0;
    /// `!=`.
    pub const BNE: u32 = 1;
    /// Signed `<`.
    pub const BLT: u32 = 4;
    /// Signed `>=`.
    pub const BGE: u32 = 5;
    /// Unsigned `<`.
    pub const BLTU: u32 = 6;
    /// Unsigned `>=`.
    pub const BGEU: u32 = 7;

    // OP_IMM / OP_REG and their word forms.
    /// `add`/`sub` (split by `funct7` on `OP_REG`).
    pub const ADD_SUB: u32 = 0;
    /// Left shift.
    pub const SLL: u32 = 1;
    /// Signed compare.
    pub const SLT: u32 = 2;
    /// Unsigned compare.
    pub const SLTU: u32 = 3;
    /// Exclusive or.
    pub const XOR: u32 = 4;
    /// Right shift, logical or arithmetic by `funct7`.
    pub const SRL_SRA: u32 = 5;
    /// Inclusive or.
    pub const OR: u32 = 6;
    /// And.
    pub const AND: u32 = 7;

    /// `jalr` has a single valid selector.
    pub const JALR: u32 = 0;
}

/// `funct7` selectors for `OP_REG`, `OP_REG_32` and the immediate shifts.
pub mod funct7 {
    /// Base operation.
    pub const DEFAULT: u32 = 0x00;
    /// `sub`.
    pub const SUB: u32 = 0x20;
    /// `sra`, `sraw`, `sraiw`.
    pub const SRA: u32 = 0x20;
    /// Bits 31:26 of `srai`; bit 25 belongs to the 6-bit shift amount.
    pub const SRAI_FUNCT6: u32 = 0x10;
}
