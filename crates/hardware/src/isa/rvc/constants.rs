//! RISC-V Compressed (C) Extension Constants.
//!
//! Compressed instructions are divided into three quadrants (0, 1, 2) based
//! on the lowest 2 bits of the instruction; `funct3` (bits 15-13) selects the
//! instruction within a quadrant. Floating-point forms are not listed since
//! the simulator has no FP register file.

/// Quadrant 0 (bits 1:0 = 00).
pub const QUADRANT_0: u32 = 0b00;
/// Quadrant 1 (bits 1:0 = 01).
pub const QUADRANT_1: u32 = 0b01;
/// Quadrant 2 (bits 1:0 = 10).
pub const QUADRANT_2: u32 = 0b10;

/// Compressed registers `x8`-`x15` are encoded as 3-bit offsets from this base.
pub const CREG_BASE: usize = 8;

/// Instructions in Quadrant 0.
pub mod q0 {
    /// Compressed Add Immediate, scaled by 4, to Stack Pointer (C.ADDI4SPN).
    pub const C_ADDI4SPN: u32 = 0b000;
    /// Compressed Load Word (C.LW).
    pub const C_LW: u32 = 0b010;
    /// Compressed Load Double (C.LD).
    pub const C_LD: u32 = 0b011;
    /// Compressed Store Word (C.SW).
    pub const C_SW: u32 = 0b110;
    /// Compressed Store Double (C.SD).
    pub const C_SD: u32 = 0b111;
}

/// Instructions in Quadrant 1.
pub mod q1 {
    /// Compressed Add Immediate (C.ADDI).
    pub const C_ADDI: u32 = 0b000;
    /// Compressed Add Immediate Word (C.ADDIW).
    pub const C_ADDIW: u32 = 0b001;
    /// Compressed Load Immediate (C.LI).
    pub const C_LI: u32 = 0b010;
    /// Compressed Load Upper Immediate / Add Immediate 16 to SP (C.LUI / C.ADDI16SP).
    pub const C_LUI_ADDI16SP: u32 = 0b011;
    /// Miscellaneous ALU operations (C.SRLI, C.SRAI, C.ANDI, C.SUB, etc.).
    pub const C_MISC_ALU: u32 = 0b100;
    /// Compressed Jump (C.J).
    pub const C_J: u32 = 0b101;
    /// Compressed Branch Equal Zero (C.BEQZ).
    pub const C_BEQZ: u32 = 0b110;
    /// Compressed Branch Not Equal Zero (C.BNEZ).
    pub const C_BNEZ: u32 = 0b111;

    /// `funct2` (bits 11-10) values inside `C_MISC_ALU`.
    pub mod misc {
        /// C.SRLI.
        pub const C_SRLI: u32 = 0b00;
        /// C.SRAI.
        pub const C_SRAI: u32 = 0b01;
        /// C.ANDI.
        pub const C_ANDI: u32 = 0b10;
        /// Register-register group (C.SUB, C.XOR, C.OR, C.AND, C.SUBW, C.ADDW).
        pub const C_ARITH: u32 = 0b11;
    }
}

/// Instructions in Quadrant 2.
pub mod q2 {
    /// Compressed Shift Left Logical Immediate (C.SLLI).
    pub const C_SLLI: u32 = 0b000;
    /// Compressed Load Word from SP (C.LWSP).
    pub const C_LWSP: u32 = 0b010;
    /// Compressed Load Double from SP (C.LDSP).
    pub const C_LDSP: u32 = 0b011;
    /// Miscellaneous ALU / Jump (C.JR, C.MV, C.EBREAK, C.JALR, C.ADD).
    pub const C_MISC_ALU: u32 = 0b100;
    /// Compressed Store Word to SP (C.SWSP).
    pub const C_SWSP: u32 = 0b110;
    /// Compressed Store Double to SP (C.SDSP).
    pub const C_SDSP: u32 = 0b111;
}
