//! Encoding constants for the M extension.
//!
//! Multiply and divide share `OP_REG`/`OP_REG_32` with base arithmetic;
//! `funct7 == M_EXTENSION` selects this group and `funct3` the operation.
//! Only `mul`, `div`, `divu`, `rem` and `remu` exist in word form.

/// Group selector.
pub mod opcodes {
    /// `funct7` of every M instruction.
    pub const M_EXTENSION: u32 = 0x01;
}

/// Operation selectors within the group.
pub mod funct3 {
    /// Low half of the product.
    pub const MUL: u32 = 0;
    /// High half, signed x signed.
    pub const MULH: u32 = 1;
    /// High half, signed x unsigned.
    pub const MULHSU: u32 = 2;
    /// High half, unsigned x unsigned.
    pub const MULHU: u32 = 3;
    /// Signed quotient.
    pub const DIV: u32 = 4;
    /// Unsigned quotient.
    pub const DIVU: u32 = 5;
    /// Signed remainder.
    pub const REM: u32 = 6;
    /// Unsigned remainder.
    pub const REMU: u32 = 7;
}
