//! 16-bit compressed instructions.
//!
//! `constants` names the quadrant and `funct3` values; `decode` maps each
//! supported form directly onto the record its 32-bit expansion would
//! produce.

/// Quadrant and selector values.
pub mod constants;

/// Compressed decoder.
pub mod decode;
