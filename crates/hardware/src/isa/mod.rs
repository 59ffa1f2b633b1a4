//! Instruction Set Architecture (ISA) Definitions.
//!
//! Opcode tables, field extraction and the decoder for the integer subset
//! the pipeline executes.
//!
//! # Extensions
//!
//! * `rv64i`: Base Integer Instruction Set (64-bit).
//! * `rv64m`: Integer Multiplication and Division.
//! * `rvc`: Compressed Instructions (integer forms only).

/// Application Binary Interface (ABI) register name mappings.
pub mod abi;

/// Instruction decoding for both encoding widths.
pub mod decode;

/// Instruction disassembler for dumps and trace logging.
pub mod disasm;

/// Field extraction and the decoded-instruction record.
pub mod instruction;

/// Base integer instruction set (64-bit RISC-V core instructions).
pub mod rv64i;

/// Integer multiply/divide extension (MUL, DIV, REM instructions).
pub mod rv64m;

/// Compressed instruction extension (16-bit instruction encoding).
pub mod rvc;
