//! Global simulator constants.
//!
//! This module defines the constants that fix the guest memory layout and
//! the instruction-width encoding. It includes:
//! 1. **Page Constants:** Page size, shift and offset mask of the demand-paged address space.
//! 2. **Layout Constants:** Where the heap starts and where the stack ends.
//! 3. **Instruction Constants:** Width selection bits and instruction sizes.

/// Page size in bytes (4KB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u64 = 12;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// First byte of the guest heap; `sbrk` grows upward from here.
pub const HEAP_START: u64 = 0x8_0000_0000;

/// One past the highest stack byte; the stack grows downward from here.
pub const STACK_TOP: u64 = 0x1_0000_0000_0000;

/// Number of integer registers.
pub const REG_COUNT: usize = 32;

/// Size of a compressed (16-bit) RISC-V instruction in bytes.
pub const INSTRUCTION_SIZE_16: u64 = 2;

/// Size of a standard (32-bit) RISC-V instruction in bytes.
pub const INSTRUCTION_SIZE_32: u64 = 4;

/// Bit mask for checking if an instruction is compressed.
pub const COMPRESSED_INSTRUCTION_MASK: u32 = 0x3;

/// Low two bits of every 32-bit instruction; anything else is compressed.
pub const UNCOMPRESSED_INSTRUCTION_VALUE: u32 = 0x3;

/// Main memory access latency used when the configuration does not set one.
pub const DEFAULT_MEMORY_CYCLES: u64 = 100;
