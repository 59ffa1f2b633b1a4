//! Integer register file.
//!
//! Thirty-two 64-bit registers with `x0` hardwired to zero. The file is
//! written only by the write-back stage and the syscall service.

use std::fmt;

use super::constants::REG_COUNT;
use crate::isa::abi;

/// The architectural integer register file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u64; REG_COUNT],
}

impl RegisterFile {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Register `x0` always returns 0.
    ///
    /// # Returns
    ///
    /// The 64-bit value stored in the specified register, or 0 for an
    /// out-of-range index.
    #[inline]
    pub fn read(&self, idx: usize) -> u64 {
        if idx == abi::REG_ZERO {
            0
        } else {
            self.regs.get(idx).copied().unwrap_or(0)
        }
    }

    /// Writes a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Writes to `x0` are ignored.
    /// * `val` - The 64-bit value to write.
    #[inline]
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx == abi::REG_ZERO {
            return;
        }
        if let Some(slot) = self.regs.get_mut(idx) {
            *slot = val;
        }
    }

    /// Zeroes every register.
    pub fn reset(&mut self) {
        self.regs = [0; REG_COUNT];
    }

    /// Returns a copy of all register values, `x0` included.
    pub fn snapshot(&self) -> [u64; REG_COUNT] {
        self.regs
    }
}

impl fmt::Display for RegisterFile {
    /// Four registers per row, ABI name first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, val) in self.regs.iter().enumerate() {
            write!(f, "{:>4}(x{:<2}) = {:#018x}", abi::reg_name(i), i, val)?;
            if i % 4 == 3 {
                writeln!(f)?;
            } else {
                write!(f, "  ")?;
            }
        }
        Ok(())
    }
}
