//! Memory access types.
//!
//! Accesses are classified so that faults can name what the guest was doing
//! and so that the memory system can pick the instruction- or data-side
//! storage chain.

use std::fmt;

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Instruction fetch; served by the instruction-side chain.
    Fetch,

    /// Data load; served by the data-side chain.
    Read,

    /// Data store; served by the data-side chain.
    Write,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}
