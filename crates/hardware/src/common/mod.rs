//! Common types shared by every part of the simulator.
//!
//! This module provides the following:
//! 1. **Address Types:** Strong types for guest virtual and simulated physical addresses.
//! 2. **Constants:** Page geometry and the fixed guest memory layout.
//! 3. **Memory Access:** Classification of accesses (fetch, load, store).
//! 4. **Error Handling:** Fatal simulation errors and the normal-exit outcome.
//! 5. **Register Management:** The integer register file.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types, stage identifiers and run outcomes.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use addr::{PhysAddr, VirtAddr};
pub use constants::{PAGE_SHIFT, PAGE_SIZE};
pub use data::AccessType;
pub use error::{Result, RunOutcome, SimError, Stage, StageError};
pub use reg::RegisterFile;
