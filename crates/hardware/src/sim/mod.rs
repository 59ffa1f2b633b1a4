//! Simulation driver and program loading.
//!
//! Provides the ELF loader, initial stack setup, and the run loop that
//! ties them to a [`crate::Cpu`].

/// ELF parsing, segment placement and stack initialization.
pub mod loader;

/// Run driver and final reports.
pub mod simulator;

pub use loader::{Program, Segment, init_stack, load_elf};
pub use simulator::Simulator;
