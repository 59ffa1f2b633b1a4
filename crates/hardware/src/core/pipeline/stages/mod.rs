//! Pipeline stage implementations.
//!
//! Each stage reads the current pipeline registers and writes its output
//! into the next set. The engine calls them in reverse order so that
//! decode can forward from this tick's execute and memory results.
//! 1. **Fetch:** reads an instruction and predicts the next pc.
//! 2. **Decode:** decodes and selects operand values.
//! 3. **Execute:** ALU, branch condition, deferred fault reporting.
//! 4. **Memory:** loads and stores.
//! 5. **Writeback:** register file commit.

/// Instruction decode stage implementation.
pub mod decode;

/// Instruction execute stage implementation.
pub mod execute;

/// Instruction fetch stage implementation.
pub mod fetch;

/// Memory access stage implementation.
pub mod memory;

/// Writeback stage implementation.
pub mod writeback;

pub use decode::decode_stage;
pub use execute::execute_stage;
pub use fetch::fetch_stage;
pub use memory::memory_stage;
pub use writeback::writeback_stage;
