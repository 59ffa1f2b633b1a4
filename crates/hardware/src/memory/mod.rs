//! Guest memory and its timing model.
//!
//! 1. **Page Table:** demand-paged virtual to simulated-physical mapping with owned frames.
//! 2. **Storage:** the cache arena and main memory, linked into chains.
//! 3. **Memory System:** typed timed accesses, heap growth and trace replay.

/// Demand-paged page table.
pub mod page_table;

/// Cache and main-memory storage chain.
pub mod storage;

/// Timed guest memory.
pub mod system;

pub use page_table::PageTable;
pub use storage::{MainMemory, Storage, StorageChain};
pub use system::{MemoryReport, MemorySystem};
