//! Execution units used by the pipeline stages.
//!
//! The ALU evaluates every integer operation in execute, the branch
//! prediction unit steers fetch, and the cache model times memory accesses.

/// Arithmetic Logic Unit for integer operations.
pub mod alu;

/// Conditional branch predictors.
pub mod bru;

/// Set-associative cache timing model.
pub mod cache;
