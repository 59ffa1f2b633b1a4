/// Small programs run to completion.
pub mod end_to_end;

/// Program loading and stack setup.
pub mod loader;
