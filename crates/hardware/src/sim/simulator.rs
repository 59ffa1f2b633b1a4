//! Simulator: the run driver around a [`Cpu`].
//!
//! Owns the CPU, places the program and its stack, ticks until the guest
//! exits or a fatal error stops the run, and renders the final reports.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use crate::common::error::{Result, RunOutcome, StageError};
use crate::config::Config;
use crate::core::Cpu;
use crate::core::cpu::Console;

use super::loader::{Program, init_stack};

/// Banner separating guest output from the simulator's report.
pub const USER_OUTPUT_BANNER: &str = "======== above are user output ========";

/// Top-level simulator: a CPU plus per-run bookkeeping.
#[derive(Debug)]
pub struct Simulator {
    /// CPU state (registers, pipeline, memory, stats).
    pub cpu: Cpu,
    stack_size: u64,
    started: Option<Instant>,
    elapsed: Duration,
}

impl Simulator {
    /// Creates a simulator on stdin and stdout.
    ///
    /// # Errors
    ///
    /// [`crate::SimError::Configuration`] if `config` does not validate.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_console(config, Console::stdio())
    }

    /// Creates a simulator whose guest console is `console`.
    ///
    /// # Errors
    ///
    /// [`crate::SimError::Configuration`] if `config` does not validate.
    pub fn with_console(config: &Config, console: Console) -> Result<Self> {
        Ok(Self {
            cpu: Cpu::with_console(config, console)?,
            stack_size: config.stack_size,
            started: None,
            elapsed: Duration::ZERO,
        })
    }

    /// Resets the machine, loads `program` and builds the stack frame for
    /// `argv` (`argv[0]` is conventionally the program name).
    ///
    /// # Errors
    ///
    /// [`crate::SimError::Loader`] if the image or the arguments cannot be placed.
    pub fn load(&mut self, program: &Program, argv: &[String]) -> Result<()> {
        self.cpu.reset();
        program.load_into(&mut self.cpu.mem)?;
        init_stack(&mut self.cpu.mem, &mut self.cpu.regs, self.stack_size, argv)?;
        self.cpu.set_entry(program.entry);
        self.started = None;
        self.elapsed = Duration::ZERO;
        tracing::info!(entry = format_args!("{:#x}", program.entry), "program loaded");
        Ok(())
    }

    /// Advances one tick.
    ///
    /// # Errors
    ///
    /// The fatal [`StageError`] that stopped the tick.
    pub fn step(&mut self) -> std::result::Result<RunOutcome, StageError> {
        let started = *self.started.get_or_insert_with(Instant::now);
        let outcome = self.cpu.tick();
        self.elapsed = started.elapsed();
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("\n{}{}", self.cpu.dump_pipeline(), self.cpu.dump_registers());
        }
        outcome
    }

    /// Ticks until the guest exits and returns its status.
    ///
    /// # Errors
    ///
    /// The fatal [`StageError`] that stopped the run. The CPU is left as it
    /// was at the start of the failing tick.
    pub fn run(&mut self) -> std::result::Result<u64, StageError> {
        loop {
            if let RunOutcome::Exited { code } = self.step()? {
                return Ok(code);
            }
        }
    }

    /// Wall-clock time spent ticking.
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Report printed after a normal exit.
    pub fn exit_summary(&self, code: u64) -> String {
        let mut out = format!(
            "{USER_OUTPUT_BANNER}\nprogram exited {code} in {} seconds\n",
            self.elapsed.as_secs()
        );
        let _ = write!(out, "{}{}", self.cpu.stats, self.cpu.mem.report());
        out
    }

    /// Report printed after a fatal error: cause, pipeline, registers, memory.
    pub fn failure_summary(&self, err: &StageError) -> String {
        let mut out = format!(
            "{USER_OUTPUT_BANNER}\nruntime_error in {}: {}\n",
            err.stage, err.source
        );
        let _ = write!(
            out,
            "{}{}{}",
            self.cpu.dump_pipeline(),
            self.cpu.dump_registers(),
            self.cpu.mem.report()
        );
        out
    }
}
