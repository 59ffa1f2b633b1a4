//! RV64 pipeline simulator CLI.
//!
//! This binary provides a single entry point for both simulation modes. It performs:
//! 1. **Program run:** Load an RV64 ELF, build its stack from the trailing arguments, run it to exit.
//! 2. **Trace replay:** Feed a `r|w <addr>` trace through the data-side cache chain and print the cache report.
//!
//! The configuration is JSON; `--no-forwarding` and `--predictor` patch it
//! before it is validated.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use rvpipe_core::config::BranchPredictorKind;
use rvpipe_core::memory::MemorySystem;
use rvpipe_core::sim::{Simulator, load_elf};
use rvpipe_core::{Config, SimError};

#[derive(Parser, Debug)]
#[command(
    name = "rvpipe",
    author,
    version,
    about = "RV64 five-stage pipeline simulator",
    long_about = "Run an RV64IMC ELF on a five-stage pipeline with a configurable cache hierarchy.\n\nExamples:\n  rvpipe -c config.json qsort 100\n  rvpipe --predictor btfnt --no-forwarding loop\n  rvpipe -c config.json --trace accesses.trace"
)]
struct Cli {
    /// JSON configuration file; built-in defaults if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (repeat for per-tick pipeline dumps).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Replay a memory trace instead of running a program.
    #[arg(long, conflicts_with = "elf")]
    trace: Option<PathBuf>,

    /// Disable operand forwarding.
    #[arg(long)]
    no_forwarding: bool,

    /// Branch predictor: never_taken, always_taken, btfnt or branch_history_table.
    #[arg(long)]
    predictor: Option<BranchPredictorKind>,

    /// Program to run.
    #[arg(required_unless_present = "trace")]
    elf: Option<PathBuf>,

    /// Arguments passed to the program.
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the `tracing` subscriber; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, SimError> {
    let config = load_config(cli)?;

    if let Some(trace) = &cli.trace {
        let mut mem = MemorySystem::new(&config)?;
        mem.run_trace(BufReader::new(File::open(trace)?))?;
        print!("{}", mem.report());
        return Ok(ExitCode::SUCCESS);
    }

    let Some(elf) = &cli.elf else {
        return Err(SimError::Loader("no program given".into()));
    };
    let program = load_elf(&fs::read(elf)?)?;
    let mut argv = vec![elf.display().to_string()];
    argv.extend(cli.args.iter().cloned());

    let mut sim = Simulator::new(&config)?;
    sim.load(&program, &argv)?;

    let result = sim.run();
    io::stdout().flush()?;
    match result {
        Ok(code) => {
            println!("{}", sim.exit_summary(code));
            Ok(ExitCode::from(code as u8))
        }
        Err(err) => {
            tracing::error!(stage = %err.stage, pc = format_args!("{:#x}", err.pc), "run aborted");
            println!("{}", sim.failure_summary(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Reads the JSON configuration and applies the command-line patches.
fn load_config(cli: &Cli) -> Result<Config, SimError> {
    let mut value = match &cli.config {
        Some(path) => read_json(path)?,
        None => serde_json::to_value(Config::default()).map_err(config_error)?,
    };

    if let Value::Object(map) = &mut value {
        if cli.no_forwarding {
            let _ = map.insert("data_forwarding".into(), Value::Bool(false));
        }
        if let Some(kind) = cli.predictor {
            let _ = map.insert(
                "branch_predictor".into(),
                serde_json::to_value(kind).map_err(config_error)?,
            );
        }
    }
    Config::from_json(&value.to_string())
}

fn read_json(path: &Path) -> Result<Value, SimError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| SimError::Configuration(format!("{}: {e}", path.display())))
}

fn config_error(e: serde_json::Error) -> SimError {
    SimError::Configuration(e.to_string())
}
