//! Guest System Call Service.
//!
//! An `ecall` is serviced when it reaches write-back. The service number is
//! in `a7`, the argument in `a1` and the result goes to `a0`:
//!
//! | a7 | service  | effect                                   |
//! |----|----------|------------------------------------------|
//! | 0  | cputchar | write the low byte of `a1` to the output |
//! | 1  | sbrk     | `a0 = sbrk(a1)`                          |
//! | 2  | readint  | `a0 =` next integer from the input       |
//! | 3  | time     | `a0 =` seconds since the Unix epoch      |
//! | 93 | exit     | stop with status `a0`                    |

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::error::{Result, SimError};
use crate::core::Cpu;
use crate::isa::abi;

/// Print one character.
pub const SYS_CPUTCHAR: u64 = 0;
/// Grow the heap.
pub const SYS_SBRK: u64 = 1;
/// Read one integer.
pub const SYS_READINT: u64 = 2;
/// Wall-clock seconds.
pub const SYS_TIME: u64 = 3;
/// Terminate the program.
pub const SYS_EXIT: u64 = 93;

/// Result of servicing one `ecall`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyscallOutcome {
    /// Keep running; the call cost `cycles`.
    Continue {
        /// Configured cost of the service.
        cycles: u64,
    },
    /// The guest asked to exit.
    Exit {
        /// Status from `a0`.
        code: u64,
    },
}

/// Host side of the guest console.
///
/// `readint` consumes whitespace-separated tokens, reading a new line from
/// the input only when the current one is used up.
pub struct Console {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    pending: VecDeque<String>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}

impl Console {
    /// Console on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }

    /// Console on arbitrary streams.
    pub fn new(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            pending: VecDeque::new(),
        }
    }

    /// Writes one byte of guest output.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] if the sink fails.
    pub fn put_char(&mut self, c: u8) -> Result<()> {
        self.output.write_all(&[c])?;
        Ok(())
    }

    /// Flushes guest output.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] if the sink fails.
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    /// Reads the next integer token.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] at end of input or when the token is not an integer.
    pub fn read_int(&mut self) -> Result<i64> {
        while self.pending.is_empty() {
            self.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "readint: end of input").into());
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
        let token = self.pending.pop_front().unwrap_or_default();
        token.parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("readint: {token:?} is not an integer"),
            )
            .into()
        })
    }
}

/// Services the `ecall` currently in write-back.
///
/// # Errors
///
/// [`SimError::UnsupportedSyscall`] for an unknown `a7`,
/// [`SimError::HeapExhausted`] for an `sbrk` that does not fit, or an I/O
/// error from the console.
pub fn service(cpu: &mut Cpu) -> Result<SyscallOutcome> {
    let number = cpu.regs.read(abi::REG_A7);
    let a1 = cpu.regs.read(abi::REG_A1);
    let costs = cpu.latencies.ecall;

    let cycles = match number {
        SYS_EXIT => {
            cpu.console.flush()?;
            return Ok(SyscallOutcome::Exit {
                code: cpu.regs.read(abi::REG_A0),
            });
        }
        SYS_CPUTCHAR => {
            cpu.console.put_char(a1 as u8)?;
            costs.cputchar
        }
        SYS_SBRK => {
            let old = cpu.mem.sbrk(a1)?;
            cpu.regs.write(abi::REG_A0, old);
            costs.sbrk
        }
        SYS_READINT => {
            let value = cpu.console.read_int()?;
            cpu.regs.write(abi::REG_A0, value as u64);
            costs.readint
        }
        SYS_TIME => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs());
            cpu.regs.write(abi::REG_A0, now);
            costs.time
        }
        _ => return Err(SimError::UnsupportedSyscall { number }),
    };
    tracing::trace!(number, cycles, "syscall");
    Ok(SyscallOutcome::Continue { cycles })
}
