//! Memory System.
//!
//! Combines the page table (functional state) with the storage chain
//! (timing). Every timed access translates first, moves the bytes, then
//! charges latency by walking the instruction- or data-side chain with the
//! simulated physical address.
//!
//! Accesses that straddle a line of the smallest configured line size are
//! charged twice: once for the first byte and once for the last.

use std::fmt;
use std::io::BufRead;

use crate::common::addr::VirtAddr;
use crate::common::constants::{HEAP_START, PAGE_SIZE, STACK_TOP};
use crate::common::data::AccessType;
use crate::common::error::{Result, SimError};
use crate::config::Config;
use crate::core::units::cache::Cache;
use crate::isa::decode::is_compressed;

use super::page_table::PageTable;
use super::storage::StorageChain;

/// Guest memory plus the cache hierarchy that times it.
#[derive(Debug)]
pub struct MemorySystem {
    page_table: PageTable,
    chain: StorageChain,
    min_line_size: u64,
    heap_pointer: u64,
    heap_limit: u64,
    total_access_cycles: u64,
    access_count: u64,
}

impl MemorySystem {
    /// Builds the memory system for a validated configuration.
    ///
    /// # Errors
    ///
    /// [`SimError::Configuration`] if the cache chain cannot be resolved.
    pub fn new(config: &Config) -> Result<Self> {
        let chain = StorageChain::new(config)?;
        let min_line_size = chain.min_line_size(PAGE_SIZE);
        let stack_pages = config.stack_size.div_ceil(PAGE_SIZE / 1024);
        let heap_limit = STACK_TOP.saturating_sub(stack_pages.saturating_mul(PAGE_SIZE));
        Ok(Self {
            page_table: PageTable::new(),
            chain,
            min_line_size,
            heap_pointer: HEAP_START,
            heap_limit,
            total_access_cycles: 0,
            access_count: 0,
        })
    }

    /// Unmaps every page, invalidates every cache and rewinds the heap.
    pub fn reset(&mut self) {
        self.heap_pointer = HEAP_START;
        self.page_table.clear();
        self.chain.invalidate();
        self.total_access_cycles = 0;
        self.access_count = 0;
    }

    /// Maps the page containing `va`.
    pub fn page_alloc(&mut self, va: u64) {
        let _ = self.page_table.map(VirtAddr::new(va));
    }

    /// Number of mapped pages.
    pub fn mapped_pages(&self) -> usize {
        self.page_table.len()
    }

    /// Returns true if the page containing `va` is mapped.
    pub fn is_mapped(&self, va: u64) -> bool {
        self.page_table.is_mapped(VirtAddr::new(va))
    }

    /// Maps `[vaddr, vaddr + memsz)` and copies `bytes` to its start; the
    /// remainder stays zero.
    ///
    /// # Errors
    ///
    /// [`SimError::Loader`] if `bytes` is longer than `memsz`.
    pub fn load_segment(&mut self, vaddr: u64, memsz: u64, bytes: &[u8]) -> Result<()> {
        if bytes.len() as u64 > memsz {
            return Err(SimError::Loader(format!(
                "segment at {vaddr:#x} has {} file bytes but only {memsz} memory bytes",
                bytes.len()
            )));
        }
        self.page_table.map_range(VirtAddr::new(vaddr), memsz);
        self.page_table.write_bytes(VirtAddr::new(vaddr), bytes)
    }

    /// Untimed copy into already mapped memory.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] if any byte is unmapped.
    pub fn write_bytes(&mut self, va: u64, data: &[u8]) -> Result<()> {
        self.page_table.write_bytes(VirtAddr::new(va), data)
    }

    /// Writes `s` followed by a NUL byte.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] if any byte is unmapped.
    pub fn write_str(&mut self, va: u64, s: &str) -> Result<()> {
        self.write_bytes(va, s.as_bytes())?;
        self.write_bytes(va + s.len() as u64, &[0])
    }

    /// Untimed little-endian read of `bytes` bytes, for diagnostics and tests.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] if any byte is unmapped.
    pub fn peek(&self, va: u64, bytes: usize) -> Result<u64> {
        let mut buf = [0u8; 8];
        let len = bytes.min(8);
        self.page_table
            .read_bytes(VirtAddr::new(va), &mut buf[..len], AccessType::Read)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn translate(&self, va: u64, access: AccessType) -> Result<u64> {
        self.page_table
            .translate(VirtAddr::new(va), access)
            .map(|pa| pa.val())
    }

    /// Whether `[addr, addr + bytes)` crosses a line of the smallest size.
    #[inline]
    const fn crosses_line(&self, addr: u64, bytes: u64) -> bool {
        (addr & (self.min_line_size - 1)) > self.min_line_size.saturating_sub(bytes)
    }

    fn account(&mut self, cycles: u64) -> u64 {
        self.total_access_cycles += cycles;
        self.access_count += 1;
        cycles
    }

    /// Fetches the instruction at `pc`, returning `(word, cycles)`.
    ///
    /// A compressed instruction yields a word with the upper half zero and
    /// never touches `pc + 2`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] with [`AccessType::Fetch`].
    pub fn read_inst(&mut self, pc: u64) -> Result<(u32, u64)> {
        let mut low = [0u8; 2];
        self.page_table
            .read_bytes(VirtAddr::new(pc), &mut low, AccessType::Fetch)?;
        let mut word = u32::from(u16::from_le_bytes(low));
        let compressed = is_compressed(word);

        if !compressed {
            let mut high = [0u8; 2];
            self.page_table
                .read_bytes(VirtAddr::new(pc + 2), &mut high, AccessType::Fetch)?;
            word |= u32::from(u16::from_le_bytes(high)) << 16;
        }

        let entry = self.chain.instruction_entry();
        let pa = self.translate(pc, AccessType::Fetch)?;
        let mut cycles = self.chain.read(entry, pa);
        if !compressed && self.crosses_line(pc, 4) {
            let pa = self.translate(pc + 2, AccessType::Fetch)?;
            cycles += self.chain.read(entry, pa);
        }
        Ok((word, self.account(cycles)))
    }

    /// Loads `bytes` (1, 2, 4 or 8) little-endian bytes at `addr`,
    /// zero-extended; returns `(value, cycles)`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] with [`AccessType::Read`].
    pub fn read_data(&mut self, addr: u64, bytes: u64) -> Result<(u64, u64)> {
        let value = self.peek(addr, bytes as usize)?;

        let entry = self.chain.data_entry();
        let pa = self.translate(addr, AccessType::Read)?;
        let mut cycles = self.chain.read(entry, pa);
        if self.crosses_line(addr, bytes) {
            let pa = self.translate(addr + bytes - 1, AccessType::Read)?;
            cycles += self.chain.read(entry, pa);
        }
        Ok((value, self.account(cycles)))
    }

    /// Stores the low `bytes` bytes of `value` at `addr`; returns the cycles.
    ///
    /// Nothing is written unless every byte of the store is mapped.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] with [`AccessType::Write`].
    pub fn write_data(&mut self, addr: u64, value: u64, bytes: u64) -> Result<u64> {
        let len = bytes.clamp(1, 8);
        let first = self.translate(addr, AccessType::Write)?;
        let last = addr
            .checked_add(len - 1)
            .ok_or(SimError::UnmappedAddress {
                addr,
                access: AccessType::Write,
            })?;
        let _ = self.translate(last, AccessType::Write)?;
        self.page_table
            .write_bytes(VirtAddr::new(addr), &value.to_le_bytes()[..len as usize])?;

        let entry = self.chain.data_entry();
        let mut cycles = self.chain.write(entry, first);
        if self.crosses_line(addr, len) {
            let pa = self.translate(last, AccessType::Write)?;
            cycles += self.chain.write(entry, pa);
        }
        Ok(self.account(cycles))
    }

    /// Grows the heap by `size` bytes and returns the previous break.
    ///
    /// The break never shrinks.
    ///
    /// # Errors
    ///
    /// [`SimError::HeapExhausted`] if the new break would overflow or run
    /// into the stack; the heap is left unchanged.
    pub fn sbrk(&mut self, size: u64) -> Result<u64> {
        let old = self.heap_pointer;
        let brk = old
            .checked_add(size)
            .filter(|&brk| brk <= self.heap_limit)
            .ok_or(SimError::HeapExhausted { brk: old, size })?;
        self.page_table.map_range(VirtAddr::new(old), size);
        self.heap_pointer = brk;
        Ok(old)
    }

    /// Bytes handed out by `sbrk` since the last reset.
    pub const fn heap_size(&self) -> u64 {
        self.heap_pointer - HEAP_START
    }

    /// Timed accesses since the last reset.
    pub const fn access_count(&self) -> u64 {
        self.access_count
    }

    /// Average memory access time in cycles, 0 before the first access.
    pub fn amat(&self) -> f64 {
        if self.access_count == 0 {
            0.0
        } else {
            self.total_access_cycles as f64 / self.access_count as f64
        }
    }

    /// Caches in configuration order.
    pub fn caches(&self) -> impl Iterator<Item = &Cache> {
        self.chain.caches()
    }

    /// Resets, then replays a `r|w <addr>` trace through the data chain.
    ///
    /// Trace addresses are used as-is, without translation. Blank lines are
    /// skipped; addresses may be decimal or `0x`-prefixed hex.
    ///
    /// # Errors
    ///
    /// [`SimError::Trace`] naming the first malformed line, or
    /// [`SimError::Io`] if reading fails.
    pub fn run_trace<R: BufRead>(&mut self, reader: R) -> Result<()> {
        self.reset();
        let entry = self.chain.data_entry();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            let mut fields = line.split_whitespace();
            let Some(action) = fields.next() else {
                continue;
            };
            let trace_err = |reason: String| SimError::Trace {
                line: lineno,
                reason,
            };
            let addr_str = fields
                .next()
                .ok_or_else(|| trace_err("missing address".to_owned()))?;
            let addr = parse_addr(addr_str)
                .ok_or_else(|| trace_err(format!("invalid address: {addr_str}")))?;

            let cycles = match action {
                "r" => self.chain.read(entry, addr),
                "w" => self.chain.write(entry, addr),
                other => return Err(trace_err(format!("invalid action: {other}"))),
            };
            let _ = self.account(cycles);
        }
        tracing::info!(accesses = self.access_count, "trace replayed");
        Ok(())
    }

    /// Heap, AMAT and per-cache summary.
    pub const fn report(&self) -> MemoryReport<'_> {
        MemoryReport(self)
    }
}

/// Decimal or `0x`-prefixed hexadecimal address.
fn parse_addr(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Display adapter for [`MemorySystem::report`].
#[derive(Debug)]
pub struct MemoryReport<'a>(&'a MemorySystem);

impl fmt::Display for MemoryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mem = self.0;
        let heap = mem.heap_size();
        writeln!(f, "heap_size: {heap:#x}({heap}) bytes")?;
        writeln!(f, "AMAT: {:.2} cycles", mem.amat())?;
        for cache in mem.caches() {
            writeln!(f, "{cache}")?;
        }
        Ok(())
    }
}
