//! Storage Chain.
//!
//! Caches are kept in an arena in configuration order; each level names its
//! successor through a [`Storage`] handle that is either another arena slot
//! or main memory. The chain is resolved once from the configuration and
//! never changes during a run.

use std::collections::HashMap;

use crate::common::error::{Result, SimError};
use crate::config::{Config, MEMORY_LEVEL_NAME};
use crate::core::units::cache::{Cache, Forward};

/// Handle to one storage level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    /// Index into the cache arena.
    Cache(usize),
    /// Main memory, the end of every chain.
    Memory,
}

/// Fixed-latency backing store.
#[derive(Clone, Copy, Debug)]
pub struct MainMemory {
    /// Cycles charged for every read or write.
    pub cycles: u64,
}

impl MainMemory {
    /// Creates main memory with a fixed access latency.
    pub const fn new(cycles: u64) -> Self {
        Self { cycles }
    }
}

#[derive(Debug)]
struct Level {
    cache: Cache,
    next: Storage,
}

/// Every cache level plus main memory, with the two entry points.
#[derive(Debug)]
pub struct StorageChain {
    levels: Vec<Level>,
    memory: MainMemory,
    instruction_entry: Storage,
    data_entry: Storage,
}

impl StorageChain {
    /// Builds the chain described by `config`.
    ///
    /// Without any entry flag set, that side goes straight to memory.
    ///
    /// # Errors
    ///
    /// [`SimError::Configuration`] when a `cache_for` names no known level.
    /// Call [`Config::validate`] first to also reject cycles.
    pub fn new(config: &Config) -> Result<Self> {
        let index: HashMap<&str, usize> = config
            .cache
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), i))
            .collect();

        let mut levels = Vec::with_capacity(config.cache.len());
        let mut instruction_entry = Storage::Memory;
        let mut data_entry = Storage::Memory;

        for (i, c) in config.cache.iter().enumerate() {
            let next = if c.cache_for == MEMORY_LEVEL_NAME {
                Storage::Memory
            } else {
                index
                    .get(c.cache_for.as_str())
                    .map(|&n| Storage::Cache(n))
                    .ok_or_else(|| {
                        SimError::Configuration(format!(
                            "cache {} names unknown next level {}",
                            c.name, c.cache_for
                        ))
                    })?
            };
            if c.instruction_entry {
                instruction_entry = Storage::Cache(i);
            }
            if c.data_entry {
                data_entry = Storage::Cache(i);
            }
            levels.push(Level {
                cache: Cache::new(c),
                next,
            });
        }

        Ok(Self {
            levels,
            memory: MainMemory::new(config.memory_cycles),
            instruction_entry,
            data_entry,
        })
    }

    /// First level for instruction fetches.
    pub const fn instruction_entry(&self) -> Storage {
        self.instruction_entry
    }

    /// First level for loads and stores.
    pub const fn data_entry(&self) -> Storage {
        self.data_entry
    }

    /// Smallest line size of any level, capped at `cap`.
    pub fn min_line_size(&self, cap: u64) -> u64 {
        self.levels
            .iter()
            .map(|l| l.cache.line_size())
            .fold(cap, u64::min)
    }

    /// Charges a read of `addr` starting at `at`.
    pub fn read(&mut self, at: Storage, addr: u64) -> u64 {
        self.access(at, Forward::Read(addr))
    }

    /// Charges a write of `addr` starting at `at`.
    pub fn write(&mut self, at: Storage, addr: u64) -> u64 {
        self.access(at, Forward::Write(addr))
    }

    fn access(&mut self, at: Storage, req: Forward) -> u64 {
        let Storage::Cache(idx) = at else {
            return self.memory.cycles;
        };
        let Some(level) = self.levels.get_mut(idx) else {
            return self.memory.cycles;
        };

        let outcome = match req {
            Forward::Read(addr) => level.cache.read(addr),
            Forward::Write(addr) => level.cache.write(addr),
        };
        let next = level.next;

        let mut cycles = outcome.cycles;
        if let Some(victim) = outcome.writeback {
            cycles += self.access(next, Forward::Write(victim));
        }
        if let Some(follow) = outcome.forward {
            cycles += self.access(next, follow);
        }
        cycles
    }

    /// Invalidates every cache and clears its counters.
    pub fn invalidate(&mut self) {
        for level in &mut self.levels {
            level.cache.invalidate();
        }
    }

    /// Caches in configuration order.
    pub fn caches(&self) -> impl Iterator<Item = &Cache> {
        self.levels.iter().map(|l| &l.cache)
    }
}
