//! Set-Associative Cache Timing Model.
//!
//! Tracks tags only; data always lives in the page table. Each access
//! updates the line array and returns a [`CacheAccess`] telling the caller
//! which follow-up requests the next storage level must serve. The caller
//! (the storage chain) issues them in order and sums the cycles.
//!
//! Replacement is least-recently-used by a per-cache access clock. An
//! invalid way is always preferred over evicting a valid one.

use std::fmt;

use crate::config::CacheConfig;

/// Cache line entry containing tag, validity, dirty bit and last-use time.
#[derive(Clone, Copy, Debug, Default)]
struct CacheLine {
    tag: u64,
    valid: bool,
    dirty: bool,
    timestamp: u64,
}

/// Request forwarded to the next level after this level is updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Forward {
    /// Fetch the missed line.
    Read(u64),
    /// Propagate a write (write-through hit or no-allocate miss).
    Write(u64),
}

/// Outcome of one cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheAccess {
    /// Whether the tag was present.
    pub hit: bool,
    /// Cycles charged by this level alone.
    pub cycles: u64,
    /// Address of a dirty victim to write to the next level first.
    pub writeback: Option<u64>,
    /// Follow-up request to the next level.
    pub forward: Option<Forward>,
}

/// Hit and miss counters of one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Accesses that found their tag.
    pub hits: u64,
    /// Accesses that did not.
    pub misses: u64,
}

impl CacheStats {
    /// Miss ratio in percent, 0 when the cache was never accessed.
    pub fn miss_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64 * 100.0
        }
    }
}

/// Set-associative cache with write-back/write-through and
/// write-allocate/no-write-allocate policies.
#[derive(Clone, Debug)]
pub struct Cache {
    name: String,
    lines: Vec<CacheLine>,
    num_sets: u64,
    ways: usize,
    /// log2 of the line size.
    offset_bits: u32,
    /// log2 of the set count.
    set_bits: u32,
    write_back: bool,
    write_allocate: bool,
    hit_cycles: u64,
    /// Access clock for LRU; bumped on every access.
    time: u64,
    stats: CacheStats,
}

impl Cache {
    /// Creates an empty cache from a validated configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let num_sets = config.num_sets().max(1);
        let ways = usize::try_from(config.associativity.max(1)).unwrap_or(1);
        let total = usize::try_from(num_sets).unwrap_or(1) * ways;

        Self {
            name: config.name.clone(),
            lines: vec![CacheLine::default(); total],
            num_sets,
            ways,
            offset_bits: config.cache_line_bytes.max(1).trailing_zeros(),
            set_bits: num_sets.trailing_zeros(),
            write_back: config.write_back,
            write_allocate: config.write_allocate,
            hit_cycles: config.hit_cycles,
            time: 0,
            stats: CacheStats::default(),
        }
    }

    /// Configured level name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line size in bytes.
    pub const fn line_size(&self) -> u64 {
        1 << self.offset_bits
    }

    /// Hit and miss counters since the last invalidate.
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    #[inline]
    const fn set_index(&self, addr: u64) -> usize {
        ((addr >> self.offset_bits) & (self.num_sets - 1)) as usize
    }

    #[inline]
    const fn tag(&self, addr: u64) -> u64 {
        addr >> (self.offset_bits + self.set_bits)
    }

    /// Rebuilds the line address of `tag` in the set that `addr` maps to.
    #[inline]
    const fn victim_addr(&self, tag: u64, addr: u64) -> u64 {
        (tag << (self.offset_bits + self.set_bits))
            | (addr & ((self.num_sets - 1) << self.offset_bits))
    }

    /// Way holding `tag`, else the way to evict.
    fn lookup(&self, set: usize, tag: u64) -> (usize, bool) {
        let base = set * self.ways;
        let ways = &self.lines[base..base + self.ways];
        if let Some(way) = ways.iter().position(|l| l.valid && l.tag == tag) {
            return (base + way, true);
        }
        let victim = ways
            .iter()
            .position(|l| !l.valid)
            .or_else(|| {
                ways.iter()
                    .enumerate()
                    .min_by_key(|(_, l)| l.timestamp)
                    .map(|(way, _)| way)
            })
            .unwrap_or(0);
        (base + victim, false)
    }

    /// Fills `idx` with `tag`, returning the dirty victim's address if it
    /// must be written back.
    fn fill(&mut self, idx: usize, tag: u64, addr: u64, dirty: bool) -> Option<u64> {
        let old = self.lines[idx];
        let writeback = (self.write_back && old.valid && old.dirty)
            .then(|| self.victim_addr(old.tag, addr));
        if let Some(wb) = writeback {
            tracing::trace!(cache = %self.name, addr = format_args!("{wb:#x}"), "dirty eviction");
        }
        self.lines[idx] = CacheLine {
            tag,
            valid: true,
            dirty,
            timestamp: self.time,
        };
        writeback
    }

    /// Reads `addr`.
    pub fn read(&mut self, addr: u64) -> CacheAccess {
        self.time += 1;
        let tag = self.tag(addr);
        let (idx, hit) = self.lookup(self.set_index(addr), tag);

        if hit {
            self.stats.hits += 1;
            self.lines[idx].timestamp = self.time;
            return CacheAccess {
                hit,
                cycles: self.hit_cycles,
                writeback: None,
                forward: None,
            };
        }

        self.stats.misses += 1;
        CacheAccess {
            hit,
            cycles: self.hit_cycles,
            writeback: self.fill(idx, tag, addr, false),
            forward: Some(Forward::Read(addr)),
        }
    }

    /// Writes `addr`.
    pub fn write(&mut self, addr: u64) -> CacheAccess {
        self.time += 1;
        let tag = self.tag(addr);
        let (idx, hit) = self.lookup(self.set_index(addr), tag);

        if hit {
            self.stats.hits += 1;
            let line = &mut self.lines[idx];
            line.dirty = true;
            line.timestamp = self.time;
            return CacheAccess {
                hit,
                cycles: self.hit_cycles,
                writeback: None,
                forward: (!self.write_back).then_some(Forward::Write(addr)),
            };
        }

        self.stats.misses += 1;
        if !self.write_allocate {
            return CacheAccess {
                hit,
                cycles: 0,
                writeback: None,
                forward: Some(Forward::Write(addr)),
            };
        }
        CacheAccess {
            hit,
            cycles: self.hit_cycles,
            writeback: self.fill(idx, tag, addr, true),
            forward: Some(Forward::Read(addr)),
        }
    }

    /// Drops every line and clears the counters.
    pub fn invalidate(&mut self) {
        self.lines.fill(CacheLine::default());
        self.stats = CacheStats::default();
        self.time = 0;
    }
}

impl fmt::Display for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>20}: hit={:<10} miss={:<10} miss_rate={:.3}%",
            self.name,
            self.stats.hits,
            self.stats.misses,
            self.stats.miss_rate()
        )
    }
}
