//! Cache hierarchy behaviour, driven through trace replay.

use std::fs::File;
use std::io::{BufReader, Cursor, Write};

use pretty_assertions::assert_eq;

use rvpipe_core::SimError;
use rvpipe_core::config::{CacheConfig, Config};
use rvpipe_core::core::units::cache::{Cache, CacheStats};
use rvpipe_core::memory::MemorySystem;

fn level(name: &str, size: u64, ways: u64, hit: u64, next: &str) -> CacheConfig {
    CacheConfig {
        name: name.into(),
        size,
        associativity: ways,
        cache_line_bytes: 64,
        write_back: true,
        write_allocate: true,
        hit_cycles: hit,
        cache_for: next.into(),
        instruction_entry: false,
        data_entry: false,
    }
}

fn two_level() -> Config {
    let mut l1 = level("L1", 1, 2, 1, "L2");
    l1.data_entry = true;
    Config {
        memory_cycles: 100,
        cache: vec![l1, level("L2", 8, 4, 10, "memory")],
        ..Config::default()
    }
}

fn stats(mem: &MemorySystem) -> Vec<CacheStats> {
    mem.caches().map(Cache::stats).collect()
}

#[test]
fn misses_fill_every_level() {
    let mut mem = MemorySystem::new(&two_level()).unwrap();
    mem.run_trace(Cursor::new("r 0x1000\nr 0x1008\n")).unwrap();
    let s = stats(&mem);
    assert_eq!((s[0].hits, s[0].misses), (1, 1));
    assert_eq!((s[1].hits, s[1].misses), (0, 1));
    // (1 + 10 + 100) + 1
    assert!((mem.amat() - 56.0).abs() < 1e-9);
}

#[test]
fn lru_evicts_the_oldest_way() {
    // L1: 1 KiB, 2 ways, 64-byte lines: 8 sets, same set every 512 bytes
    let mut mem = MemorySystem::new(&two_level()).unwrap();
    let trace = "r 0x0\nr 0x200\nr 0x0\nr 0x400\nr 0x0\nr 0x200\n";
    mem.run_trace(Cursor::new(trace)).unwrap();
    let l1 = stats(&mem)[0];
    // 0x0 stays resident; 0x200 was evicted by 0x400
    assert_eq!((l1.hits, l1.misses), (2, 4));
}

#[test]
fn dirty_victims_are_written_to_the_next_level() {
    let mut mem = MemorySystem::new(&two_level()).unwrap();
    mem.run_trace(Cursor::new("w 0x0\nw 0x200\nr 0x400\n")).unwrap();
    let l2 = stats(&mem)[1];
    // three fills plus the write-back of 0x0 (hits its L2 line)
    assert_eq!((l2.hits, l2.misses), (1, 3));
}

#[test]
fn replay_is_deterministic_and_resets_first() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..512u64 {
        let action = if i % 3 == 0 { 'w' } else { 'r' };
        writeln!(file, "{action} {}", (i * 136) % 20_000).unwrap();
    }
    writeln!(file).unwrap();
    file.flush().unwrap();

    let mut mem = MemorySystem::new(&two_level()).unwrap();
    let replay = |mem: &mut MemorySystem| {
        let reader = BufReader::new(File::open(file.path()).unwrap());
        mem.run_trace(reader).unwrap();
        (stats(mem), mem.access_count(), mem.report().to_string())
    };
    let first = replay(&mut mem);
    let second = replay(&mut mem);
    assert_eq!(first, second);
    assert_eq!(first.1, 512);
}

#[test]
fn malformed_lines_name_their_line_number() {
    let mut mem = MemorySystem::new(&two_level()).unwrap();
    let err = mem
        .run_trace(Cursor::new("r 0x10\n\nx 0x20\n"))
        .unwrap_err();
    match err {
        SimError::Trace { line, reason } => {
            assert_eq!(line, 3);
            assert!(reason.contains("invalid action"), "{reason}");
        }
        other => panic!("unexpected error {other}"),
    }

    let err = mem.run_trace(Cursor::new("r\n")).unwrap_err();
    assert!(matches!(err, SimError::Trace { line: 1, .. }));
    let err = mem.run_trace(Cursor::new("w 0xnope\n")).unwrap_err();
    assert!(matches!(err, SimError::Trace { line: 1, .. }));
}

#[test]
fn report_lists_each_cache() {
    let mut mem = MemorySystem::new(&two_level()).unwrap();
    mem.run_trace(Cursor::new("r 0x40\n")).unwrap();
    let report = mem.report().to_string();
    assert!(report.contains("L1: hit=0"), "{report}");
    assert!(report.contains("miss_rate=100.000%"), "{report}");
    assert!(report.contains("AMAT: 111.00 cycles"), "{report}");
}
