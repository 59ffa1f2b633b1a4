//! Timed guest memory: translation, straddling accesses and the heap.

use pretty_assertions::assert_eq;
use rstest::rstest;

use rvpipe_core::SimError;
use rvpipe_core::common::AccessType;
use rvpipe_core::common::constants::{HEAP_START, PAGE_SIZE, STACK_TOP};
use rvpipe_core::config::{CacheConfig, Config};
use rvpipe_core::memory::MemorySystem;

const BASE: u64 = 0x4_0000;

fn l1(line: u64) -> CacheConfig {
    CacheConfig {
        name: "L1".into(),
        size: 4,
        associativity: 2,
        cache_line_bytes: line,
        write_back: true,
        write_allocate: true,
        hit_cycles: 1,
        cache_for: "memory".into(),
        instruction_entry: true,
        data_entry: true,
    }
}

fn flat() -> MemorySystem {
    let mut mem = MemorySystem::new(&Config::default()).unwrap();
    mem.load_segment(BASE, 2 * PAGE_SIZE, &[]).unwrap();
    mem
}

fn cached() -> MemorySystem {
    let config = Config {
        cache: vec![l1(64)],
        ..Config::default()
    };
    let mut mem = MemorySystem::new(&config).unwrap();
    mem.load_segment(BASE, 2 * PAGE_SIZE, &[]).unwrap();
    mem
}

#[rstest]
#[case(1, 0xEF)]
#[case(2, 0xBEEF)]
#[case(4, 0xDEAD_BEEF)]
#[case(8, 0x0123_4567_DEAD_BEEF)]
fn narrow_accesses_zero_extend(#[case] bytes: u64, #[case] expected: u64) {
    let mut mem = flat();
    let _ = mem.write_data(BASE, 0x0123_4567_DEAD_BEEF, 8).unwrap();
    let (value, _) = mem.read_data(BASE, bytes).unwrap();
    assert_eq!(value, expected);
}

#[test]
fn narrow_store_leaves_neighbours() {
    let mut mem = flat();
    let _ = mem.write_data(BASE, u64::MAX, 8).unwrap();
    let _ = mem.write_data(BASE + 2, 0, 2).unwrap();
    assert_eq!(mem.peek(BASE, 8).unwrap(), 0xFFFF_FFFF_0000_FFFF);
}

#[test]
fn without_caches_every_access_costs_main_memory() {
    let mut mem = flat();
    let memory = Config::default().memory_cycles;
    assert_eq!(mem.read_data(BASE, 8).unwrap().1, memory);
    assert_eq!(mem.write_data(BASE, 1, 4).unwrap(), memory);
    assert_eq!(mem.access_count(), 2);
    assert!((mem.amat() - memory as f64).abs() < f64::EPSILON);
}

#[test]
fn page_straddle_is_charged_twice() {
    let mut mem = flat();
    let memory = Config::default().memory_cycles;
    let addr = BASE + PAGE_SIZE - 4;
    assert_eq!(mem.write_data(addr, 0x1122_3344_5566_7788, 8).unwrap(), 2 * memory);
    let (value, cycles) = mem.read_data(addr, 8).unwrap();
    assert_eq!(value, 0x1122_3344_5566_7788);
    assert_eq!(cycles, 2 * memory);
}

#[test]
fn line_straddle_is_charged_per_line() {
    let mut mem = cached();
    let memory = Config::default().memory_cycles;
    // both lines miss
    assert_eq!(mem.read_data(BASE + 60, 8).unwrap().1, 2 * (1 + memory));
    // both lines now hit
    assert_eq!(mem.read_data(BASE + 60, 8).unwrap().1, 2);
    // aligned inside one line
    assert_eq!(mem.read_data(BASE + 56, 8).unwrap().1, 1);
}

#[test]
fn second_access_to_a_line_hits() {
    let mut mem = cached();
    let memory = Config::default().memory_cycles;
    assert_eq!(mem.read_data(BASE + 8, 4).unwrap().1, 1 + memory);
    assert_eq!(mem.write_data(BASE + 16, 7, 4).unwrap(), 1);
    let stats = mem.caches().next().unwrap().stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[test]
fn compressed_fetch_reads_one_halfword() {
    let mut mem = flat();
    // c.li a0, 1 on the last halfword of the mapped range
    let last = BASE + 2 * PAGE_SIZE - 2;
    mem.write_bytes(last, &0x4505u16.to_le_bytes()).unwrap();
    let (word, _) = mem.read_inst(last).unwrap();
    assert_eq!(word, 0x4505);
}

#[test]
fn full_width_fetch_across_the_mapping_faults() {
    let mut mem = flat();
    let last = BASE + 2 * PAGE_SIZE - 2;
    mem.write_bytes(last, &0x0013u16.to_le_bytes()).unwrap();
    let err = mem.read_inst(last).unwrap_err();
    assert!(matches!(
        err,
        SimError::UnmappedAddress { access: AccessType::Fetch, .. }
    ));
}

#[rstest]
#[case::load(AccessType::Read)]
#[case::store(AccessType::Write)]
fn unmapped_data_access_is_an_error(#[case] access: AccessType) {
    let mut mem = flat();
    let err = match access {
        AccessType::Write => mem.write_data(0x10, 1, 8).unwrap_err(),
        _ => mem.read_data(0x10, 8).unwrap_err(),
    };
    match err {
        SimError::UnmappedAddress { addr, access: got } => {
            assert_eq!(addr, 0x10);
            assert_eq!(got, access);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn sbrk_maps_and_returns_the_old_break() {
    let mut mem = flat();
    assert_eq!(mem.sbrk(0x2000).unwrap(), HEAP_START);
    assert_eq!(mem.sbrk(16).unwrap(), HEAP_START + 0x2000);
    assert_eq!(mem.heap_size(), 0x2010);
    let _ = mem.write_data(HEAP_START + 0x2008, 42, 8).unwrap();
    assert_eq!(mem.peek(HEAP_START + 0x2008, 8).unwrap(), 42);
    assert!(mem.report().to_string().starts_with("heap_size: 0x2010(8208) bytes"));
}

#[rstest]
#[case::wraps_around(u64::MAX - 15)]
#[case::negative_increment(-16i64 as u64)]
#[case::into_the_stack(STACK_TOP - HEAP_START)]
fn sbrk_that_does_not_fit_leaves_the_heap_alone(#[case] size: u64) {
    let mut mem = flat();
    let _ = mem.sbrk(32).unwrap();
    let pages = mem.mapped_pages();

    match mem.sbrk(size) {
        Err(SimError::HeapExhausted { brk, size: got }) => {
            assert_eq!(brk, HEAP_START + 32);
            assert_eq!(got, size);
        }
        other => panic!("expected HeapExhausted, got {other:?}"),
    }
    assert_eq!(mem.heap_size(), 32);
    assert_eq!(mem.mapped_pages(), pages);
    assert_eq!(mem.sbrk(8).unwrap(), HEAP_START + 32);
}

#[test]
fn store_straddling_into_an_unmapped_page_writes_nothing() {
    let mut mem = flat();
    let end = BASE + 2 * PAGE_SIZE;
    match mem.write_data(end - 4, 0x1122_3344_5566_7788, 8) {
        Err(SimError::UnmappedAddress { addr, access }) => {
            assert_eq!(addr, end + 3);
            assert_eq!(access, AccessType::Write);
        }
        other => panic!("expected UnmappedAddress, got {other:?}"),
    }
    assert_eq!(mem.peek(end - 4, 4).unwrap(), 0);
    assert_eq!(mem.access_count(), 0);
}

#[test]
fn reset_unmaps_and_rewinds() {
    let mut mem = flat();
    let _ = mem.sbrk(8).unwrap();
    mem.reset();
    assert!(!mem.is_mapped(BASE));
    assert_eq!(mem.heap_size(), 0);
    assert_eq!(mem.access_count(), 0);
}

#[test]
fn segment_longer_than_its_memory_is_rejected() {
    let mut mem = MemorySystem::new(&Config::default()).unwrap();
    assert!(matches!(
        mem.load_segment(BASE, 2, &[1, 2, 3]),
        Err(SimError::Loader(_))
    ));
}

#[test]
fn segment_tail_is_zero_filled() {
    let mut mem = MemorySystem::new(&Config::default()).unwrap();
    mem.load_segment(BASE, 64, &[0xAA; 4]).unwrap();
    assert_eq!(mem.peek(BASE, 8).unwrap(), 0xAAAA_AAAA);
    assert_eq!(mem.peek(BASE + 56, 8).unwrap(), 0);
}
