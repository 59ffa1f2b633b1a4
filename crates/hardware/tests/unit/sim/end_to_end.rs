//! Whole programs through the simulator, including fatal-error reporting.

use pretty_assertions::assert_eq;

use rvpipe_core::common::AccessType;
use rvpipe_core::config::Config;
use rvpipe_core::sim::simulator::USER_OUTPUT_BANNER;
use rvpipe_core::{RunOutcome, SimError, Stage};

use crate::common::builder::instruction::{InstructionBuilder as I, c_add, c_addi, c_li, c_mv};
use crate::common::harness::{CODE_BASE, TestContext};

const A0: u32 = 10;
const A1: u32 = 11;

#[test]
fn add_two_immediates() {
    let program = [
        I::new().addi(A0, 0, 3).build(),
        I::new().addi(A1, 0, 5).build(),
        I::new().add(A0, A0, A1).build(),
        I::new().ecall().build(),
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    assert_eq!(tc.run().unwrap(), 8);

    let stats = tc.stats();
    assert_eq!(stats.instructions, 4);
    assert_eq!(stats.total_branch, 0);
    assert!(stats.cycles > 0);
    assert!(stats.cpi() >= 1.0);
}

#[test]
fn mixed_width_program() {
    let program = [
        c_li(A0, 5),                          // +0
        I::new().addi(A0, A0, 1).build(),     // +2
        c_addi(A0, 3),                        // +6
        c_mv(A1, A0),                         // +8
        c_add(A0, A1),                        // +10
        I::new().ecall().build(),             // +12
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    assert_eq!(tc.run().unwrap(), 18);
    assert_eq!(tc.stats().instructions, 6);
}

#[test]
fn word_arithmetic_sign_extends() {
    let program = [
        I::new().lui(A0, 0x7FFF_F000_u32 as i32).build(),
        I::new().addiw(A0, A0, 0x7FF).build(),
        I::new().addiw(A0, A0, 0x7FF).build(),
        I::new().addiw(A0, A0, 0x7FF).build(),
        I::new().ecall().build(),
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    // the third add carries past i32::MAX
    assert_eq!(tc.run().unwrap(), 0xFFFF_FFFF_8000_07FD);
}

#[test]
fn unmapped_load_is_reported_in_memory() {
    let program = [
        I::new().addi(A0, 0, 1).build(),
        I::new().ld(A1, 0, 0x40).build(),
        I::new().ecall().build(),
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    let err = tc.run().unwrap_err();
    assert_eq!(err.stage, Stage::Memory);
    assert_eq!(err.pc, CODE_BASE + 4);
    assert!(matches!(
        err.source,
        SimError::UnmappedAddress { addr: 0x40, access: AccessType::Read }
    ));

    let summary = tc.sim.failure_summary(&err);
    assert!(summary.starts_with(USER_OUTPUT_BANNER), "{summary}");
    assert!(summary.contains("runtime_error in MEM: invalid read address: 0x40"), "{summary}");
    assert!(summary.contains("MM: 0x10004: ld a1, 64(zero)"), "{summary}");
    assert!(summary.contains("AMAT:"), "{summary}");
}

#[test]
fn undecodable_word_faults_only_when_executed() {
    let program = [
        I::new().addi(A0, 0, 1).build(),
        0xFFFF_FFFF,
        I::new().ecall().build(),
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    let err = tc.run().unwrap_err();
    assert_eq!(err.stage, Stage::Decode);
    assert_eq!(err.pc, CODE_BASE + 4);
    assert!(matches!(err.source, SimError::Decode { bits: 0xFFFF_FFFF, .. }));
}

#[test]
fn undecodable_word_on_a_skipped_path_is_harmless() {
    let program = [
        I::new().jal(0, 8).build(),
        0xFFFF_FFFF,
        I::new().addi(A0, 0, 4).build(),
        I::new().ecall().build(),
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    assert_eq!(tc.run().unwrap(), 4);
}

#[test]
fn jump_to_unmapped_code_faults_at_the_target() {
    let program = [I::new().jalr(0, 0, 0x100).build()];
    let mut tc = TestContext::new().load_program(&program);
    let err = tc.run().unwrap_err();
    assert_eq!(err.stage, Stage::Fetch);
    assert_eq!(err.pc, 0x100);
    assert!(matches!(
        err.source,
        SimError::UnmappedAddress { addr: 0x100, access: AccessType::Fetch }
    ));
}

#[test]
fn exit_summary_reports_the_run() {
    let program = [I::new().addi(A0, 0, 7).build(), I::new().ecall().build()];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    let code = tc.run().unwrap();
    let summary = tc.sim.exit_summary(code);
    assert!(summary.starts_with(USER_OUTPUT_BANNER));
    assert!(summary.contains("program exited 7 in 0 seconds"), "{summary}");
    assert!(summary.contains("instructions=2 "), "{summary}");
    assert!(summary.contains("branch (2-bit branch history table)"), "{summary}");
    assert!(summary.contains("heap_size: 0x0(0) bytes"), "{summary}");
}

#[test]
fn stepping_reports_running_until_exit() {
    let program = [I::new().ecall().build()];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    assert_eq!(tc.run_ticks(4).unwrap(), RunOutcome::Running);
    assert_eq!(tc.cpu().tick_count, 4);
    assert_eq!(tc.run_ticks(10).unwrap(), RunOutcome::Exited { code: 0 });
    assert_eq!(tc.cpu().tick_count, 4);
}

#[test]
fn reloading_starts_from_a_clean_machine() {
    let program = [I::new().addi(A0, 0, 9).build(), I::new().ecall().build()];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    let _ = tc.run().unwrap();
    let first = tc.stats().clone();

    let mut tc = tc.load_program(&program).exit_on_ecall();
    assert_eq!(tc.stats().instructions, 0);
    assert_eq!(tc.get_reg(A0 as usize), 0);
    let _ = tc.run().unwrap();
    assert_eq!(*tc.stats(), first);
}

#[test]
fn caches_change_cycles_but_not_results() {
    let program = [
        I::new().addi(5, 0, 20).build(),
        I::new().addi(A0, A0, 3).build(),
        I::new().addi(5, 5, -1).build(),
        I::new().bne(5, 0, -8).build(),
        I::new().ecall().build(),
    ];
    let cached = Config::from_json(
        r#"{ "cache": [
            { "name": "L1", "size": 4, "associativity": 2, "hit_cycles": 1,
              "cache_for": "memory", "instruction_entry": true, "data_entry": true }
        ] }"#,
    )
    .unwrap();

    let mut flat = TestContext::new().load_program(&program).exit_on_ecall();
    let mut fast = TestContext::with_config(&cached).load_program(&program).exit_on_ecall();
    assert_eq!(flat.run().unwrap(), 60);
    assert_eq!(fast.run().unwrap(), 60);
    assert_eq!(flat.stats().instructions, fast.stats().instructions);
    assert!(fast.stats().cycles < flat.stats().cycles / 4);
    assert!(fast.cpu().mem.amat() < 10.0);
}
