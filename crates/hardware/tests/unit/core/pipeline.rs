//! Pipeline timing: hazards, forwarding, branch recovery and jumps.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use rvpipe_core::config::{BranchPredictorKind, Config};
use rvpipe_core::core::units::alu::{Alu, AluOp};
use rvpipe_core::isa::abi;

use crate::common::builder::instruction::InstructionBuilder as I;
use crate::common::harness::{CODE_BASE, TestContext};

const T0: u32 = 5;
const T1: u32 = 6;
const T2: u32 = 7;
const A0: u32 = 10;

fn run(config: &Config, program: &[u32]) -> TestContext {
    let mut tc = TestContext::with_config(config)
        .load_program(program)
        .exit_on_ecall();
    let _ = tc.run().unwrap();
    tc
}

fn no_forwarding() -> Config {
    Config {
        data_forwarding: false,
        ..Config::default()
    }
}

fn with_predictor(kind: BranchPredictorKind) -> Config {
    Config {
        branch_predictor: kind,
        ..Config::default()
    }
}

#[test]
fn load_use_costs_one_stall() {
    let dependent = [
        I::new().ld(T0, abi::REG_SP as u32, 0).build(),
        I::new().add(T1, T0, T0).build(),
        I::new().ecall().build(),
    ];
    let independent = [
        I::new().ld(T0, abi::REG_SP as u32, 0).build(),
        I::new().add(T1, T2, T2).build(),
        I::new().ecall().build(),
    ];
    let config = Config::default();
    let a = run(&config, &dependent);
    let b = run(&config, &independent);

    assert_eq!(
        a.stats().data_dependent_time,
        b.stats().data_dependent_time + 1
    );
    assert_eq!(a.sim.cpu.tick_count, b.sim.cpu.tick_count + 1);
    assert_eq!(a.stats().instructions, b.stats().instructions);
    // argc is 1 for the harness argv
    assert_eq!(a.get_reg(T1 as usize), 2);
}

#[test]
fn ecall_drains_the_pipeline() {
    let tc = run(&Config::default(), &[I::new().ecall().build()]);
    // once in execute, once in memory; the exit tick is not counted
    assert_eq!(tc.stats().data_dependent_time, 2);
    assert_eq!(tc.stats().instructions, 1);
}

#[test]
fn without_forwarding_every_producer_in_flight_stalls() {
    let program = [
        I::new().addi(T0, 0, 1).build(),
        I::new().add(T1, T0, T0).build(),
        I::new().ecall().build(),
    ];
    let fwd = run(&Config::default(), &program);
    let stall = run(&no_forwarding(), &program);

    assert_eq!(fwd.stats().data_dependent_time, 2);
    // producer in EX, MEM and WB
    assert_eq!(stall.stats().data_dependent_time, 2 + 3);
    assert_eq!(fwd.get_reg(T1 as usize), 2);
    assert_eq!(stall.get_reg(T1 as usize), 2);
}

#[test]
fn forwarding_picks_the_youngest_producer() {
    let program = [
        I::new().addi(T0, 0, 1).build(),
        I::new().addi(T0, 0, 2).build(),
        I::new().addi(T0, 0, 3).build(),
        I::new().add(A0, T0, 0).build(),
        I::new().ecall().build(),
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    assert_eq!(tc.run().unwrap(), 3);
}

#[test]
fn store_then_load_round_trips_through_memory() {
    let sp = abi::REG_SP as u32;
    let program = [
        I::new().addi(T0, 0, -7).build(),
        I::new().sd(sp, T0, -16).build(),
        I::new().lw(T1, sp, -16).build(),
        I::new().lbu(T2, sp, -16).build(),
        I::new().ecall().build(),
    ];
    let tc = run(&Config::default(), &program);
    assert_eq!(tc.get_reg(T1 as usize), -7i64 as u64);
    assert_eq!(tc.get_reg(T2 as usize), 0xF9);
}

/// `t0 = 5; do { t0 -= 1 } while (t0 != 0)`
fn countdown() -> [u32; 4] {
    [
        I::new().addi(T0, 0, 5).build(),
        I::new().addi(T0, T0, -1).build(),
        I::new().bne(T0, 0, -4).build(),
        I::new().ecall().build(),
    ]
}

#[test]
fn btfnt_only_misses_the_loop_exit() {
    let tc = run(&with_predictor(BranchPredictorKind::Btfnt), &countdown());
    let stats = tc.stats();
    assert_eq!(stats.total_branch, 5);
    assert_eq!(stats.correct_branch, 4);
    assert_eq!(stats.mispredicted_time, 1);
    assert_eq!(tc.get_reg(T0 as usize), 0);
}

#[test]
fn never_taken_misses_every_back_edge() {
    let tc = run(&with_predictor(BranchPredictorKind::NeverTaken), &countdown());
    let stats = tc.stats();
    assert_eq!(stats.total_branch, 5);
    assert_eq!(stats.correct_branch, 1);
    assert_eq!(stats.mispredicted_time, 4);
}

#[test]
fn misprediction_costs_ticks_not_instructions() {
    let good = run(&with_predictor(BranchPredictorKind::Btfnt), &countdown());
    let bad = run(&with_predictor(BranchPredictorKind::NeverTaken), &countdown());
    assert_eq!(good.stats().instructions, bad.stats().instructions);
    assert!(bad.sim.cpu.tick_count > good.sim.cpu.tick_count);
    // 1 + 5 * 2 + ecall
    assert_eq!(good.stats().instructions, 12);
}

#[test]
fn wrong_path_instructions_never_commit() {
    // branch taken over a write to a0 under never-taken
    let program = [
        I::new().beq(0, 0, 8).build(),
        I::new().addi(A0, 0, 99).build(),
        I::new().ecall().build(),
    ];
    let mut tc = TestContext::with_config(&with_predictor(BranchPredictorKind::NeverTaken))
        .load_program(&program)
        .exit_on_ecall();
    assert_eq!(tc.run().unwrap(), 0);
    assert_eq!(tc.stats().mispredicted_time, 1);
}

#[test]
fn call_and_return() {
    let ra = abi::REG_RA as u32;
    let program = [
        I::new().addi(A0, 0, 1).build(),     // 0x00
        I::new().jal(ra, 12).build(),        // 0x04 -> 0x10
        I::new().addi(A0, A0, 10).build(),   // 0x08
        I::new().ecall().build(),            // 0x0c
        I::new().addi(A0, A0, 100).build(),  // 0x10
        I::new().jalr(0, ra, 0).build(),     // 0x14 -> 0x08
    ];
    let mut tc = TestContext::new().load_program(&program).exit_on_ecall();
    assert_eq!(tc.run().unwrap(), 111);
    let stats = tc.stats();
    // jalr in decode, then in execute
    assert_eq!(stats.meet_jalr_time, 2);
    assert_eq!(stats.total_branch, 0);
    assert_eq!(stats.instructions, 6);
    assert_eq!(tc.get_reg(abi::REG_RA), crate::common::harness::CODE_BASE + 8);
}

#[test]
fn cycles_follow_the_slowest_stage() {
    let program = [
        I::new().addi(T0, 0, 6).build(),
        I::new().div(T1, T0, T0).build(),
        I::new().ecall().build(),
    ];
    let fast = Config {
        memory_cycles: 10,
        ..Config::default()
    };
    let mut slow = fast.clone();
    slow.alu_cycles.div_rem = 500;
    let fast = run(&fast, &program);
    let slow = run(&slow, &program);
    assert_eq!(slow.stats().cycles - fast.stats().cycles, 470);
    assert_eq!(slow.get_reg(T1 as usize), 1);
}

type RegCtor = fn(I, u32, u32, u32) -> I;

const OPS: [(RegCtor, AluOp); 12] = [
    (I::add, AluOp::Add),
    (I::sub, AluOp::Sub),
    (I::and, AluOp::And),
    (I::or, AluOp::Or),
    (I::xor, AluOp::Xor),
    (I::sll, AluOp::Sll),
    (I::srl, AluOp::Srl),
    (I::sra, AluOp::Sra),
    (I::slt, AluOp::Slt),
    (I::sltu, AluOp::Sltu),
    (I::mul, AluOp::Mul),
    (I::divu, AluOp::Divu),
];

const FIRST: u32 = 5;
const LAST: u32 = 15;
/// Doublewords of scratch memory below the initial `sp`.
const SLOTS: i32 = 8;
const SP: u32 = abi::REG_SP as u32;

#[derive(Clone, Copy, Debug)]
enum Step {
    Alu(usize, u32, u32, u32),
    Load(u32, i32),
    Store(u32, i32),
    /// `beq` (true) or `bne` over the next instruction.
    Branch(bool, u32, u32),
    /// `jal rd` over the next instruction.
    Link(u32),
}

impl Step {
    fn encode(self) -> u32 {
        match self {
            Self::Alu(idx, rd, rs1, rs2) => (OPS[idx].0)(I::new(), rd, rs1, rs2).build(),
            Self::Load(rd, slot) => I::new().ld(rd, SP, -8 * slot).build(),
            Self::Store(rs, slot) => I::new().sd(SP, rs, -8 * slot).build(),
            Self::Branch(true, a, b) => I::new().beq(a, b, 8).build(),
            Self::Branch(false, a, b) => I::new().bne(a, b, 8).build(),
            Self::Link(rd) => I::new().jal(rd, 8).build(),
        }
    }
}

fn reg() -> impl Strategy<Value = u32> {
    FIRST..=LAST
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0..OPS.len(), reg(), reg(), reg()).prop_map(|(i, rd, a, b)| Step::Alu(i, rd, a, b)),
        2 => (reg(), 1..=SLOTS).prop_map(|(rd, slot)| Step::Load(rd, slot)),
        2 => (reg(), 1..=SLOTS).prop_map(|(rs, slot)| Step::Store(rs, slot)),
        1 => (any::<bool>(), reg(), reg()).prop_map(|(eq, a, b)| Step::Branch(eq, a, b)),
        1 => reg().prop_map(Step::Link),
    ]
}

/// Final registers x5..x15 and scratch slots 1..=SLOTS.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Outcome {
    regs: Vec<u64>,
    scratch: Vec<u64>,
}

fn outcome(tc: &TestContext) -> Outcome {
    let sp = tc.get_reg(abi::REG_SP);
    Outcome {
        regs: (FIRST..=LAST).map(|r| tc.get_reg(r as usize)).collect(),
        scratch: (1..=SLOTS)
            .map(|slot| tc.cpu().mem.peek(sp - 8 * slot as u64, 8).unwrap())
            .collect(),
    }
}

/// Straight-line interpreter for the generated programs.
fn interpret(seeds: &[i32], steps: &[Step]) -> Outcome {
    let mut regs = [0u64; 32];
    let mut scratch = [0u64; SLOTS as usize + 1];
    for (r, &seed) in (FIRST..=LAST).zip(seeds) {
        regs[r as usize] = i64::from(seed) as u64;
    }
    let base = CODE_BASE + 4 * seeds.len() as u64;

    let mut i = 0;
    while i < steps.len() {
        let skip = match steps[i] {
            Step::Alu(idx, rd, a, b) => {
                regs[rd as usize] =
                    Alu::evaluate(OPS[idx].1, regs[a as usize], regs[b as usize], false);
                false
            }
            Step::Load(rd, slot) => {
                regs[rd as usize] = scratch[slot as usize];
                false
            }
            Step::Store(rs, slot) => {
                scratch[slot as usize] = regs[rs as usize];
                false
            }
            Step::Branch(eq, a, b) => (regs[a as usize] == regs[b as usize]) == eq,
            Step::Link(rd) => {
                regs[rd as usize] = base + 4 * i as u64 + 4;
                true
            }
        };
        i += if skip { 2 } else { 1 };
    }
    Outcome {
        regs: (FIRST..=LAST).map(|r| regs[r as usize]).collect(),
        scratch: scratch[1..].to_vec(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn forwarding_never_changes_results(
        seeds in prop::collection::vec(-2048i32..2048, (LAST - FIRST + 1) as usize),
        steps in prop::collection::vec(step(), 1..24),
    ) {
        let mut program: Vec<u32> = (FIRST..=LAST)
            .zip(&seeds)
            .map(|(r, &seed)| I::new().addi(r, 0, seed).build())
            .collect();
        program.extend(steps.iter().map(|s| s.encode()));
        // landing pad for a skip on the last step
        program.push(I::new().nop().build());
        program.push(I::new().ecall().build());

        let fwd = run(&Config::default(), &program);
        let stall = run(&no_forwarding(), &program);
        let want = interpret(&seeds, &steps);

        prop_assert_eq!(outcome(&fwd), want.clone());
        prop_assert_eq!(outcome(&stall), want);
        prop_assert_eq!(fwd.stats().instructions, stall.stats().instructions);
        prop_assert!(stall.stats().data_dependent_time >= fwd.stats().data_dependent_time);
    }
}
