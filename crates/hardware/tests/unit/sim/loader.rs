//! ELF loading and stack construction.

use pretty_assertions::assert_eq;

use rvpipe_core::common::constants::STACK_TOP;
use rvpipe_core::common::reg::RegisterFile;
use rvpipe_core::config::Config;
use rvpipe_core::isa::abi;
use rvpipe_core::memory::MemorySystem;
use rvpipe_core::sim::{Program, Simulator, init_stack, load_elf};
use rvpipe_core::{SimError, core::cpu::Console};

use crate::common::builder::instruction::{InstructionBuilder as I, pack};

const EM_RISCV: u16 = 243;
const EM_X86_64: u16 = 62;
const VADDR: u64 = 0x1_0000;

/// A minimal ELF64 executable with one `PT_LOAD` segment holding `code`
/// and no section headers.
fn tiny_elf(machine: u16, code: &[u8], memsz: u64) -> Vec<u8> {
    const EHSIZE: u64 = 64;
    const PHENTSIZE: u64 = 56;
    let offset = EHSIZE + PHENTSIZE;

    let mut elf = Vec::new();
    elf.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    elf.extend_from_slice(&[0; 8]);
    elf.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    elf.extend_from_slice(&machine.to_le_bytes());
    elf.extend_from_slice(&1u32.to_le_bytes());
    elf.extend_from_slice(&VADDR.to_le_bytes()); // e_entry
    elf.extend_from_slice(&EHSIZE.to_le_bytes()); // e_phoff
    elf.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    elf.extend_from_slice(&0u32.to_le_bytes());
    elf.extend_from_slice(&(EHSIZE as u16).to_le_bytes());
    elf.extend_from_slice(&(PHENTSIZE as u16).to_le_bytes());
    elf.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    elf.extend_from_slice(&64u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    assert_eq!(elf.len() as u64, EHSIZE);

    elf.extend_from_slice(&1u32.to_le_bytes()); // PT_LOAD
    elf.extend_from_slice(&5u32.to_le_bytes()); // R+X
    elf.extend_from_slice(&offset.to_le_bytes());
    elf.extend_from_slice(&VADDR.to_le_bytes());
    elf.extend_from_slice(&VADDR.to_le_bytes());
    elf.extend_from_slice(&(code.len() as u64).to_le_bytes());
    elf.extend_from_slice(&memsz.to_le_bytes());
    elf.extend_from_slice(&0x1000u64.to_le_bytes());
    assert_eq!(elf.len() as u64, offset);

    elf.extend_from_slice(code);
    elf
}

fn exit_code(value: i32) -> Vec<u8> {
    pack(&[
        I::new().addi(10, 0, value).build(),
        I::new().addi(17, 0, 93).build(),
        I::new().ecall().build(),
    ])
}

#[test]
fn elf_segments_and_entry_are_collected() {
    let code = exit_code(5);
    let program = load_elf(&tiny_elf(EM_RISCV, &code, 0x100)).unwrap();
    assert_eq!(program.entry, VADDR);
    assert_eq!(program.segments.len(), 1);
    let seg = &program.segments[0];
    assert_eq!((seg.vaddr, seg.memsz), (VADDR, 0x100));
    assert_eq!(seg.data, code);
}

#[test]
fn elf_program_runs_to_its_exit_code() {
    let program = load_elf(&tiny_elf(EM_RISCV, &exit_code(5), 0x100)).unwrap();
    let console = Console::new(std::io::empty(), std::io::sink());
    let mut sim = Simulator::with_console(&Config::default(), console).unwrap();
    sim.load(&program, &["tiny".to_owned()]).unwrap();
    assert_eq!(sim.run().unwrap(), 5);
    // bss tail is zero
    assert_eq!(sim.cpu.mem.peek(VADDR + 0xF8, 8).unwrap(), 0);
}

#[test]
fn foreign_machine_is_rejected() {
    let err = load_elf(&tiny_elf(EM_X86_64, &exit_code(0), 12)).unwrap_err();
    assert!(matches!(err, SimError::Loader(ref m) if m.contains("not RISC-V")), "{err}");
}

#[test]
fn truncated_segment_is_rejected() {
    let mut elf = tiny_elf(EM_RISCV, &exit_code(0), 12);
    elf.truncate(elf.len() - 4);
    assert!(matches!(load_elf(&elf), Err(SimError::Loader(_))));
}

#[test]
fn words_become_one_segment() {
    let program = Program::from_words(VADDR, &[0x0000_0013, 0x0000_0073]);
    assert_eq!(program.entry, VADDR);
    assert_eq!(program.segments[0].data, vec![0x13, 0, 0, 0, 0x73, 0, 0, 0]);
}

#[test]
fn stack_holds_argc_argv_and_strings() {
    let mut mem = MemorySystem::new(&Config::default()).unwrap();
    let mut regs = RegisterFile::new();
    let argv: Vec<String> = ["prog", "-n", "hello world"].map(str::to_owned).to_vec();
    init_stack(&mut mem, &mut regs, 64, &argv).unwrap();

    let sp = regs.read(abi::REG_SP);
    assert_eq!(sp % 8, 0);
    assert!(sp < STACK_TOP && sp > STACK_TOP - 64 * 1024);
    assert_eq!(mem.peek(sp, 4).unwrap(), 3);

    let mut expected_str = STACK_TOP - (5 + 3 + 12);
    for (i, arg) in argv.iter().enumerate() {
        let ptr = mem.peek(sp + 8 * (i as u64 + 1), 8).unwrap();
        assert_eq!(ptr, expected_str);
        for (j, byte) in arg.bytes().enumerate() {
            assert_eq!(mem.peek(ptr + j as u64, 1).unwrap(), u64::from(byte));
        }
        assert_eq!(mem.peek(ptr + arg.len() as u64, 1).unwrap(), 0);
        expected_str += arg.len() as u64 + 1;
    }
    assert_eq!(mem.peek(sp + 8 * 4, 8).unwrap(), 0);
}

#[test]
fn stack_is_mapped_to_the_configured_size() {
    let mut mem = MemorySystem::new(&Config::default()).unwrap();
    let mut regs = RegisterFile::new();
    init_stack(&mut mem, &mut regs, 8, &[]).unwrap();
    assert!(mem.is_mapped(STACK_TOP - 1));
    assert!(mem.is_mapped(STACK_TOP - 8 * 1024));
    assert!(!mem.is_mapped(STACK_TOP - 8 * 1024 - 1));
}

#[test]
fn arguments_larger_than_the_stack_are_rejected() {
    let mut mem = MemorySystem::new(&Config::default()).unwrap();
    let mut regs = RegisterFile::new();
    let argv = vec!["x".repeat(8 * 1024)];
    assert!(matches!(
        init_stack(&mut mem, &mut regs, 4, &argv),
        Err(SimError::Loader(_))
    ));
}
