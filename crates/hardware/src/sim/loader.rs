//! Program Loader and Stack Initialization.
//!
//! This module turns a guest image into mapped memory and an initial stack. It performs:
//! 1. **ELF parsing:** Collects the `PT_LOAD` segments and entry point of an RV64 ELF with `object`.
//! 2. **Segment placement:** Maps each segment and copies its file bytes; the rest is zero-filled.
//! 3. **Stack setup:** Maps the stack below `STACK_TOP` and lays out `argc`, `argv` and the argument strings.

use object::Endianness;
use object::elf::{EM_RISCV, PT_LOAD};
use object::read::elf::{ElfFile64, FileHeader as _, ProgramHeader as _};

use crate::common::constants::{PAGE_SIZE, STACK_TOP};
use crate::common::error::{Result, SimError};
use crate::common::reg::RegisterFile;
use crate::isa::abi;
use crate::memory::MemorySystem;

/// One loadable region of the guest image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segment {
    /// First virtual address.
    pub vaddr: u64,
    /// Bytes of address space the segment occupies.
    pub memsz: u64,
    /// Initialized bytes copied to `vaddr`; the remainder is zero.
    pub data: Vec<u8>,
}

/// A guest program ready to be placed in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    /// Address of the first instruction.
    pub entry: u64,
    /// Loadable regions in file order.
    pub segments: Vec<Segment>,
}

impl Program {
    /// Builds a program from one code segment holding `words` at `base`.
    ///
    /// Handy for tests and small hand-assembled images.
    pub fn from_words(base: u64, words: &[u32]) -> Self {
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self {
            entry: base,
            segments: vec![Segment {
                vaddr: base,
                memsz: data.len() as u64,
                data,
            }],
        }
    }

    /// Maps and fills every segment.
    ///
    /// # Errors
    ///
    /// [`SimError::Loader`] if a segment holds more file bytes than memory bytes.
    pub fn load_into(&self, mem: &mut MemorySystem) -> Result<()> {
        for seg in &self.segments {
            tracing::debug!(
                vaddr = format_args!("{:#x}", seg.vaddr),
                memsz = seg.memsz,
                filesz = seg.data.len(),
                "loading segment"
            );
            mem.load_segment(seg.vaddr, seg.memsz, &seg.data)?;
        }
        Ok(())
    }
}

/// Parses a little-endian RV64 ELF executable.
///
/// # Errors
///
/// [`SimError::Loader`] if the bytes are not a 64-bit ELF, the machine is
/// not RISC-V, or a segment's file range lies outside the image.
pub fn load_elf(bytes: &[u8]) -> Result<Program> {
    let elf = ElfFile64::<Endianness>::parse(bytes)
        .map_err(|e| SimError::Loader(format!("not a 64-bit ELF: {e}")))?;
    let endian = elf.endian();
    let header = elf.elf_header();

    let machine = header.e_machine(endian);
    if machine != EM_RISCV {
        return Err(SimError::Loader(format!(
            "ELF machine {machine} is not RISC-V"
        )));
    }

    let mut segments = Vec::new();
    for ph in elf.elf_program_headers() {
        if ph.p_type(endian) != PT_LOAD {
            continue;
        }
        let vaddr = ph.p_vaddr(endian);
        let data = ph.data(endian, bytes).map_err(|()| {
            SimError::Loader(format!("segment at {vaddr:#x} extends past end of file"))
        })?;
        segments.push(Segment {
            vaddr,
            memsz: ph.p_memsz(endian),
            data: data.to_vec(),
        });
    }

    Ok(Program {
        entry: header.e_entry(endian),
        segments,
    })
}

/// Maps the stack and writes the initial `argc`/`argv` frame.
///
/// ```text
/// +-------------+ <- STACK_TOP
/// | arg strings |
/// +-------------+
/// |    NULL     |
/// | argv[n-1]   |
/// |    ...      |
/// | argv[0]     |
/// +-------------+
/// |    argc     |
/// +-------------+ <- sp (16-byte aligned)
/// ```
///
/// `stack_size` is in KiB; sets `sp` in `regs`.
///
/// # Errors
///
/// [`SimError::Loader`] if the frame does not fit in the mapped stack.
pub fn init_stack(
    mem: &mut MemorySystem,
    regs: &mut RegisterFile,
    stack_size: u64,
    argv: &[String],
) -> Result<()> {
    let pages = stack_size.div_ceil(PAGE_SIZE / 1024);
    for i in 0..pages {
        mem.page_alloc(STACK_TOP - PAGE_SIZE * (i + 1));
    }

    let strings_len: u64 = argv.iter().map(|a| a.len() as u64 + 1).sum();
    let argc = argv.len() as u64;
    let mut string_store = STACK_TOP - strings_len;
    let mut argv_store = (string_store & !7) - (argc + 2) * 8;
    argv_store = (argv_store & !15) + 8;
    let sp = argv_store - 8;

    if sp < STACK_TOP - pages * PAGE_SIZE {
        return Err(SimError::Loader(format!(
            "{strings_len} bytes of arguments do not fit a {stack_size} KiB stack"
        )));
    }

    mem.write_bytes(sp, &(argc as u32).to_le_bytes())?;
    for arg in argv {
        mem.write_bytes(argv_store, &string_store.to_le_bytes())?;
        mem.write_str(string_store, arg)?;
        string_store += arg.len() as u64 + 1;
        argv_store += 8;
    }
    mem.write_bytes(argv_store, &0u64.to_le_bytes())?;

    regs.write(abi::REG_SP, sp);
    tracing::debug!(sp = format_args!("{sp:#x}"), argc, "stack initialized");
    Ok(())
}
