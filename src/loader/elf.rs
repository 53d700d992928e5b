/*!
 * ELF64 Loader
 *
 * Loads the `PT_LOAD` segments of a little-endian ELF64 executable into an
 * address space and reports the entry point.
 */

use crate::core::errors::KernelError;
use crate::core::types::{Address, KernelResult};
use crate::memory::{AddrSpace, Perms};
use crate::vfs::Vnode;
use tracing::debug;

// ══════════════════════════════════════════════════════════════
//  ELF64 constants
// ══════════════════════════════════════════════════════════════

pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const EV_CURRENT: u8 = 1;
pub const ET_EXEC: u16 = 2;
pub const EM_X86_64: u16 = 62;
pub const PT_LOAD: u32 = 1;

pub const PF_X: u32 = 1;
pub const PF_W: u32 = 2;
pub const PF_R: u32 = 4;

pub const EHDR_SIZE: usize = 64;
pub const PHDR_SIZE: usize = 56;

// ══════════════════════════════════════════════════════════════
//  ELF64 structures
// ══════════════════════════════════════════════════════════════

struct Elf64Ehdr {
    e_entry: u64,
    e_phoff: u64,
    e_phentsize: u16,
    e_phnum: u16,
}

fn u16_at(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn u32_at(data: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[at..at + 4]);
    u32::from_le_bytes(raw)
}

fn u64_at(data: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[at..at + 8]);
    u64::from_le_bytes(raw)
}

fn bad(reason: impl Into<String>) -> KernelError {
    KernelError::BadExecutable(reason.into())
}

impl Elf64Ehdr {
    fn parse(data: &[u8; EHDR_SIZE]) -> KernelResult<Self> {
        if data[0..4] != ELF_MAGIC {
            return Err(bad("missing ELF magic"));
        }
        if data[4] != ELFCLASS64 || data[5] != ELFDATA2LSB {
            return Err(bad("not a little-endian ELF64 image"));
        }
        if data[6] != EV_CURRENT {
            return Err(bad("unsupported ELF version"));
        }
        if u16_at(data, 16) != ET_EXEC {
            return Err(bad("not an executable (need ET_EXEC)"));
        }
        if u16_at(data, 18) != EM_X86_64 {
            return Err(bad("wrong machine type"));
        }

        let ehdr = Elf64Ehdr {
            e_entry: u64_at(data, 24),
            e_phoff: u64_at(data, 32),
            e_phentsize: u16_at(data, 54),
            e_phnum: u16_at(data, 56),
        };
        if usize::from(ehdr.e_phentsize) != PHDR_SIZE {
            return Err(bad("unexpected program header size"));
        }
        Ok(ehdr)
    }
}

struct Elf64Phdr {
    p_type: u32,
    p_flags: u32,
    p_offset: u64,
    p_vaddr: u64,
    p_filesz: u64,
    p_memsz: u64,
}

impl Elf64Phdr {
    fn parse(data: &[u8; PHDR_SIZE]) -> Self {
        Elf64Phdr {
            p_type: u32_at(data, 0),
            p_flags: u32_at(data, 4),
            p_offset: u64_at(data, 8),
            p_vaddr: u64_at(data, 16),
            p_filesz: u64_at(data, 32),
            p_memsz: u64_at(data, 40),
        }
    }

    fn perms(&self) -> Perms {
        let mut perms = Perms::empty();
        if self.p_flags & PF_R != 0 {
            perms |= Perms::READ;
        }
        if self.p_flags & PF_W != 0 {
            perms |= Perms::WRITE;
        }
        if self.p_flags & PF_X != 0 {
            perms |= Perms::EXEC;
        }
        perms
    }
}

fn read_exact(vnode: &Vnode, offset: u64, buf: &mut [u8], what: &str) -> KernelResult<()> {
    if vnode.read_at(offset, buf) != buf.len() {
        return Err(bad(format!("{} truncated: {what}", vnode.path())));
    }
    Ok(())
}

/// Load `vnode` into `space`; returns the entry point
pub fn load_elf(vnode: &Vnode, space: &mut AddrSpace) -> KernelResult<Address> {
    let mut header = [0u8; EHDR_SIZE];
    read_exact(vnode, 0, &mut header, "ELF header")?;
    let ehdr = Elf64Ehdr::parse(&header)?;

    let mut segments = Vec::new();
    for i in 0..u64::from(ehdr.e_phnum) {
        let mut raw = [0u8; PHDR_SIZE];
        let offset = ehdr.e_phoff + i * PHDR_SIZE as u64;
        read_exact(vnode, offset, &mut raw, "program header")?;
        let phdr = Elf64Phdr::parse(&raw);
        if phdr.p_type != PT_LOAD || phdr.p_memsz == 0 {
            continue;
        }
        if phdr.p_filesz > phdr.p_memsz {
            return Err(bad("segment file size exceeds memory size"));
        }
        space.define_region(phdr.p_vaddr, phdr.p_memsz, phdr.perms())?;
        segments.push(phdr);
    }
    if segments.is_empty() {
        return Err(bad("no loadable segments"));
    }

    space.prepare_load();
    let copied = segments.iter().try_for_each(|phdr| {
        let len = usize::try_from(phdr.p_filesz).map_err(|_| bad("segment too large"))?;
        let mut bytes = vec![0u8; len];
        read_exact(vnode, phdr.p_offset, &mut bytes, "segment data")?;
        space.copyout(phdr.p_vaddr, &bytes)?;
        Ok::<(), KernelError>(())
    });
    space.complete_load();
    copied?;

    debug!(
        path = vnode.path(),
        entry = format_args!("{:#x}", ehdr.e_entry),
        segments = segments.len(),
        "ELF image loaded"
    );
    Ok(ehdr.e_entry)
}
