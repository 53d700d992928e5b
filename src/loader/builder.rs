/*!
 * ELF64 Image Builder
 *
 * Emits minimal executables that `load_elf` accepts. Used to populate the
 * in-memory file system with program images.
 */

use super::elf::*;
use crate::core::types::Address;
use crate::memory::Perms;

struct Segment {
    vaddr: Address,
    perms: Perms,
    data: Vec<u8>,
    memsz: u64,
}

/// Builder for a little-endian ELF64 `ET_EXEC` image
pub struct ElfBuilder {
    entry: Address,
    segments: Vec<Segment>,
}

impl ElfBuilder {
    pub fn new(entry: Address) -> Self {
        Self {
            entry,
            segments: Vec::new(),
        }
    }

    /// Add a `PT_LOAD` segment; `memsz` is raised to at least `data.len()`
    #[must_use]
    pub fn segment(mut self, vaddr: Address, perms: Perms, data: Vec<u8>, memsz: u64) -> Self {
        let memsz = memsz.max(data.len() as u64);
        self.segments.push(Segment {
            vaddr,
            perms,
            data,
            memsz,
        });
        self
    }

    /// Single read/execute segment holding `code` at the entry point
    pub fn text(entry: Address, code: &[u8]) -> Vec<u8> {
        Self::new(entry)
            .segment(entry, Perms::READ | Perms::EXEC, code.to_vec(), code.len() as u64)
            .build()
    }

    pub fn build(self) -> Vec<u8> {
        let phoff = EHDR_SIZE;
        let mut data_offset = (phoff + self.segments.len() * PHDR_SIZE) as u64;

        let mut image = Vec::new();
        image.extend_from_slice(&ELF_MAGIC);
        image.extend_from_slice(&[ELFCLASS64, ELFDATA2LSB, EV_CURRENT]);
        image.resize(16, 0);
        image.extend_from_slice(&ET_EXEC.to_le_bytes());
        image.extend_from_slice(&EM_X86_64.to_le_bytes());
        image.extend_from_slice(&u32::from(EV_CURRENT).to_le_bytes());
        image.extend_from_slice(&self.entry.to_le_bytes());
        image.extend_from_slice(&(phoff as u64).to_le_bytes());
        image.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
        image.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        image.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        image.extend_from_slice(&(PHDR_SIZE as u16).to_le_bytes());
        image.extend_from_slice(&(self.segments.len() as u16).to_le_bytes());
        image.extend_from_slice(&0u16.to_le_bytes()); // e_shentsize
        image.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
        image.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx
        debug_assert_eq!(image.len(), EHDR_SIZE);

        for segment in &self.segments {
            let mut flags = 0;
            if segment.perms.contains(Perms::READ) {
                flags |= PF_R;
            }
            if segment.perms.contains(Perms::WRITE) {
                flags |= PF_W;
            }
            if segment.perms.contains(Perms::EXEC) {
                flags |= PF_X;
            }
            image.extend_from_slice(&PT_LOAD.to_le_bytes());
            image.extend_from_slice(&flags.to_le_bytes());
            image.extend_from_slice(&data_offset.to_le_bytes());
            image.extend_from_slice(&segment.vaddr.to_le_bytes());
            image.extend_from_slice(&segment.vaddr.to_le_bytes()); // p_paddr
            image.extend_from_slice(&(segment.data.len() as u64).to_le_bytes());
            image.extend_from_slice(&segment.memsz.to_le_bytes());
            image.extend_from_slice(&0x1000u64.to_le_bytes()); // p_align
            data_offset += segment.data.len() as u64;
        }

        for segment in self.segments {
            image.extend_from_slice(&segment.data);
        }
        image
    }
}
