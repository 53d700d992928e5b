/*!
 * Address Space
 *
 * Simulated user address space: a set of page-aligned regions, each backed
 * by its own frames and byte storage. All user memory access from the kernel
 * goes through `copyin`/`copyout`/`copyinstr`, which fault on any access that
 * is not fully inside a region with the required permission.
 */

use super::frames::{FrameLease, FramePool};
use super::types::{MemoryError, MemoryResult, Perms, RegionInfo, SpaceId};
use crate::core::limits::{PAGE_SIZE, USERSTACK};
use crate::core::types::Address;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(1);

const PAGE: u64 = PAGE_SIZE as u64;

#[derive(Debug)]
struct Region {
    base: Address,
    perms: Perms,
    data: Vec<u8>,
    frames: FrameLease,
}

impl Region {
    #[inline]
    fn end(&self) -> Address {
        self.base + self.data.len() as u64
    }

    #[inline]
    fn contains(&self, addr: Address, len: u64) -> bool {
        match addr.checked_add(len) {
            Some(end) => addr >= self.base && end <= self.end(),
            None => false,
        }
    }
}

/// One process's user address space
#[derive(Debug)]
pub struct AddrSpace {
    id: SpaceId,
    regions: Vec<Region>,
    loading: bool,
    pool: Arc<FramePool>,
}

impl AddrSpace {
    /// Empty address space drawing frames from `pool`
    pub fn new(pool: Arc<FramePool>) -> Self {
        Self {
            id: SpaceId(NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed)),
            regions: Vec::new(),
            loading: false,
            pool,
        }
    }

    #[inline]
    pub fn id(&self) -> SpaceId {
        self.id
    }

    /// Frames held by all regions
    pub fn frames(&self) -> usize {
        self.regions.iter().map(|r| r.frames.count()).sum()
    }

    pub fn regions(&self) -> Vec<RegionInfo> {
        self.regions
            .iter()
            .map(|r| RegionInfo {
                base: r.base,
                size: r.data.len() as u64,
                perms: r.perms,
            })
            .collect()
    }

    /// Map `[vaddr, vaddr + size)`, rounded out to page boundaries.
    ///
    /// Page zero is never mappable so null pointers always fault.
    pub fn define_region(&mut self, vaddr: Address, size: u64, perms: Perms) -> MemoryResult<()> {
        let bad = || MemoryError::BadRegion { base: vaddr, size };
        if size == 0 {
            return Err(bad());
        }
        let base = vaddr & !(PAGE - 1);
        let end = vaddr
            .checked_add(size)
            .and_then(|e| e.checked_add(PAGE - 1))
            .map(|e| e & !(PAGE - 1))
            .ok_or_else(bad)?;
        if base < PAGE {
            return Err(bad());
        }
        if self.regions.iter().any(|r| base < r.end() && r.base < end) {
            return Err(MemoryError::RegionOverlap { base, size });
        }

        let len = usize::try_from(end - base).map_err(|_| bad())?;
        let frames = self.pool.lease(len / PAGE_SIZE)?;
        self.regions.push(Region {
            base,
            perms,
            data: vec![0; len],
            frames,
        });
        Ok(())
    }

    /// Map a read/write stack of `pages` pages ending at `USERSTACK`.
    ///
    /// Returns the initial stack pointer.
    pub fn define_stack(&mut self, pages: usize) -> MemoryResult<Address> {
        let size = pages
            .checked_mul(PAGE_SIZE)
            .map(|bytes| bytes as u64)
            .filter(|&bytes| bytes < USERSTACK)
            .ok_or(MemoryError::BadRegion {
                base: USERSTACK,
                size: (pages as u64).saturating_mul(PAGE_SIZE as u64),
            })?;
        self.define_region(USERSTACK - size, size, Perms::READ | Perms::WRITE)?;
        Ok(USERSTACK)
    }

    /// Allow writes to every region while an image is being loaded
    pub fn prepare_load(&mut self) {
        self.loading = true;
    }

    /// Restore region permissions after loading
    pub fn complete_load(&mut self) {
        self.loading = false;
    }

    fn locate(&self, addr: Address, len: u64, need: Perms) -> MemoryResult<(usize, usize)> {
        self.regions
            .iter()
            .position(|r| r.contains(addr, len))
            .filter(|&i| self.loading || self.regions[i].perms.contains(need))
            .map(|i| (i, (addr - self.regions[i].base) as usize))
            .ok_or(MemoryError::Fault(addr))
    }

    /// Copy `len` bytes out of user memory
    pub fn copyin(&self, addr: Address, len: usize) -> MemoryResult<Vec<u8>> {
        let (idx, offset) = self.locate(addr, len as u64, Perms::READ)?;
        Ok(self.regions[idx].data[offset..offset + len].to_vec())
    }

    /// Copy `bytes` into user memory
    pub fn copyout(&mut self, addr: Address, bytes: &[u8]) -> MemoryResult<()> {
        let (idx, offset) = self.locate(addr, bytes.len() as u64, Perms::WRITE)?;
        self.regions[idx].data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Fail unless `[addr, addr + len)` could be written by `copyout`
    pub fn check_writable(&self, addr: Address, len: usize) -> MemoryResult<()> {
        self.locate(addr, len as u64, Perms::WRITE).map(|_| ())
    }

    /// Copy a NUL-terminated string of at most `max` bytes (terminator
    /// included) out of user memory. The terminator is not returned.
    pub fn copyinstr(&self, addr: Address, max: usize) -> MemoryResult<Vec<u8>> {
        let (idx, offset) = self.locate(addr, 1, Perms::READ)?;
        let available = &self.regions[idx].data[offset..];
        let window = &available[..available.len().min(max)];
        match window.iter().position(|&b| b == 0) {
            Some(nul) => Ok(window[..nul].to_vec()),
            None if window.len() == max => Err(MemoryError::StringTooLong { addr, limit: max }),
            None => Err(MemoryError::Fault(self.regions[idx].end())),
        }
    }

    /// Read one little-endian pointer-sized word
    pub fn read_word(&self, addr: Address) -> MemoryResult<u64> {
        let bytes = self.copyin(addr, 8)?;
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(word))
    }

    /// Write one little-endian pointer-sized word
    pub fn write_word(&mut self, addr: Address, value: u64) -> MemoryResult<()> {
        self.copyout(addr, &value.to_le_bytes())
    }

    /// Deep copy with fresh frames; nothing is shared with `self`
    pub fn try_clone(&self) -> MemoryResult<AddrSpace> {
        let mut copy = AddrSpace::new(Arc::clone(&self.pool));
        for region in &self.regions {
            let frames = self.pool.lease(region.frames.count())?;
            copy.regions.push(Region {
                base: region.base,
                perms: region.perms,
                data: region.data.clone(),
                frames,
            });
        }
        Ok(copy)
    }
}
