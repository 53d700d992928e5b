/*!
 * Memory Types
 * Common types for the simulated virtual-memory collaborator
 */

use crate::core::types::Address;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Out of frames: requested {requested}, available {available}")]
    OutOfFrames { requested: usize, available: usize },

    #[error("Bad user address 0x{0:x}")]
    Fault(Address),

    #[error("String at 0x{addr:x} exceeds {limit} bytes")]
    StringTooLong { addr: Address, limit: usize },

    #[error("Region at 0x{base:x} overlaps an existing region")]
    RegionOverlap { base: Address, size: u64 },

    #[error("Unusable region at 0x{base:x} ({size} bytes)")]
    BadRegion { base: Address, size: u64 },
}

bitflags! {
    /// Region permissions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Perms: u8 {
        const READ = 0b001;
        const WRITE = 0b010;
        const EXEC = 0b100;
    }
}

/// Identity of one address space instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(pub u64);

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "as#{}", self.0)
    }
}

/// Region metadata, as reported by `AddrSpace::regions`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub base: Address,
    pub size: u64,
    pub perms: Perms,
}

impl RegionInfo {
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Address {
        self.base + self.size
    }
}

/// Frame pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_frames: usize,
    pub free_frames: usize,
    pub live_spaces: usize,
}

impl MemoryStats {
    #[inline]
    #[must_use]
    pub const fn used_frames(&self) -> usize {
        self.total_frames - self.free_frames
    }
}
