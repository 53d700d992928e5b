/*!
 * Simulated VM System
 *
 * `VirtualMemory` implementation over a shared `FramePool`. Activation is
 * tracked per host thread, the hosted stand-in for "per CPU".
 */

use super::addrspace::AddrSpace;
use super::frames::FramePool;
use super::traits::VirtualMemory;
use super::types::{MemoryResult, MemoryStats, SpaceId};
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

thread_local! {
    static ACTIVE: Cell<Option<SpaceId>> = const { Cell::new(None) };
}

/// Address space currently active on the calling thread
pub fn active_space() -> Option<SpaceId> {
    ACTIVE.with(Cell::get)
}

/// Simulated VM system
#[derive(Debug, Clone)]
pub struct SimVm {
    pool: Arc<FramePool>,
    live_spaces: Arc<AtomicUsize>,
}

impl SimVm {
    pub fn new(max_frames: usize) -> Self {
        debug!(max_frames, "Simulated VM initialized");
        Self {
            pool: FramePool::new(max_frames),
            live_spaces: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl VirtualMemory for SimVm {
    fn create(&self) -> MemoryResult<AddrSpace> {
        let space = AddrSpace::new(Arc::clone(&self.pool));
        self.live_spaces.fetch_add(1, Ordering::Relaxed);
        trace!(space = %space.id(), "Address space created");
        Ok(space)
    }

    fn copy(&self, src: &AddrSpace) -> MemoryResult<AddrSpace> {
        let space = src.try_clone()?;
        self.live_spaces.fetch_add(1, Ordering::Relaxed);
        trace!(from = %src.id(), to = %space.id(), frames = space.frames(), "Address space copied");
        Ok(space)
    }

    fn destroy(&self, space: AddrSpace) {
        if active_space() == Some(space.id()) {
            ACTIVE.with(|a| a.set(None));
        }
        self.live_spaces.fetch_sub(1, Ordering::Relaxed);
        trace!(space = %space.id(), frames = space.frames(), "Address space destroyed");
    }

    fn activate(&self, space: &AddrSpace) {
        ACTIVE.with(|a| a.set(Some(space.id())));
    }

    fn deactivate(&self) {
        ACTIVE.with(|a| a.set(None));
    }

    fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_frames: self.pool.total(),
            free_frames: self.pool.free(),
            live_spaces: self.live_spaces.load(Ordering::Relaxed),
        }
    }
}
