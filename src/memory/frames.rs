/*!
 * Frame Pool
 *
 * Fixed budget of physical frames shared by every address space. Frames are
 * handed out as `FrameLease`s that return themselves to the pool on drop.
 */

use super::types::{MemoryError, MemoryResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared frame budget
#[derive(Debug)]
pub struct FramePool {
    total: usize,
    free: AtomicUsize,
}

impl FramePool {
    pub fn new(total: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            free: AtomicUsize::new(total),
        })
    }

    /// Reserve `count` frames
    pub fn lease(self: &Arc<Self>, count: usize) -> MemoryResult<FrameLease> {
        let mut free = self.free.load(Ordering::Acquire);
        loop {
            if free < count {
                return Err(MemoryError::OutOfFrames {
                    requested: count,
                    available: free,
                });
            }
            match self.free.compare_exchange_weak(
                free,
                free - count,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Ok(FrameLease {
                        pool: Arc::clone(self),
                        count,
                    })
                }
                Err(current) => free = current,
            }
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.free.load(Ordering::Acquire)
    }
}

/// Frames held by one region
#[derive(Debug)]
pub struct FrameLease {
    pool: Arc<FramePool>,
    count: usize,
}

impl FrameLease {
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        self.pool.free.fetch_add(self.count, Ordering::AcqRel);
    }
}
