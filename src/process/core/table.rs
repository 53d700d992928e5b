/*!
 * Process Table
 *
 * Fixed-capacity slot arena indexed by `pid - pid_min`. Allocation,
 * lookup and removal are each a single critical section under one lock.
 */

use super::record::Process;
use super::types::{ParentLink, ProcessInfo};
use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, Pid};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

struct Slots {
    entries: Vec<Option<Arc<Process>>>,
    /// Next slot to try; starts after the most recent allocation
    cursor: usize,
    live: usize,
    next_serial: u64,
}

/// Registry of all table-resident processes
pub struct ProcessTable {
    pid_min: u32,
    slots: Mutex<Slots>,
}

impl ProcessTable {
    /// Table holding pids `pid_min..=pid_max`
    pub fn new(pid_min: u32, pid_max: u32) -> Self {
        let capacity = pid_max.saturating_sub(pid_min) as usize + 1;
        Self {
            pid_min,
            slots: Mutex::new(Slots {
                entries: vec![None; capacity],
                cursor: 0,
                live: 0,
                next_serial: 1,
            }),
        }
    }

    #[inline]
    fn index(&self, pid: Pid) -> Option<usize> {
        pid.0.checked_sub(self.pid_min).map(|i| i as usize)
    }

    /// Reserve a free pid and insert the record `build` makes for it
    pub fn allocate<F>(&self, build: F) -> KernelResult<Arc<Process>>
    where
        F: FnOnce(Pid, u64) -> Process,
    {
        let mut slots = self.slots.lock();
        let capacity = slots.entries.len();
        if slots.live == capacity {
            warn!(capacity, "Process table full");
            return Err(KernelError::TooManyProcesses);
        }

        let start = slots.cursor;
        let index = (0..capacity)
            .map(|step| (start + step) % capacity)
            .find(|&i| slots.entries[i].is_none())
            .ok_or(KernelError::TooManyProcesses)?;

        let pid = Pid(self.pid_min + index as u32);
        let serial = slots.next_serial;
        let process = Arc::new(build(pid, serial));
        debug_assert_eq!(process.pid(), pid);

        slots.entries[index] = Some(Arc::clone(&process));
        slots.cursor = (index + 1) % capacity;
        slots.live += 1;
        slots.next_serial += 1;
        debug!(pid = %pid, serial, "Process slot allocated");
        Ok(process)
    }

    pub fn lookup(&self, pid: Pid) -> Option<Arc<Process>> {
        let index = self.index(pid)?;
        self.slots.lock().entries.get(index)?.clone()
    }

    /// Record named by `link`, only if it is the same incarnation
    pub fn lookup_link(&self, link: ParentLink) -> Option<Arc<Process>> {
        self.lookup(link.pid)
            .filter(|process| process.serial() == link.serial)
    }

    /// Take the record out of the table; `None` if the slot was already empty
    pub fn remove(&self, pid: Pid) -> Option<Arc<Process>> {
        let index = self.index(pid)?;
        let mut slots = self.slots.lock();
        let removed = slots.entries.get_mut(index)?.take();
        if removed.is_some() {
            slots.live -= 1;
            debug!(pid = %pid, "Process slot released");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.slots.lock().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.lock().entries.len()
    }

    /// Info for every resident process, ordered by pid
    pub fn snapshot(&self) -> Vec<ProcessInfo> {
        let resident: Vec<Arc<Process>> = self.slots.lock().entries.iter().flatten().cloned().collect();
        resident.iter().map(|process| process.info()).collect()
    }
}
