/*!
 * Process Record
 *
 * Per-process bookkeeping: identity, parent link, exit status, the two
 * lifecycle synchronization objects, and the owned address space.
 */

use super::types::{ParentLink, ProcessInfo, ProcessState};
use crate::core::sync::{SignalOnce, WaitChannel};
use crate::core::types::{Pid, WaitStatus};
use crate::memory::AddrSpace;
use parking_lot::Mutex;
use std::fmt;

/// One user-level process
pub struct Process {
    pid: Pid,
    serial: u64,
    parent: Option<ParentLink>,
    name: Mutex<String>,
    exit_status: Mutex<Option<WaitStatus>>,
    /// Fires once, at exit; observed by any number of waitpid calls
    pub(crate) exit_signal: SignalOnce,
    /// Released when this process leaves the table; its exited children
    /// sleep here until then
    pub(crate) reap_channel: WaitChannel,
    addrspace: Mutex<Option<AddrSpace>>,
}

impl Process {
    pub(crate) fn new(pid: Pid, serial: u64, name: String, parent: Option<ParentLink>) -> Self {
        Self {
            pid,
            serial,
            parent,
            name: Mutex::new(name),
            exit_status: Mutex::new(None),
            exit_signal: SignalOnce::new(),
            reap_channel: WaitChannel::new(),
            addrspace: Mutex::new(None),
        }
    }

    #[inline(always)]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline(always)]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Link that names this process as a parent
    #[inline]
    pub fn link(&self) -> ParentLink {
        ParentLink {
            pid: self.pid,
            serial: self.serial,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    #[inline]
    pub fn is_child_of(&self, other: &Process) -> bool {
        self.parent == Some(other.link())
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub(crate) fn set_name(&self, name: String) {
        *self.name.lock() = name;
    }

    /// Published exit status, `None` while running
    pub fn exit_status(&self) -> Option<WaitStatus> {
        *self.exit_status.lock()
    }

    pub(crate) fn set_exit_status(&self, status: WaitStatus) {
        *self.exit_status.lock() = Some(status);
    }

    pub fn has_exited(&self) -> bool {
        self.exit_signal.is_signaled()
    }

    /// Install an address space, returning whatever was there before
    pub(crate) fn set_addrspace(&self, space: Option<AddrSpace>) -> Option<AddrSpace> {
        std::mem::replace(&mut *self.addrspace.lock(), space)
    }

    /// Clear the address-space field and hand back its old contents
    pub(crate) fn take_addrspace(&self) -> Option<AddrSpace> {
        self.addrspace.lock().take()
    }

    /// Run `f` on the address space, if there is one
    pub fn with_addrspace<R>(&self, f: impl FnOnce(&mut AddrSpace) -> R) -> Option<R> {
        self.addrspace.lock().as_mut().map(f)
    }

    pub fn info(&self) -> ProcessInfo {
        let exit_status = self.exit_status();
        ProcessInfo {
            pid: self.pid,
            parent: self.parent.map(|link| link.pid),
            name: self.name(),
            state: if self.has_exited() {
                ProcessState::Zombie
            } else {
                ProcessState::Running
            },
            exit_status,
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("serial", &self.serial)
            .field("parent", &self.parent)
            .field("exited", &self.has_exited())
            .finish()
    }
}
