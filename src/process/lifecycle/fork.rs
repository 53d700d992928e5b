/*!
 * Fork
 * Duplicate the calling process
 */

use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, Pid};
use crate::process::core::Process;
use crate::process::execution::TrapFrame;
use crate::process::manager::ProcessManager;
use std::sync::Arc;
use tracing::{info, warn};

impl ProcessManager {
    /// Create a child that resumes from `tf` with a zero return value.
    ///
    /// The child gets a deep copy of the caller's address space. On any
    /// failure nothing of the child survives.
    pub fn sys_fork(&self, tf: &TrapFrame) -> KernelResult<Pid> {
        let parent = self.curproc();
        let child = self.table.allocate(|pid, serial| {
            Process::new(pid, serial, parent.name(), Some(parent.link()))
        })?;

        let copied = parent
            .with_addrspace(|space| self.vm.copy(space))
            .ok_or(KernelError::Fault(0))
            .and_then(|copy| copy.map_err(KernelError::from));
        let space = match copied {
            Ok(space) => space,
            Err(e) => {
                warn!(parent = %parent.pid(), error = %e, "Fork could not copy address space");
                self.table.remove(child.pid());
                return Err(e);
            }
        };
        child.set_addrspace(Some(space));

        // The child thread owns the snapshot from here on
        let snapshot = Box::new(tf.for_child());
        if let Err(e) = self.spawn_process(Arc::clone(&child), snapshot) {
            if let Some(space) = child.take_addrspace() {
                self.vm.destroy(space);
            }
            self.table.remove(child.pid());
            return Err(e);
        }

        info!(parent = %parent.pid(), child = %child.pid(), "Process forked");
        Ok(child.pid())
    }

    /// Pid of the calling process
    pub fn sys_getpid(&self) -> Pid {
        self.curproc().pid()
    }
}
