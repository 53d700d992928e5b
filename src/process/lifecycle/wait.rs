/*!
 * Wait
 * Block until a child has exited and report its status
 */

use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, Pid, UserPtr};
use crate::process::manager::ProcessManager;
use std::mem::size_of;
use tracing::debug;

impl ProcessManager {
    /// Wait for child `pid` and store its status at `status`.
    ///
    /// Everything that can fail is checked before blocking: options, then
    /// existence, then parentage, then the status pointer. Waiting does not
    /// consume anything, so the same child can be waited for again.
    pub fn sys_waitpid(&self, pid: Pid, status: UserPtr, options: i32) -> KernelResult<Pid> {
        if options != 0 {
            return Err(KernelError::InvalidArgument(format!(
                "unsupported waitpid options {options:#x}"
            )));
        }

        let caller = self.curproc();
        let child = self
            .table
            .lookup(pid)
            .ok_or(KernelError::NoSuchProcess(pid))?;
        if !child.is_child_of(&caller) {
            return Err(KernelError::NotChild(pid));
        }

        if status.is_null() {
            return Err(KernelError::Fault(status.addr()));
        }
        caller
            .with_addrspace(|space| space.check_writable(status.addr(), size_of::<i32>()))
            .ok_or(KernelError::Fault(status.addr()))??;

        debug!(caller = %caller.pid(), child = %pid, "Waiting for child");
        child.exit_signal.wait();
        let exit_status = match child.exit_status() {
            Some(exit_status) => exit_status,
            None => unreachable!("pid {pid} signaled exit without a status"),
        };

        self.copyout_current(status.addr(), &exit_status.raw().to_le_bytes())?;
        Ok(pid)
    }
}
