/*!
 * Exit
 *
 * Publish the exit status, release the address space, then stay in the
 * table until the parent can no longer wait for us.
 */

use crate::core::types::WaitStatus;
use crate::process::execution::{kthread, Exited};
use crate::process::manager::ProcessManager;
use tracing::{debug, info};

impl ProcessManager {
    /// Terminate the calling process. Never fails; the returned token is
    /// the thread's only way out.
    ///
    /// # Panics
    ///
    /// On broken invariants: no current process, no address space, or the
    /// record already gone from the table.
    pub fn sys_exit(&self, code: i32) -> Exited {
        let process = self.curproc();
        let pid = process.pid();
        let status = WaitStatus::from_exit_code(code);
        process.set_exit_status(status);

        let space = process.take_addrspace();
        assert!(space.is_some(), "pid {pid} exiting without an address space");
        self.vm.deactivate();
        if let Some(space) = space {
            self.vm.destroy(space);
        }

        process.exit_signal.signal();
        info!(pid = %pid, code, status = status.raw(), "Process exited");

        // A live parent may still wait for us; stay resolvable until it exits
        if let Some(parent) = process.parent().and_then(|link| self.table.lookup_link(link)) {
            debug!(pid = %pid, parent = %parent.pid(), "Removal deferred until parent exits");
            parent.reap_channel.sleep();
        }

        if self.table.remove(pid).is_none() {
            panic!("pid {pid} removed from the process table twice");
        }
        let woken = process.reap_channel.wake_all();
        debug!(pid = %pid, deferred_children = woken.count(), "Process removed");

        kthread::unbind();
        self.process_finished();
        Exited::new()
    }
}
