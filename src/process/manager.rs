/*!
 * Process Management
 *
 * Owns the process table and the collaborators the lifecycle operations
 * need. The operations themselves live in `lifecycle`.
 */

use super::core::{Process, ProcessInfo, ProcessTable};
use super::execution::{kthread, Exited, TrapFrame, UserMode};
use super::manager_builder::ProcessManagerBuilder;
use crate::core::config::KernelConfig;
use crate::core::errors::KernelError;
use crate::core::limits::FAULT_EXIT_CODE;
use crate::core::types::{Address, KernelResult, Pid};
use crate::memory::{AddrSpace, MemoryStats, VirtualMemory};
use crate::vfs::FileSystem;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::error;

/// Count of processes that still have a thread
#[derive(Default)]
pub(crate) struct LiveProcesses {
    count: Mutex<usize>,
    idle: Condvar,
}

impl LiveProcesses {
    fn enter(&self) {
        *self.count.lock() += 1;
    }

    fn leave(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn get(&self) -> usize {
        *self.count.lock()
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }

    fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

#[derive(Clone)]
pub struct ProcessManager {
    pub(super) table: Arc<ProcessTable>,
    pub(super) vm: Arc<dyn VirtualMemory>,
    pub(super) fs: Arc<dyn FileSystem>,
    pub(super) usermode: Arc<dyn UserMode>,
    pub(super) config: Arc<KernelConfig>,
    pub(super) live: Arc<LiveProcesses>,
}

impl ProcessManager {
    pub(super) fn from_parts(
        config: KernelConfig,
        vm: Arc<dyn VirtualMemory>,
        fs: Arc<dyn FileSystem>,
        usermode: Arc<dyn UserMode>,
    ) -> Self {
        Self {
            table: Arc::new(ProcessTable::new(config.pid_min, config.pid_max)),
            vm,
            fs,
            usermode,
            config: Arc::new(config),
            live: Arc::new(LiveProcesses::default()),
        }
    }

    /// Create a builder for configuring the process manager
    pub fn builder() -> ProcessManagerBuilder {
        ProcessManagerBuilder::new()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.vm.stats()
    }

    /// Process bound to the calling thread
    ///
    /// # Panics
    ///
    /// If the calling thread is not a process thread
    pub(crate) fn curproc(&self) -> Arc<Process> {
        match kthread::current() {
            Some(process) => process,
            None => panic!("no current process on thread {:?}", std::thread::current().name()),
        }
    }

    /// Run `f` on the calling process's address space
    pub fn with_current_space<R>(&self, f: impl FnOnce(&mut AddrSpace) -> R) -> KernelResult<R> {
        self.curproc()
            .with_addrspace(f)
            .ok_or(KernelError::Fault(0))
    }

    /// Copy bytes in from the calling process's address space
    pub fn copyin_current(&self, addr: Address, len: usize) -> KernelResult<Vec<u8>> {
        Ok(self.with_current_space(|space| space.copyin(addr, len))??)
    }

    /// Copy bytes out to the calling process's address space
    pub fn copyout_current(&self, addr: Address, bytes: &[u8]) -> KernelResult<()> {
        Ok(self.with_current_space(|space| space.copyout(addr, bytes))??)
    }

    /// Info on a table-resident process
    pub fn process_info(&self, pid: Pid) -> Option<ProcessInfo> {
        self.table.lookup(pid).map(|process| process.info())
    }

    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        self.table.snapshot()
    }

    /// Processes whose threads have not finished exiting
    pub fn live_processes(&self) -> usize {
        self.live.get()
    }

    /// Block until every process has exited
    pub fn wait_idle(&self) {
        self.live.wait_idle();
    }

    /// Bounded `wait_idle`; true if the system went idle in time
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        self.live.wait_idle_timeout(timeout)
    }

    /// Start a thread for `process` that activates its address space and
    /// enters user mode with `tf`
    pub(super) fn spawn_process(&self, process: Arc<Process>, tf: Box<TrapFrame>) -> KernelResult<()> {
        let kernel = self.clone();
        self.live.enter();
        let spawned = kthread::spawn(process, move || {
            let tf = *tf;
            kernel.curproc().with_addrspace(|space| kernel.vm.activate(space));
            kernel.enter_user(tf)
        });
        spawned.map_err(|e| {
            self.live.leave();
            error!(error = %e, "Failed to spawn process thread");
            KernelError::OutOfMemory
        })
    }

    /// Called by exit once the thread is unbound
    pub(super) fn process_finished(&self) {
        self.live.leave();
    }

    /// Enter user mode. A panic in user code is a fault that kills the
    /// process with `FAULT_EXIT_CODE`.
    pub(super) fn enter_user(&self, tf: TrapFrame) -> Exited {
        let usermode = Arc::clone(&self.usermode);
        match panic::catch_unwind(AssertUnwindSafe(|| usermode.enter(self, tf))) {
            Ok(exited) => exited,
            Err(_) if kthread::current().is_some() => {
                error!(pc = format_args!("{:#x}", tf.pc), "User code faulted");
                self.sys_exit(FAULT_EXIT_CODE)
            }
            Err(_) => {
                error!("Process thread panicked after exit");
                Exited::new()
            }
        }
    }
}
