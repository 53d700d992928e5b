/*!
 * Bootstrap
 * Start a parentless process from the kernel side
 */

use super::exec::program_name;
use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, Pid};
use crate::memory::AddrSpace;
use crate::process::args::ArgVector;
use crate::process::core::Process;
use crate::process::execution::TrapFrame;
use crate::process::manager::ProcessManager;
use std::sync::Arc;
use tracing::{info, warn};

impl ProcessManager {
    /// Load the executable at `path` into a new process with no parent and
    /// start it with `args`. Returns once the process thread is running.
    pub fn run_program<S: AsRef<str>>(&self, path: &str, args: &[S]) -> KernelResult<Pid> {
        let args = ArgVector::from_strs(args);
        if args.footprint() > self.config.arg_max {
            return Err(KernelError::ArgumentListTooLong);
        }

        let process = self
            .table
            .allocate(|pid, serial| Process::new(pid, serial, program_name(path), None))?;
        let pid = process.pid();

        let (space, tf) = match self.prepare_program(path, &args) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(pid = %pid, path, error = %e, "Program could not be started");
                self.table.remove(pid);
                return Err(e);
            }
        };
        process.set_addrspace(Some(space));

        if let Err(e) = self.spawn_process(Arc::clone(&process), Box::new(tf)) {
            if let Some(space) = process.take_addrspace() {
                self.vm.destroy(space);
            }
            self.table.remove(pid);
            return Err(e);
        }

        info!(pid = %pid, path, argc = args.argc(), "Program started");
        Ok(pid)
    }

    fn prepare_program(&self, path: &str, args: &ArgVector) -> KernelResult<(AddrSpace, TrapFrame)> {
        let vnode = self.fs.open(path)?;
        let mut space = self.vm.create()?;
        let loaded = self.load_image(&mut space, &vnode, args);
        self.fs.close(vnode);
        match loaded {
            Ok(tf) => Ok((space, tf)),
            Err(e) => {
                self.vm.destroy(space);
                Err(e)
            }
        }
    }
}
