/*!
 * Exec
 *
 * Replace the calling process's program. Everything that comes from the
 * old address space is copied into the kernel before that space is torn
 * down; failures after that point leave the process with nothing to run.
 */

use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, UserPtr};
use crate::loader::load_elf;
use crate::memory::AddrSpace;
use crate::process::args::{ArgVector, ArgvLayout};
use crate::process::core::Process;
use crate::process::execution::{Exited, TrapFrame};
use crate::process::manager::ProcessManager;
use crate::vfs::Vnode;
use tracing::{error, info};

/// Program name shown for a path: its last component
pub(super) fn program_name(path: &str) -> String {
    path.rsplit('/')
        .find(|part| !part.is_empty())
        .unwrap_or(path)
        .to_string()
}

impl ProcessManager {
    /// Run the executable at `path` with arguments `argv` in place of the
    /// calling program. Returns once the new program has exited.
    ///
    /// Errors that carry `is_fatal()` happened after the old image was
    /// discarded; the caller can only exit.
    pub fn sys_execv(&self, path: UserPtr, argv: UserPtr) -> KernelResult<Exited> {
        let process = self.curproc();
        if path.is_null() {
            return Err(KernelError::Fault(path.addr()));
        }

        let (path_bytes, args) = process
            .with_addrspace(|space| -> KernelResult<_> {
                let path_bytes = space.copyinstr(path.addr(), self.config.path_max)?;
                let args = ArgVector::copyin(space, argv, self.config.arg_max)?;
                Ok((path_bytes, args))
            })
            .ok_or(KernelError::Fault(path.addr()))??;
        let path = String::from_utf8(path_bytes)
            .map_err(|_| KernelError::InvalidArgument("path is not valid UTF-8".into()))?;
        if path.is_empty() {
            return Err(KernelError::InvalidArgument("empty path".into()));
        }
        if !self.config.argv_fits_stack(args.footprint()) {
            return Err(KernelError::ArgumentListTooLong);
        }

        let vnode = self.fs.open(&path)?;
        let space = match self.vm.create() {
            Ok(space) => space,
            Err(e) => {
                self.fs.close(vnode);
                return Err(e.into());
            }
        };

        let tf = self
            .replace_image(&process, &path, space, vnode, &args)
            .map_err(|e| {
                error!(pid = %process.pid(), path = %path, error = %e, "Exec failed after discarding old image");
                e.image_lost()
            })?;

        info!(pid = %process.pid(), path = %path, argc = args.argc(), "Process image replaced");
        Ok(self.enter_user(tf))
    }

    /// Swap `space` in for the old image and load the program into it. The
    /// process owns a space, possibly half-built, whatever the outcome.
    fn replace_image(
        &self,
        process: &Process,
        path: &str,
        space: AddrSpace,
        vnode: Vnode,
        args: &ArgVector,
    ) -> KernelResult<TrapFrame> {
        if let Some(old) = process.set_addrspace(Some(space)) {
            self.vm.deactivate();
            self.vm.destroy(old);
        }

        let loaded = process
            .with_addrspace(|space| {
                self.vm.activate(space);
                self.load_image(space, &vnode, args)
            })
            .ok_or(KernelError::Fault(0));
        self.fs.close(vnode);

        let tf = loaded??;
        process.set_name(program_name(path));
        Ok(tf)
    }

    /// Load `vnode` into `space`, build its stack and argument vector, and
    /// return the registers to start it with
    pub(super) fn load_image(
        &self,
        space: &mut AddrSpace,
        vnode: &Vnode,
        args: &ArgVector,
    ) -> KernelResult<TrapFrame> {
        let entry = load_elf(vnode, space)?;
        let stack_top = space.define_stack(self.config.stack_pages)?;
        let layout = ArgvLayout::compute(args, stack_top);
        layout.write(args, space)?;
        Ok(TrapFrame::for_entry(
            entry,
            layout.sp,
            args.argc() as u64,
            layout.argv,
        ))
    }
}
