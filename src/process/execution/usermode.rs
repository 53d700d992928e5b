/*!
 * User Mode
 *
 * Transfer of control into user programs. `UserMode` is the seam; the
 * shipped implementation, `ProgramRegistry`, maps program-counter values to
 * Rust closures that play the part of user code. A closure sees its own
 * registers and address space through `UserContext` and talks to the
 * kernel only through system calls.
 */

use super::kthread::Exited;
use super::trapframe::TrapFrame;
use crate::core::errors::Errno;
use crate::core::limits::{FAULT_EXIT_CODE, POINTER_SIZE};
use crate::core::types::{Address, KernelResult, Pid, UserPtr, WaitStatus};
use crate::process::manager::ProcessManager;
use crate::syscalls::{dispatch, Dispatch, Syscall};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

/// Entry into user mode
pub trait UserMode: Send + Sync {
    /// Run user code from `tf` until the process exits
    fn enter(&self, kernel: &ProcessManager, tf: TrapFrame) -> Exited;
}

/// One piece of user code
pub trait UserProgram: Send + Sync {
    fn run(&self, ctx: &mut UserContext<'_>) -> Exited;
}

impl<F> UserProgram for F
where
    F: Fn(&mut UserContext<'_>) -> Exited + Send + Sync,
{
    fn run(&self, ctx: &mut UserContext<'_>) -> Exited {
        self(ctx)
    }
}

/// Outcome of one trap into the kernel
#[derive(Debug)]
pub enum Trap {
    Return(Result<u64, Errno>),
    Exited(Exited),
}

/// What user code can see and do: its registers, its memory, and syscalls
pub struct UserContext<'k> {
    kernel: &'k ProcessManager,
    tf: TrapFrame,
}

impl<'k> UserContext<'k> {
    pub fn new(kernel: &'k ProcessManager, tf: TrapFrame) -> Self {
        Self { kernel, tf }
    }

    pub fn kernel(&self) -> &'k ProcessManager {
        self.kernel
    }

    pub fn trapframe(&self) -> &TrapFrame {
        &self.tf
    }

    pub fn trapframe_mut(&mut self) -> &mut TrapFrame {
        &mut self.tf
    }

    /// `main`'s `argc` and `argv`
    pub fn args(&self) -> (u64, UserPtr) {
        (self.tf.a0, UserPtr(self.tf.a1))
    }

    pub fn load(&self, addr: Address, len: usize) -> KernelResult<Vec<u8>> {
        self.kernel.copyin_current(addr, len)
    }

    pub fn store(&self, addr: Address, bytes: &[u8]) -> KernelResult<()> {
        self.kernel.copyout_current(addr, bytes)
    }

    pub fn load_word(&self, addr: Address) -> KernelResult<u64> {
        let bytes = self.load(addr, POINTER_SIZE as usize)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn store_word(&self, addr: Address, value: u64) -> KernelResult<()> {
        self.store(addr, &value.to_le_bytes())
    }

    /// NUL-terminated string at `addr`, without the terminator
    pub fn load_str(&self, addr: Address, max: usize) -> KernelResult<String> {
        let bytes = self
            .kernel
            .with_current_space(|space| space.copyinstr(addr, max))??;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Strings of the `argv` vector this program was started with
    pub fn argv(&self) -> KernelResult<Vec<String>> {
        let (argc, argv) = self.args();
        (0..argc)
            .map(|i| {
                let ptr = self.load_word(argv.offset(i * POINTER_SIZE).addr())?;
                self.load_str(ptr, self.kernel.config().arg_max)
            })
            .collect()
    }

    /// Push `bytes` below the stack pointer, keeping it word-aligned
    pub fn stash_bytes(&mut self, bytes: &[u8]) -> KernelResult<UserPtr> {
        let sp = self.tf.sp.saturating_sub(bytes.len() as u64) & !(POINTER_SIZE - 1);
        self.store(sp, bytes)?;
        self.tf.sp = sp;
        Ok(UserPtr(sp))
    }

    /// Push a NUL-terminated copy of `s`
    pub fn stash_str(&mut self, s: &str) -> KernelResult<UserPtr> {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        self.stash_bytes(&bytes)
    }

    /// Push a null-terminated argument vector and its strings
    pub fn stash_argv(&mut self, args: &[&str]) -> KernelResult<UserPtr> {
        let mut words = Vec::with_capacity((args.len() + 1) * POINTER_SIZE as usize);
        for arg in args {
            words.extend_from_slice(&self.stash_str(arg)?.addr().to_le_bytes());
        }
        words.extend_from_slice(&0u64.to_le_bytes());
        self.stash_bytes(&words)
    }

    /// Raw trap: call number in `v0`, arguments in `a0..a2`
    pub fn syscall(&mut self, call: Syscall, a0: u64, a1: u64, a2: u64) -> Trap {
        self.tf.v0 = call.number();
        self.tf.a0 = a0;
        self.tf.a1 = a1;
        self.tf.a2 = a2;
        match dispatch(self.kernel, &mut self.tf) {
            Dispatch::Returned => Trap::Return(self.tf.result()),
            Dispatch::Exited(token) => Trap::Exited(token),
        }
    }

    fn returning(&mut self, call: Syscall, a0: u64, a1: u64, a2: u64) -> Result<u64, Errno> {
        match self.syscall(call, a0, a1, a2) {
            Trap::Return(result) => result,
            Trap::Exited(_) => unreachable!("{call:?} never exits the caller"),
        }
    }

    /// Child pid in the parent. The child resumes in the program registered
    /// at the instruction after the fork site.
    pub fn fork(&mut self) -> Result<Pid, Errno> {
        self.returning(Syscall::Fork, 0, 0, 0)
            .map(|pid| Pid(pid as u32))
    }

    pub fn getpid(&mut self) -> Pid {
        match self.returning(Syscall::GetPid, 0, 0, 0) {
            Ok(pid) => Pid(pid as u32),
            Err(errno) => unreachable!("getpid failed with {errno}"),
        }
    }

    pub fn waitpid(&mut self, pid: Pid, status: UserPtr, options: i32) -> Result<Pid, Errno> {
        self.returning(Syscall::WaitPid, u64::from(pid), status.addr(), options as u64)
            .map(|pid| Pid(pid as u32))
    }

    /// `waitpid` with a status word stashed on the stack, decoded
    pub fn wait_child(&mut self, pid: Pid) -> Result<(Pid, WaitStatus), Errno> {
        let status = self.stash_bytes(&[0u8; 8]).map_err(|e| e.errno())?;
        let reaped = self.waitpid(pid, status, 0)?;
        let raw = self.load(status.addr(), 4).map_err(|e| e.errno())?;
        let raw = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        Ok((reaped, WaitStatus::from_raw(raw)))
    }

    /// On success the new program has already run to its exit
    pub fn execv(&mut self, path: UserPtr, argv: UserPtr) -> Result<Exited, Errno> {
        match self.syscall(Syscall::Execv, path.addr(), argv.addr(), 0) {
            Trap::Exited(token) => Ok(token),
            Trap::Return(result) => match result {
                Err(errno) => Err(errno),
                Ok(value) => unreachable!("execv returned {value}"),
            },
        }
    }

    pub fn exit(&mut self, code: i32) -> Exited {
        match self.syscall(Syscall::Exit, code as u64, 0, 0) {
            Trap::Exited(token) => token,
            Trap::Return(result) => unreachable!("_exit returned {result:?}"),
        }
    }
}

/// `UserMode` that runs the program registered at the entry `pc`
#[derive(Clone, Default)]
pub struct ProgramRegistry {
    programs: Arc<DashMap<Address, Arc<dyn UserProgram>, RandomState>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure to run when user mode is entered at `pc`
    pub fn register<F>(&self, pc: Address, program: F)
    where
        F: Fn(&mut UserContext<'_>) -> Exited + Send + Sync + 'static,
    {
        self.programs.insert(pc, Arc::new(program));
    }

    /// Register any `UserProgram` implementation at `pc`
    pub fn register_program(&self, pc: Address, program: Arc<dyn UserProgram>) {
        self.programs.insert(pc, program);
    }

    pub fn contains(&self, pc: Address) -> bool {
        self.programs.contains_key(&pc)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl UserMode for ProgramRegistry {
    fn enter(&self, kernel: &ProcessManager, tf: TrapFrame) -> Exited {
        // Clone out of the map so no shard guard is held while user code runs
        let program = self.programs.get(&tf.pc).map(|entry| Arc::clone(entry.value()));
        match program {
            Some(program) => program.run(&mut UserContext::new(kernel, tf)),
            None => {
                warn!(pc = format_args!("{:#x}", tf.pc), "No user code at pc");
                kernel.sys_exit(FAULT_EXIT_CODE)
            }
        }
    }
}
