/*!
 * Process Kernel Library
 *
 * Process lifecycle for a small teaching kernel, hosted on std threads:
 * fork, exec, exit and waitpid over a shared process table, with
 * simulated virtual memory, an in-memory file system and an ELF loader as
 * collaborators.
 */

pub mod core;
pub mod loader;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod syscalls;
pub mod vfs;

// Re-exports
pub use crate::core::{
    ConfigError, Errno, KernelConfig, KernelError, KernelResult, Pid, UserPtr, WaitStatus,
};
pub use loader::{load_elf, ElfBuilder};
pub use memory::{
    AddrSpace, MemoryError, MemoryResult, MemoryStats, Perms, SimVm, VirtualMemory,
};
pub use monitoring::init_tracing;
pub use process::{
    ArgVector, ArgvLayout, Exited, ProcessInfo, ProcessManager, ProcessState, ProgramRegistry,
    TrapFrame, UserContext, UserMode, UserProgram,
};
pub use syscalls::{dispatch, Dispatch, Syscall};
pub use vfs::{FileSystem, MemFs, VfsError, Vnode};
