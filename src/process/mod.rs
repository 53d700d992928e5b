/*!
 * Process Module
 *
 * User-process lifecycle: the process table, fork, exec, exit and
 * waitpid, and the per-process kernel threads that run them.
 */

pub mod args;
pub mod core;
pub mod execution;
pub mod lifecycle;
pub mod manager;
pub mod manager_builder;

// Re-export for convenience
pub use self::args::{ArgVector, ArgvLayout};
pub use self::core::{ParentLink, Process, ProcessInfo, ProcessState, ProcessTable};
pub use self::execution::{
    current, Exited, ProgramRegistry, Trap, TrapFrame, UserContext, UserMode, UserProgram,
};
pub use self::manager::ProcessManager;
pub use self::manager_builder::ProcessManagerBuilder;
