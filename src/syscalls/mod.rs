/*!
 * Syscalls Module
 * Trap-level system call boundary for the process lifecycle calls
 */

mod dispatcher;
mod types;

// Re-export public API
pub use dispatcher::dispatch;
pub use types::{Dispatch, Syscall};
