/*!
 * Syscall Types
 * Call numbers and dispatch outcomes
 */

use crate::process::Exited;
use serde::{Deserialize, Serialize};
use std::fmt;

/// System calls served by the process subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Syscall {
    Fork,
    Execv,
    Exit,
    WaitPid,
    GetPid,
}

impl Syscall {
    pub const SYS_FORK: u64 = 0;
    pub const SYS_EXECV: u64 = 2;
    pub const SYS_EXIT: u64 = 3;
    pub const SYS_WAITPID: u64 = 4;
    pub const SYS_GETPID: u64 = 5;

    /// Call number as passed in `v0`
    #[inline]
    #[must_use]
    pub const fn number(self) -> u64 {
        match self {
            Syscall::Fork => Self::SYS_FORK,
            Syscall::Execv => Self::SYS_EXECV,
            Syscall::Exit => Self::SYS_EXIT,
            Syscall::WaitPid => Self::SYS_WAITPID,
            Syscall::GetPid => Self::SYS_GETPID,
        }
    }

    pub fn from_number(number: u64) -> Option<Self> {
        match number {
            Self::SYS_FORK => Some(Syscall::Fork),
            Self::SYS_EXECV => Some(Syscall::Execv),
            Self::SYS_EXIT => Some(Syscall::Exit),
            Self::SYS_WAITPID => Some(Syscall::WaitPid),
            Self::SYS_GETPID => Some(Syscall::GetPid),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Syscall::Fork => "fork",
            Syscall::Execv => "execv",
            Syscall::Exit => "_exit",
            Syscall::WaitPid => "waitpid",
            Syscall::GetPid => "getpid",
        }
    }

    /// Whether the call can sleep waiting on another process
    pub const fn may_block(self) -> bool {
        matches!(self, Syscall::Execv | Syscall::Exit | Syscall::WaitPid)
    }
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of dispatching one trap
#[derive(Debug)]
#[must_use]
pub enum Dispatch {
    /// Result is in the trapframe; user code continues at the next instruction
    Returned,
    /// The calling program is gone; the thread must return this token
    Exited(Exited),
}
