/*!
 * Core Types
 * Common types used across the kernel
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// User virtual address
pub type Address = u64;

/// Size type for memory operations
pub type Size = usize;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Process ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl Pid {
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Pid> for u64 {
    fn from(pid: Pid) -> Self {
        u64::from(pid.0)
    }
}

/// Pointer into the current process's address space, as passed across the
/// syscall boundary. Never dereferenced directly; always copied in or out
/// through the owning `AddrSpace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserPtr(pub Address);

impl UserPtr {
    pub const NULL: UserPtr = UserPtr(0);

    #[inline(always)]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    #[must_use]
    pub const fn addr(self) -> Address {
        self.0
    }

    /// Pointer `bytes` past this one
    #[inline]
    #[must_use]
    pub const fn offset(self, bytes: u64) -> UserPtr {
        UserPtr(self.0.wrapping_add(bytes))
    }
}

impl fmt::Display for UserPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Encoded wait status as delivered by `waitpid`.
///
/// Uses the `_MKWAIT_EXIT` layout: the exit code shifted left by two with a
/// zero "how" field in the low bits. The encoding is applied exactly once,
/// when the process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitStatus(i32);

impl WaitStatus {
    const HOW_MASK: i32 = 0x3;
    const HOW_EXITED: i32 = 0;

    /// Encode a normal exit with the given code
    #[inline]
    #[must_use]
    pub const fn from_exit_code(code: i32) -> Self {
        Self((code << 2) | Self::HOW_EXITED)
    }

    /// Wrap a raw status word read back from user memory
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// `WIFEXITED`
    #[inline]
    #[must_use]
    pub const fn exited(self) -> bool {
        self.0 & Self::HOW_MASK == Self::HOW_EXITED
    }

    /// `WEXITSTATUS`
    #[inline]
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        self.0 >> 2
    }
}

impl fmt::Display for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exited({})", self.exit_code())
    }
}
