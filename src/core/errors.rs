/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{Address, Pid};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use crate::memory::MemoryError;
pub use crate::vfs::VfsError;

/// Error numbers delivered through the syscall boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Errno {
    ENOSYS = 1,
    ENOMEM = 3,
    EFAULT = 6,
    EINVAL = 8,
    ENPROC = 12,
    ENOEXEC = 13,
    E2BIG = 14,
    ESRCH = 15,
    ECHILD = 16,
    EISDIR = 18,
    ENOENT = 19,
}

impl Errno {
    #[inline(always)]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Reverse of `code`, for decoding a failed trapframe
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => Errno::ENOSYS,
            3 => Errno::ENOMEM,
            6 => Errno::EFAULT,
            8 => Errno::EINVAL,
            12 => Errno::ENPROC,
            13 => Errno::ENOEXEC,
            14 => Errno::E2BIG,
            15 => Errno::ESRCH,
            16 => Errno::ECHILD,
            18 => Errno::EISDIR,
            19 => Errno::ENOENT,
            _ => return None,
        })
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// Process lifecycle errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum KernelError {
    #[error("Too many processes")]
    #[diagnostic(
        code(process::too_many_processes),
        help("Every pid in the table is in use. Reap exited children or raise pid_max.")
    )]
    TooManyProcesses,

    #[error("Out of memory")]
    #[diagnostic(
        code(process::out_of_memory),
        help("The frame pool is exhausted. Raise max_frames or let processes exit.")
    )]
    OutOfMemory,

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(process::invalid_argument))]
    InvalidArgument(String),

    #[error("Bad user address {0:#x}")]
    #[diagnostic(
        code(process::fault),
        help("The pointer is null, unmapped, or not writable in the caller's address space.")
    )]
    Fault(Address),

    #[error("Argument list too long")]
    #[diagnostic(code(process::arg_list_too_long))]
    ArgumentListTooLong,

    #[error("No such process: {0}")]
    #[diagnostic(
        code(process::no_such_process),
        help("The process never existed or has already been removed from the table.")
    )]
    NoSuchProcess(Pid),

    #[error("Process {0} is not a child of the caller")]
    #[diagnostic(
        code(process::not_child),
        help("Only the process that forked a child may wait for it.")
    )]
    NotChild(Pid),

    #[error("Bad executable: {0}")]
    #[diagnostic(code(process::bad_executable))]
    BadExecutable(String),

    #[error("File system error: {0}")]
    #[diagnostic(code(process::vfs))]
    Vfs(#[from] VfsError),

    #[error("Unknown system call {0}")]
    #[diagnostic(code(syscall::unknown))]
    UnknownSyscall(u64),

    #[error("Exec failed after the old image was discarded: {0}")]
    #[diagnostic(
        code(process::image_lost),
        help("The process has no runnable program left; its only way out is exit.")
    )]
    ImageLost(Box<KernelError>),
}

impl KernelError {
    /// Errno delivered through the syscall boundary
    #[must_use]
    pub fn errno(&self) -> Errno {
        match self {
            KernelError::TooManyProcesses => Errno::ENPROC,
            KernelError::OutOfMemory => Errno::ENOMEM,
            KernelError::InvalidArgument(_) => Errno::EINVAL,
            KernelError::Fault(_) => Errno::EFAULT,
            KernelError::ArgumentListTooLong => Errno::E2BIG,
            KernelError::NoSuchProcess(_) => Errno::ESRCH,
            KernelError::NotChild(_) => Errno::ECHILD,
            KernelError::BadExecutable(_) => Errno::ENOEXEC,
            KernelError::Vfs(e) => e.errno(),
            KernelError::UnknownSyscall(_) => Errno::ENOSYS,
            KernelError::ImageLost(inner) => inner.errno(),
        }
    }

    /// Negative-style return code (`-errno`)
    #[inline]
    #[must_use]
    pub fn return_code(&self) -> i64 {
        -i64::from(self.errno().code())
    }

    /// Whether the failure left the caller without a runnable image
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, KernelError::ImageLost(_))
    }

    pub(crate) fn image_lost(self) -> Self {
        match self {
            lost @ KernelError::ImageLost(_) => lost,
            other => KernelError::ImageLost(Box::new(other)),
        }
    }
}

impl From<MemoryError> for KernelError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::OutOfFrames { .. } => KernelError::OutOfMemory,
            MemoryError::Fault(addr) => KernelError::Fault(addr),
            MemoryError::StringTooLong { addr, .. } => KernelError::Fault(addr),
            MemoryError::RegionOverlap { base, .. } | MemoryError::BadRegion { base, .. } => {
                KernelError::BadExecutable(format!("unusable segment at {base:#x}"))
            }
        }
    }
}
