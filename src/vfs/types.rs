/*!
 * VFS Error Types
 * Structured, type-safe error handling for file system operations
 */

use crate::core::errors::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// VFS operations can fail and must be handled
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl VfsError {
    /// Errno passed through the syscall boundary unchanged
    #[must_use]
    pub fn errno(&self) -> Errno {
        match self {
            VfsError::NotFound(_) => Errno::ENOENT,
            VfsError::IsADirectory(_) => Errno::EISDIR,
            VfsError::InvalidPath(_) => Errno::EINVAL,
        }
    }
}
