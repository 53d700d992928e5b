/*!
 * VFS Traits
 * File system collaborator interface consumed by exec
 */

use super::types::*;
use std::sync::Arc;

/// File system interface
///
/// Exec only needs to open an executable by path, read it, and close it.
pub trait FileSystem: Send + Sync {
    /// Open a regular file
    fn open(&self, path: &str) -> VfsResult<Vnode>;

    /// Close a vnode returned by `open`
    fn close(&self, vnode: Vnode) {
        drop(vnode);
    }

    /// Get file system name
    fn name(&self) -> &str;
}

/// Open file handle
#[derive(Debug, Clone)]
pub struct Vnode {
    path: Arc<str>,
    data: Arc<[u8]>,
}

impl Vnode {
    pub fn new(path: impl Into<Arc<str>>, data: Arc<[u8]>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read; short at end of file.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        let Ok(start) = usize::try_from(offset) else {
            return 0;
        };
        if start >= self.data.len() {
            return 0;
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        n
    }
}
