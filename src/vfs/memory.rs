/*!
 * In-Memory Filesystem Backend
 * Volatile file system holding executable images for exec and tests
 */

use super::traits::{FileSystem, Vnode};
use super::types::*;
use ahash::RandomState;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// In-memory filesystem node
#[derive(Debug, Clone)]
enum Node {
    File(Arc<[u8]>),
    Directory,
}

/// In-memory filesystem
#[derive(Debug, Clone)]
pub struct MemFs {
    nodes: Arc<DashMap<String, Node, RandomState>>,
}

impl MemFs {
    pub fn new() -> Self {
        let nodes = DashMap::with_hasher(RandomState::new());
        nodes.insert("/".to_string(), Node::Directory);
        Self {
            nodes: Arc::new(nodes),
        }
    }

    /// Normalize path (make absolute and clean)
    fn normalize(path: &str) -> VfsResult<String> {
        if path.is_empty() {
            return Err(VfsError::InvalidPath("empty path".into()));
        }
        let path = Path::new("/").join(path);
        Ok(path_clean::clean(&path).to_string_lossy().into_owned())
    }

    /// Create or replace a file, creating missing parent directories
    pub fn add_file(&self, path: &str, data: impl Into<Arc<[u8]>>) -> VfsResult<()> {
        let path = Self::normalize(path)?;
        if matches!(self.nodes.get(&path).as_deref(), Some(Node::Directory)) {
            return Err(VfsError::IsADirectory(path));
        }
        self.add_parents(&path)?;
        let data = data.into();
        debug!(path = %path, bytes = data.len(), "File installed");
        self.nodes.insert(path, Node::File(data));
        Ok(())
    }

    /// Create a directory and any missing parents
    pub fn add_dir(&self, path: &str) -> VfsResult<()> {
        let path = Self::normalize(path)?;
        self.add_parents(&path)?;
        if let Some(Node::File(_)) = self.nodes.get(&path).as_deref() {
            return Err(VfsError::InvalidPath(format!("{path} is a file")));
        }
        self.nodes.insert(path, Node::Directory);
        Ok(())
    }

    fn add_parents(&self, path: &str) -> VfsResult<()> {
        for parent in Path::new(path).ancestors().skip(1) {
            let parent = parent.to_string_lossy().into_owned();
            // the shard guard must be gone before inserting
            let is_dir = self
                .nodes
                .get(&parent)
                .map(|node| matches!(*node, Node::Directory));
            match is_dir {
                Some(true) => {}
                Some(false) => return Err(VfsError::InvalidPath(format!("{parent} is a file"))),
                None => {
                    self.nodes.insert(parent, Node::Directory);
                }
            }
        }
        Ok(())
    }

    pub fn exists(&self, path: &str) -> bool {
        Self::normalize(path)
            .map(|p| self.nodes.contains_key(&p))
            .unwrap_or(false)
    }
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemFs {
    fn open(&self, path: &str) -> VfsResult<Vnode> {
        let path = Self::normalize(path)?;
        match self.nodes.get(&path).as_deref() {
            Some(Node::File(data)) => Ok(Vnode::new(path.as_str(), Arc::clone(data))),
            Some(Node::Directory) => Err(VfsError::IsADirectory(path)),
            None => Err(VfsError::NotFound(path)),
        }
    }

    fn name(&self) -> &str {
        "memfs"
    }
}
