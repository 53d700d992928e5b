/*!
 * Virtual File System
 * File system collaborator used by exec to open program images
 */

pub mod memory;
pub mod traits;
pub mod types;

pub use memory::MemFs;
pub use traits::{FileSystem, Vnode};
pub use types::{VfsError, VfsResult};
