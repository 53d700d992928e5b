/*!
 * Memory Module
 * Virtual-memory collaborator: frames, address spaces, and the VM interface
 */

pub mod addrspace;
pub mod frames;
pub mod traits;
pub mod types;
pub mod vm;

// Re-export for convenience
pub use addrspace::AddrSpace;
pub use frames::{FrameLease, FramePool};
pub use traits::*;
pub use types::*;
pub use vm::{active_space, SimVm};
