/*!
 * Memory Traits
 * Virtual-memory collaborator interface consumed by the process subsystem
 */

use super::addrspace::AddrSpace;
use super::types::*;

/// Address-space lifecycle operations
///
/// The process subsystem never touches page tables itself; it only asks the
/// VM system to create, duplicate, switch and destroy whole address spaces.
pub trait VirtualMemory: Send + Sync {
    /// Create an empty address space
    fn create(&self) -> MemoryResult<AddrSpace>;

    /// Duplicate `src` into fresh, unaliased memory
    fn copy(&self, src: &AddrSpace) -> MemoryResult<AddrSpace>;

    /// Release an address space and all of its frames
    fn destroy(&self, space: AddrSpace);

    /// Make `space` the one the calling context runs in
    fn activate(&self, space: &AddrSpace);

    /// Detach the calling context from whatever space is active
    fn deactivate(&self);

    /// Frame pool statistics
    fn stats(&self) -> MemoryStats;
}
