/*!
 * System Limits and Constants
 *
 * Centralized location for system-wide limits and machine constants.
 * Runtime-tunable values have defaults here and are overridden through
 * `KernelConfig`.
 */

use super::types::Address;

// =============================================================================
// PROCESS LIMITS
// =============================================================================

/// Lowest pid handed out to user processes (0 and 1 are reserved)
pub const PID_MIN: u32 = 2;

/// Highest pid handed out to user processes
pub const PID_MAX: u32 = 32767;

/// Exit code used when user mode hits an address with no program behind it
pub const FAULT_EXIT_CODE: i32 = 255;

// =============================================================================
// MEMORY LAYOUT
// =============================================================================

/// Page size of the simulated MMU
pub const PAGE_SIZE: usize = 4096;

/// Default frame budget of the simulated physical memory (64MB)
pub const DEFAULT_MAX_FRAMES: usize = 16 * 1024;

/// Top of the user stack; the stack grows down from here
pub const USERSTACK: Address = 0x8000_0000;

/// Default number of stack pages per process; holds a full `ARG_MAX` vector
pub const DEFAULT_STACK_PAGES: usize = 18;

/// Largest user stack a configuration may ask for (16MB)
pub const MAX_STACK_PAGES: usize = 4096;

/// Stack pointer alignment required at user-mode entry
pub const STACK_ALIGN: u64 = 16;

/// Size of a user pointer in bytes
pub const POINTER_SIZE: u64 = 8;

/// Size of one machine instruction; syscalls resume at `pc + INSTRUCTION_SIZE`
pub const INSTRUCTION_SIZE: u64 = 4;

// =============================================================================
// EXEC LIMITS
// =============================================================================

/// Maximum total size of exec arguments (strings, terminators, pointer slots)
pub const ARG_MAX: usize = 64 * 1024;

/// Stack bytes an argument vector may need beyond its footprint: one
/// alignment pad under the strings and one under the pointer array
pub const ARGV_ALIGN_SLACK: usize = 2 * STACK_ALIGN as usize;

/// Maximum length of a path, including the terminator
pub const PATH_MAX: usize = 1024;
