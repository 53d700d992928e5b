/*!
 * Process Types
 * Common types for process management
 */

use crate::core::types::{Pid, WaitStatus};
use serde::{Deserialize, Serialize};

/// Identity of a parent process.
///
/// Pids are recycled, so a parent is named by its pid together with its
/// birth serial. A link never matches a later process that reuses the pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentLink {
    pub pid: Pid,
    pub serial: u64,
}

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Running user code or blocked in a syscall
    Running,
    /// Exited; status published, record still table-resident
    Zombie,
}

/// Process metadata snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Pid>,
    pub name: String,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<WaitStatus>,
}

impl ProcessInfo {
    #[inline(always)]
    #[must_use]
    pub const fn is_zombie(&self) -> bool {
        matches!(self.state, ProcessState::Zombie)
    }
}
