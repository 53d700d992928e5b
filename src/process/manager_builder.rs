/*!
 * Process Manager Builder
 * Builder pattern for ProcessManager construction
 */

use super::execution::{ProgramRegistry, UserMode};
use super::manager::ProcessManager;
use crate::core::config::{ConfigError, KernelConfig};
use crate::memory::{SimVm, VirtualMemory};
use crate::vfs::{FileSystem, MemFs};
use std::sync::Arc;
use tracing::info;

/// Builder for ProcessManager
pub struct ProcessManagerBuilder {
    config: KernelConfig,
    vm: Option<Arc<dyn VirtualMemory>>,
    fs: Option<Arc<dyn FileSystem>>,
    usermode: Option<Arc<dyn UserMode>>,
}

impl ProcessManagerBuilder {
    /// Create a new ProcessManager builder
    pub fn new() -> Self {
        Self {
            config: KernelConfig::default(),
            vm: None,
            fs: None,
            usermode: None,
        }
    }

    /// Use `config` for limits and for the default collaborators
    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a VM system (defaults to `SimVm` sized by `max_frames`)
    pub fn with_vm(mut self, vm: Arc<dyn VirtualMemory>) -> Self {
        self.vm = Some(vm);
        self
    }

    /// Add a file system (defaults to an empty `MemFs`)
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Add the user-mode implementation (defaults to an empty `ProgramRegistry`)
    pub fn with_user_mode(mut self, usermode: Arc<dyn UserMode>) -> Self {
        self.usermode = Some(usermode);
        self
    }

    /// Build the ProcessManager
    pub fn build(self) -> Result<ProcessManager, ConfigError> {
        self.config.validate()?;

        let mut defaults = Vec::new();
        let vm = self.vm.unwrap_or_else(|| {
            defaults.push("vm");
            Arc::new(SimVm::new(self.config.max_frames))
        });
        let fs = self.fs.unwrap_or_else(|| {
            defaults.push("fs");
            Arc::new(MemFs::new())
        });
        let usermode = self.usermode.unwrap_or_else(|| {
            defaults.push("usermode");
            Arc::new(ProgramRegistry::new())
        });

        info!(
            pid_min = self.config.pid_min,
            pid_max = self.config.pid_max,
            max_frames = self.config.max_frames,
            fs = fs.name(),
            defaults = ?defaults,
            "Process manager initialized"
        );
        Ok(ProcessManager::from_parts(self.config, vm, fs, usermode))
    }
}

impl Default for ProcessManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
