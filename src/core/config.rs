/*!
 * Kernel Configuration
 *
 * Runtime configuration for the process subsystem and its simulated
 * collaborators. Defaults come from `core::limits`; overrides come from the
 * environment or a JSON document.
 */

use super::limits;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid pid range: {min}..={max}")]
    InvalidPidRange { min: u32, max: u32 },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Malformed config document: {0}")]
    Parse(String),
}

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KernelConfig {
    /// Lowest pid handed out
    pub pid_min: u32,
    /// Highest pid handed out
    pub pid_max: u32,
    /// Frames available to all address spaces combined
    pub max_frames: usize,
    /// Pages in each user stack
    pub stack_pages: usize,
    /// Limit on total exec argument size
    pub arg_max: usize,
    /// Limit on exec path length
    pub path_max: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            pid_min: limits::PID_MIN,
            pid_max: limits::PID_MAX,
            max_frames: limits::DEFAULT_MAX_FRAMES,
            stack_pages: limits::DEFAULT_STACK_PAGES,
            arg_max: limits::ARG_MAX,
            path_max: limits::PATH_MAX,
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by environment variables:
    ///
    /// - `KERNEL_PID_MAX`
    /// - `KERNEL_MAX_FRAMES`
    /// - `KERNEL_STACK_PAGES`
    /// - `KERNEL_ARG_MAX`
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_value("KERNEL_PID_MAX") {
            config.pid_max = v;
        }
        if let Some(v) = env_value("KERNEL_MAX_FRAMES") {
            config.max_frames = v;
        }
        if let Some(v) = env_value("KERNEL_STACK_PAGES") {
            config.stack_pages = v;
        }
        if let Some(v) = env_value("KERNEL_ARG_MAX") {
            config.arg_max = v;
        }
        config
    }

    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Number of pids the table can hold
    #[inline]
    #[must_use]
    pub const fn pid_capacity(&self) -> usize {
        (self.pid_max - self.pid_min + 1) as usize
    }

    /// Bytes in each user stack
    #[inline]
    #[must_use]
    pub const fn stack_bytes(&self) -> usize {
        self.stack_pages * limits::PAGE_SIZE
    }

    /// Whether an argument vector of `footprint` bytes can be laid out on
    /// a fresh stack
    #[inline]
    #[must_use]
    pub const fn argv_fits_stack(&self, footprint: usize) -> bool {
        footprint.saturating_add(limits::ARGV_ALIGN_SLACK) <= self.stack_bytes()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pid_min == 0 || self.pid_min > self.pid_max {
            return Err(ConfigError::InvalidPidRange {
                min: self.pid_min,
                max: self.pid_max,
            });
        }
        if self.stack_pages == 0 || self.stack_pages > limits::MAX_STACK_PAGES {
            return Err(ConfigError::InvalidValue {
                key: "stack_pages",
                reason: format!("must be between 1 and {} pages", limits::MAX_STACK_PAGES),
            });
        }
        if self.max_frames < self.stack_pages {
            return Err(ConfigError::InvalidValue {
                key: "max_frames",
                reason: format!("cannot hold a {}-page stack", self.stack_pages),
            });
        }
        if !self.argv_fits_stack(self.arg_max) {
            return Err(ConfigError::InvalidValue {
                key: "arg_max",
                reason: format!(
                    "{} bytes of arguments do not fit a {}-page stack",
                    self.arg_max, self.stack_pages
                ),
            });
        }
        if self.path_max < 2 {
            return Err(ConfigError::InvalidValue {
                key: "path_max",
                reason: "must fit at least one character and a terminator".into(),
            });
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn with_pid_range(mut self, min: u32, max: u32) -> Self {
        self.pid_min = min;
        self.pid_max = max;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_frames(mut self, frames: usize) -> Self {
        self.max_frames = frames;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_stack_pages(mut self, pages: usize) -> Self {
        self.stack_pages = pages;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_arg_max(mut self, arg_max: usize) -> Self {
        self.arg_max = arg_max;
        self
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable config override");
            None
        }
    }
}
