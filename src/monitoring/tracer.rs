/*!
 * Syscall Tracing
 * Structured tracing for system calls using the tracing crate
 *
 * Features:
 * - Trace ID per syscall for correlating the lines one call produces
 * - JSON-formatted logs for structured parsing
 * - Thread names in every line, so each process's activity can be followed
 */

use std::time::Instant;
use tracing::{debug, field, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Syscalls that take longer than this without blocking get a warning
const SLOW_SYSCALL_MS: u128 = 10;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output (default: false)
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one system call from trap to return
pub struct SyscallSpan {
    span: Span,
    start: Instant,
    syscall_name: &'static str,
    trace_id: String,
    blocking: bool,
}

impl SyscallSpan {
    pub fn new(syscall_name: &'static str, pid: u32) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "syscall",
            trace_id = %trace_id,
            syscall = syscall_name,
            pid = pid,
            duration_us = field::Empty,
            result = field::Empty,
            errno = field::Empty,
            return_value = field::Empty,
        );

        let entered = span.enter();
        debug!(syscall = syscall_name, pid, "syscall started");
        drop(entered);

        Self {
            span,
            start: Instant::now(),
            syscall_name,
            trace_id,
            blocking: false,
        }
    }

    /// Mark the call as one that may sleep; it is exempt from the slow-call
    /// warning
    #[must_use]
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_return(&self, value: u64) {
        self.span.record("return_value", value);
        self.span.record("result", "success");
    }

    pub fn record_errno(&self, errno: i32) {
        self.span.record("errno", errno);
        self.span.record("result", "error");
    }

    pub fn record_exit(&self) {
        self.span.record("result", "exited");
    }

    /// Enter the span context
    pub fn enter(&self) -> span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if !self.blocking && duration.as_millis() > SLOW_SYSCALL_MS {
            warn!(
                trace_id = %self.trace_id,
                syscall = self.syscall_name,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow syscall detected"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                syscall = self.syscall_name,
                duration_us = duration.as_micros() as u64,
                "syscall completed"
            );
        }
    }
}

/// Helper to create a syscall span
#[inline]
pub fn span_syscall(name: &'static str, pid: u32) -> SyscallSpan {
    SyscallSpan::new(name, pid)
}
