/*!
 * Monitoring
 * Structured logging setup and per-syscall tracing spans
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_syscall, SyscallSpan};
