/*!
 * Syscall Dispatcher
 *
 * Decodes a trapframe, runs the call, and writes the result back using the
 * MIPS convention: `v0` holds the value or errno, `a3` is 0 on success and
 * 1 on failure, and `pc` advances past the trapping instruction.
 */

use super::types::{Dispatch, Syscall};
use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, Pid, UserPtr};
use crate::monitoring::span_syscall;
use crate::process::{current, Exited, ProcessManager, TrapFrame};
use tracing::{debug, warn};

enum Outcome {
    Value(u64),
    Exited(Exited),
}

/// Handle the system call trapped in `tf`
pub fn dispatch(kernel: &ProcessManager, tf: &mut TrapFrame) -> Dispatch {
    let Some(call) = Syscall::from_number(tf.v0) else {
        warn!(number = tf.v0, "Unknown system call");
        tf.set_return(Err(KernelError::UnknownSyscall(tf.v0).errno()));
        tf.advance_pc();
        return Dispatch::Returned;
    };

    let pid = current().map_or(0, |process| process.pid().0);
    let span = span_syscall(call.name(), pid);
    let span = if call.may_block() { span.blocking() } else { span };
    let _entered = span.enter();

    match run(kernel, call, tf) {
        Ok(Outcome::Exited(token)) => {
            span.record_exit();
            Dispatch::Exited(token)
        }
        Ok(Outcome::Value(value)) => {
            span.record_return(value);
            tf.set_return(Ok(value));
            tf.advance_pc();
            Dispatch::Returned
        }
        Err(e) => {
            let errno = e.errno();
            span.record_errno(errno.code());
            debug!(syscall = %call, error = %e, "System call failed");
            if e.is_fatal() {
                // Nothing left to return to
                let code = errno.code();
                return Dispatch::Exited(kernel.sys_exit(code));
            }
            tf.set_return(Err(errno));
            tf.advance_pc();
            Dispatch::Returned
        }
    }
}

fn run(kernel: &ProcessManager, call: Syscall, tf: &TrapFrame) -> KernelResult<Outcome> {
    match call {
        Syscall::Fork => kernel
            .sys_fork(tf)
            .map(|pid| Outcome::Value(u64::from(pid))),
        Syscall::Execv => kernel
            .sys_execv(UserPtr(tf.a0), UserPtr(tf.a1))
            .map(Outcome::Exited),
        Syscall::Exit => Ok(Outcome::Exited(kernel.sys_exit(tf.a0 as i32))),
        Syscall::WaitPid => {
            let pid = u32::try_from(tf.a0)
                .map_err(|_| KernelError::InvalidArgument(format!("pid {:#x} out of range", tf.a0)))?;
            let options = i32::try_from(tf.a2 as i64).map_err(|_| {
                KernelError::InvalidArgument(format!("options {:#x} out of range", tf.a2))
            })?;
            kernel
                .sys_waitpid(Pid(pid), UserPtr(tf.a1), options)
                .map(|pid| Outcome::Value(u64::from(pid)))
        }
        Syscall::GetPid => Ok(Outcome::Value(u64::from(kernel.sys_getpid()))),
    }
}
