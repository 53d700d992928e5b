/*!
 * Kernel Threads
 *
 * Each process runs on its own host thread. The thread is bound to its
 * process record through a thread-local slot, which is how syscalls find
 * the calling process.
 */

use crate::process::core::Process;
use std::cell::RefCell;
use std::io;
use std::sync::Arc;
use std::thread;

thread_local! {
    static CURPROC: RefCell<Option<Arc<Process>>> = const { RefCell::new(None) };
}

/// Proof that a process has run `exit`.
///
/// Only the exit path can produce one. Entry functions of process threads
/// must return it, so a thread cannot leave user mode without exiting.
#[must_use = "a process thread must return the token it got from exit"]
#[derive(Debug)]
pub struct Exited {
    _private: (),
}

impl Exited {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Process bound to the calling thread
pub fn current() -> Option<Arc<Process>> {
    CURPROC.with(|slot| slot.borrow().clone())
}

/// Bind the calling thread to `process`
///
/// # Panics
///
/// If the thread is already bound to a process
pub(crate) fn bind(process: Arc<Process>) {
    CURPROC.with(|slot| {
        let mut slot = slot.borrow_mut();
        assert!(
            slot.is_none(),
            "thread already bound to pid {}",
            slot.as_ref().map_or(0, |p| p.pid().0)
        );
        *slot = Some(process);
    });
}

/// Detach the calling thread from its process
pub(crate) fn unbind() -> Option<Arc<Process>> {
    CURPROC.with(|slot| slot.borrow_mut().take())
}

/// Start a thread for `process` that binds to it and runs `entry`
pub(crate) fn spawn<F>(process: Arc<Process>, entry: F) -> io::Result<()>
where
    F: FnOnce() -> Exited + Send + 'static,
{
    let name = format!("proc-{}", process.pid());
    thread::Builder::new().name(name).spawn(move || {
        bind(process);
        let _exited: Exited = entry();
    })?;
    Ok(())
}
