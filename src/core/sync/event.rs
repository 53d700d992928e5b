/*!
 * Signal-Once Event
 *
 * Completion event that transitions once from pending to signaled and then
 * stays signaled. Any number of observers, arriving before or after the
 * transition, see completion without consuming it.
 */

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Latched completion event
#[derive(Debug, Default)]
pub struct SignalOnce {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl SignalOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the event and wake every waiter.
    ///
    /// Returns `true` on the first call, `false` if already signaled.
    pub fn signal(&self) -> bool {
        let mut signaled = self.signaled.lock();
        if *signaled {
            return false;
        }
        *signaled = true;
        drop(signaled);
        self.cond.notify_all();
        true
    }

    #[inline]
    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }

    /// Block until signaled. Returns immediately if it already was.
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.cond.wait(&mut signaled);
        }
    }

    /// Bounded `wait`. Returns `true` if the event is signaled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock();
        while !*signaled {
            if self.cond.wait_until(&mut signaled, deadline).timed_out() {
                return *signaled;
            }
        }
        true
    }
}
