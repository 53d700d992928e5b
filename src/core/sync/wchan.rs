/*!
 * Broadcast Wait Channel
 *
 * Wait-point on which any number of threads may sleep until the channel is
 * released. Release is latched: a thread that arrives after `wake_all` does
 * not sleep at all.
 */

use super::traits::WakeResult;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct ChannelState {
    released: bool,
    sleepers: usize,
}

/// Latched broadcast wait-point
#[derive(Debug, Default)]
pub struct WaitChannel {
    state: Mutex<ChannelState>,
    cond: Condvar,
}

impl WaitChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep until the channel is released
    pub fn sleep(&self) {
        let mut state = self.state.lock();
        if state.released {
            return;
        }
        state.sleepers += 1;
        while !state.released {
            self.cond.wait(&mut state);
        }
        state.sleepers -= 1;
    }

    /// Bounded `sleep`. Returns `true` if the channel was released.
    pub fn sleep_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        if state.released {
            return true;
        }
        state.sleepers += 1;
        while !state.released {
            if self.cond.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.sleepers -= 1;
        state.released
    }

    /// Release the channel and wake everyone sleeping on it
    pub fn wake_all(&self) -> WakeResult {
        let mut state = self.state.lock();
        state.released = true;
        let woken = state.sleepers;
        drop(state);
        self.cond.notify_all();
        WakeResult::from_count(woken)
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Number of threads currently asleep (diagnostics)
    #[inline]
    pub fn sleepers(&self) -> usize {
        self.state.lock().sleepers
    }
}
