/*!
 * Synchronization Primitives
 *
 * Latched wait/notify primitives used by the process lifecycle:
 * - `SignalOnce`: a completion event that fires once and stays fired
 * - `WaitChannel`: a broadcast wait-point that, once released, lets every
 *   current and future sleeper through
 *
 * Both are built on `parking_lot::{Mutex, Condvar}`. Each waiter re-checks a
 * flag under the mutex, so a wakeup that happens before a waiter arrives is
 * never lost.
 */

mod event;
mod traits;
mod wchan;

pub use event::SignalOnce;
pub use traits::WakeResult;
pub use wchan::WaitChannel;
