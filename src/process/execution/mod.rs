/*!
 * Process Execution
 * Register state, thread binding, and entry into user mode
 */

pub mod kthread;
pub mod trapframe;
pub mod usermode;

pub use kthread::{current, Exited};
pub use trapframe::TrapFrame;
pub use usermode::{ProgramRegistry, Trap, UserContext, UserMode, UserProgram};
