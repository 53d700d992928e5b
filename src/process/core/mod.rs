/*!
 * Process Core
 * Process record, table, and their types
 */

pub mod record;
pub mod table;
pub mod types;

pub use record::Process;
pub use table::ProcessTable;
pub use types::{ParentLink, ProcessInfo, ProcessState};
