/*!
 * Process Lifecycle
 * fork, exec, exit, waitpid and the initial-process bootstrap
 */

mod bootstrap;
mod exec;
mod exit;
mod fork;
mod wait;
