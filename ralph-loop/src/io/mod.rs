//! Side-effecting helpers: config and task files, the progress log, agent
//! processes and interrupt handling.

pub mod config_store;
pub mod interrupt;
pub mod invoker;
pub mod process;
pub mod progress_log;
pub mod task_store;
