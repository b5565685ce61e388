//! Run an AI coding agent repeatedly over a JSON task list.
//!
//! Each iteration invokes one external agent (`claude`, `cursor-agent`,
//! `opencode`) with fixed instructions; the agent picks an open task, works
//! on it and flips its `passes` flag. By default the loop runs once per
//! incomplete task.
//!
//! - **[`core`]**: Pure logic (iteration count, invocation building, stream
//!   classification and rendering). No I/O.
//! - **[`io`]**: Config and task files, the progress log, agent processes,
//!   interrupt handling.
//!
//! [`looping`] ties the two together for `ralph-loop run`.

pub mod agent;
pub mod config;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod task;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
