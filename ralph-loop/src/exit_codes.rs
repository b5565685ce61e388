//! Stable exit codes for `ralph-loop` commands.

/// Command succeeded (including a loop that ran zero iterations).
pub const OK: i32 = 0;
/// Invalid arguments, configuration, task list, or an agent that could not be started.
pub const INVALID: i32 = 1;
/// The loop was stopped by SIGINT/SIGTERM.
pub const INTERRUPTED: i32 = 130;
