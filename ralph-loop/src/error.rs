//! Fatal error taxonomy.
//!
//! These errors abort a command before (or instead of) running further
//! iterations. They travel inside `anyhow::Error` so call sites keep adding
//! context, and the CLI recovers them with `downcast_ref` when it needs to.
//! A non-zero agent exit is not an error: it is recorded as an
//! [`IterationStatus`](crate::core::outcome::IterationStatus) and the loop goes on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RalphError {
    /// Configuration file is unreadable, malformed, or has an invalid agent entry.
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Task list is missing or does not match the task list schema.
    #[error("invalid task list {}: {message}", path.display())]
    TaskStore { path: PathBuf, message: String },

    /// Iteration count below zero or beyond what the loop can count.
    #[error("iterations must be between 0 and {max}, got {0}", max = u32::MAX)]
    InvalidIterations(i64),

    /// The agent executable could not be started.
    #[error(
        "agent command not found: {program}. Please ensure the agent is installed and available in PATH"
    )]
    AgentUnavailable { program: String },
}

impl RalphError {
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn task_store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TaskStore {
            path: path.into(),
            message: message.into(),
        }
    }
}
