//! Read-only access to the task list (schema-validated on every read).
//!
//! The agent edits this file between iterations, so nothing here caches:
//! every query re-reads the file from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Result;
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::error::RalphError;
use crate::task::Task;

const TASKS_SCHEMA: &str = include_str!("../../schemas/tasks_list.schema.json");

/// Load and validate every task in the list.
pub fn read_tasks(path: &Path) -> Result<Vec<Task>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(RalphError::task_store(
                path,
                "file not found. Please ensure the task list exists",
            )
            .into());
        }
        Err(err) => return Err(RalphError::task_store(path, format!("read failed: {err}")).into()),
    };
    let value: Value = serde_json::from_str(&contents)
        .map_err(|err| RalphError::task_store(path, format!("parse failed: {err}")))?;
    validate_schema(path, &value)?;
    let tasks: Vec<Task> = serde_json::from_value(value)
        .map_err(|err| RalphError::task_store(path, format!("deserialize failed: {err}")))?;
    debug!(path = %path.display(), tasks = tasks.len(), "read task list");
    Ok(tasks)
}

/// Number of tasks whose `passes` flag is not `true`.
pub fn count_incomplete(path: &Path) -> Result<usize> {
    Ok(read_tasks(path)?
        .iter()
        .filter(|task| !task.is_complete())
        .count())
}

/// Incomplete tasks, most urgent first. Ties keep file order.
pub fn incomplete_tasks(path: &Path) -> Result<Vec<Task>> {
    let mut open: Vec<Task> = read_tasks(path)?
        .into_iter()
        .filter(|task| !task.is_complete())
        .collect();
    open.sort_by(Task::urgency_cmp);
    Ok(open)
}

fn validate_schema(path: &Path, tasks: &Value) -> Result<(), RalphError> {
    let schema: Value = serde_json::from_str(TASKS_SCHEMA)
        .map_err(|err| RalphError::task_store(path, format!("embedded schema: {err}")))?;
    let compiled = validator_for(&schema)
        .map_err(|err| RalphError::task_store(path, format!("invalid schema: {err}")))?;
    if compiled.is_valid(tasks) {
        return Ok(());
    }
    let messages = compiled
        .iter_errors(tasks)
        .map(|err| err.to_string())
        .collect::<Vec<_>>();
    Err(RalphError::task_store(
        path,
        format!("schema validation failed: {}", messages.join("; ")),
    ))
}
