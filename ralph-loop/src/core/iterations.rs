//! Iteration count resolution.

use anyhow::Result;

use crate::error::RalphError;

/// Decide how many iterations to run.
///
/// An explicit count wins and never consults the task list. Otherwise the
/// number of incomplete tasks is used, computed lazily so that a run with an
/// explicit count does not require the task file to exist.
pub fn resolve_iteration_count<F>(explicit: Option<i64>, count_incomplete: F) -> Result<u32>
where
    F: FnOnce() -> Result<usize>,
{
    let resolved = match explicit {
        Some(requested) => requested,
        None => i64::try_from(count_incomplete()?).unwrap_or(i64::MAX),
    };
    u32::try_from(resolved)
        .map_err(|_| anyhow::Error::from(RalphError::InvalidIterations(resolved)))
}
