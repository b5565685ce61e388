//! Per-iteration results.

use std::fmt;
use std::time::Duration;

use crate::agent::Agent;

/// How one iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationStatus {
    /// Agent exited 0.
    Succeeded,
    /// Agent exited non-zero, or was killed by a signal (`exit_code: None`).
    Failed { exit_code: Option<i32> },
    /// Interrupted by the user; the agent was killed.
    Aborted,
    /// The agent executable could not be started.
    SpawnFailed,
}

impl IterationStatus {
    pub fn from_exit_code(exit_code: Option<i32>) -> Self {
        match exit_code {
            Some(0) => Self::Succeeded,
            other => Self::Failed { exit_code: other },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Succeeded => "ok",
            Self::Failed { .. } => "failed",
            Self::Aborted => "aborted",
            Self::SpawnFailed => "spawn-failed",
        }
    }
}

/// Summary of one iteration, written to the progress log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationRecord {
    /// 1-based.
    pub iteration: u32,
    pub iterations: u32,
    pub agent: Agent,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub status: IterationStatus,
}

impl fmt::Display for IterationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exit = match self.exit_code {
            Some(code) => code.to_string(),
            None => "-".to_string(),
        };
        write!(
            f,
            "iteration {}/{} agent={} exit={} elapsed={:.1}s status={}",
            self.iteration,
            self.iterations,
            self.agent,
            exit,
            self.elapsed.as_secs_f64(),
            self.status.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_maps_to_status() {
        assert_eq!(
            IterationStatus::from_exit_code(Some(0)),
            IterationStatus::Succeeded
        );
        assert_eq!(
            IterationStatus::from_exit_code(Some(3)),
            IterationStatus::Failed { exit_code: Some(3) }
        );
        assert_eq!(
            IterationStatus::from_exit_code(None),
            IterationStatus::Failed { exit_code: None }
        );
    }

    #[test]
    fn record_formats_as_one_line() {
        let record = IterationRecord {
            iteration: 2,
            iterations: 5,
            agent: Agent::CursorAgent,
            exit_code: Some(1),
            elapsed: Duration::from_millis(12_340),
            status: IterationStatus::Failed { exit_code: Some(1) },
        };
        assert_eq!(
            record.to_string(),
            "iteration 2/5 agent=cursor-agent exit=1 elapsed=12.3s status=failed"
        );

        let aborted = IterationRecord {
            exit_code: None,
            status: IterationStatus::Aborted,
            ..record
        };
        assert!(aborted.to_string().ends_with("exit=- elapsed=12.3s status=aborted"));
    }
}
