//! The iteration loop behind `ralph-loop run`.
//!
//! Each iteration moves through `Preparing -> Invoking -> Recording`; the
//! loop ends after the requested number of iterations, on interrupt, or on
//! the first failure when `failure_policy` is `stop`. Iterations never
//! overlap.

use std::fmt;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::config::{FailurePolicy, RalphConfig};
use crate::core::invocation::{InvocationContext, prepare_invocation};
use crate::core::outcome::{IterationRecord, IterationStatus};
use crate::error::RalphError;
use crate::io::interrupt::Interrupt;
use crate::io::invoker::Invoker;
use crate::io::progress_log::ProgressLog;

/// Where an iteration is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Preparing,
    Invoking,
    Recording,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopPhase::Preparing => "preparing",
            LoopPhase::Invoking => "invoking",
            LoopPhase::Recording => "recording",
        })
    }
}

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// Every requested iteration ran (trivially true for zero).
    Completed,
    /// `failure_policy = stop` and an agent exited non-zero.
    StoppedOnFailure {
        iteration: u32,
        exit_code: Option<i32>,
    },
    /// SIGINT/SIGTERM arrived.
    Interrupted,
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub iterations: u32,
    /// Iterations whose agent ran to exit, successful or not.
    pub finished: u32,
    pub failed: u32,
    pub stop: LoopStop,
    pub records: Vec<IterationRecord>,
}

/// Progress notifications for the caller's console output.
#[derive(Debug)]
pub enum LoopEvent<'a> {
    Started { iteration: u32, iterations: u32 },
    Recorded(&'a IterationRecord),
}

pub struct LoopRequest<'a> {
    pub config: &'a RalphConfig,
    pub agent: Agent,
    pub iterations: u32,
}

/// Run the selected agent `request.iterations` times.
///
/// Agent failures are recorded and, by default, the loop moves on. Errors
/// are returned only for things that make further iterations pointless:
/// an unusable progress log, a template that fails to render, or an agent
/// executable that cannot be started.
pub fn run_loop<I: Invoker, F: FnMut(LoopEvent<'_>)>(
    request: &LoopRequest<'_>,
    invoker: &I,
    interrupt: &Interrupt,
    mut on_event: F,
) -> Result<LoopOutcome> {
    let iterations = request.iterations;
    let mut outcome = LoopOutcome {
        iterations,
        finished: 0,
        failed: 0,
        stop: LoopStop::Completed,
        records: Vec::new(),
    };
    if iterations == 0 {
        info!("zero iterations requested");
        return Ok(outcome);
    }

    let config = request.config;
    let agent_config = config.agent(request.agent);
    let mut log = ProgressLog::open(&config.progress_file)?;

    for iteration in 1..=iterations {
        if interrupt.is_set() {
            outcome.stop = LoopStop::Interrupted;
            break;
        }
        on_event(LoopEvent::Started {
            iteration,
            iterations,
        });

        debug!(iteration, phase = %LoopPhase::Preparing, "iteration phase");
        let ctx = InvocationContext {
            agent: request.agent,
            tasks_file: &config.tasks_file,
            progress_file: &config.progress_file,
            iteration,
            iterations,
        };
        let invocation = prepare_invocation(agent_config, &ctx)
            .with_context(|| format!("iteration {iteration} ({})", LoopPhase::Preparing))?;

        debug!(iteration, phase = %LoopPhase::Invoking, "iteration phase");
        let started = Instant::now();
        let result = invoker.invoke(&invocation, interrupt);

        debug!(iteration, phase = %LoopPhase::Recording, "iteration phase");
        let (exit_code, status) = match result {
            Ok(process) if process.interrupted || interrupt.is_set() => {
                (process.exit_code, IterationStatus::Aborted)
            }
            Ok(process) => (
                process.exit_code,
                IterationStatus::from_exit_code(process.exit_code),
            ),
            Err(err) => {
                if matches!(
                    err.downcast_ref::<RalphError>(),
                    Some(RalphError::AgentUnavailable { .. })
                ) {
                    let record = IterationRecord {
                        iteration,
                        iterations,
                        agent: request.agent,
                        exit_code: None,
                        elapsed: started.elapsed(),
                        status: IterationStatus::SpawnFailed,
                    };
                    if let Err(log_err) = log.append(&record) {
                        warn!(err = %format!("{log_err:#}"), "could not record spawn failure");
                    }
                }
                return Err(err)
                    .with_context(|| format!("iteration {iteration} ({})", LoopPhase::Invoking));
            }
        };

        let record = IterationRecord {
            iteration,
            iterations,
            agent: request.agent,
            exit_code,
            elapsed: started.elapsed(),
            status,
        };
        log.append(&record)
            .with_context(|| format!("iteration {iteration} ({})", LoopPhase::Recording))?;
        on_event(LoopEvent::Recorded(&record));
        outcome.records.push(record);

        match status {
            IterationStatus::Succeeded => outcome.finished += 1,
            IterationStatus::Failed { exit_code } => {
                outcome.finished += 1;
                outcome.failed += 1;
                warn!(iteration, ?exit_code, "agent exited unsuccessfully");
                if config.failure_policy == FailurePolicy::Stop {
                    outcome.stop = LoopStop::StoppedOnFailure {
                        iteration,
                        exit_code,
                    };
                    break;
                }
            }
            // Spawn failures already returned above.
            IterationStatus::Aborted | IterationStatus::SpawnFailed => {
                outcome.stop = LoopStop::Interrupted;
                break;
            }
        }
    }

    info!(
        finished = outcome.finished,
        failed = outcome.failed,
        stop = ?outcome.stop,
        "loop finished"
    );
    Ok(outcome)
}
