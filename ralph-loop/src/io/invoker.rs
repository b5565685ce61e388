//! Invoker abstraction for agent execution.
//!
//! The [`Invoker`] trait decouples loop orchestration from actually spawning
//! agents. Tests use scripted invokers that return predetermined outcomes
//! without starting processes.

use std::io;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::agent::OutputMode;
use crate::core::invocation::Invocation;
use crate::core::render::StreamRenderer;
use crate::core::stream::{ProgressEvent, classify_line};
use crate::io::interrupt::Interrupt;
use crate::io::process::{ProcessOutcome, run_inherited, run_streaming};

/// Abstraction over agent execution backends.
pub trait Invoker {
    /// Run one invocation to completion (or until `interrupt` is set).
    ///
    /// A non-zero exit is reported in the outcome, not as an error.
    fn invoke(&self, invocation: &Invocation, interrupt: &Interrupt) -> Result<ProcessOutcome>;
}

/// Invoker that spawns the configured command and renders to stdout.
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
    #[instrument(skip_all, fields(agent = %invocation.agent, mode = ?invocation.mode))]
    fn invoke(&self, invocation: &Invocation, interrupt: &Interrupt) -> Result<ProcessOutcome> {
        info!(program = %invocation.program, "starting agent");
        match invocation.mode {
            OutputMode::Inherit => run_inherited(invocation, interrupt),
            OutputMode::StreamJson => {
                let mut renderer = StreamRenderer::new(io::stdout());
                let outcome = run_streaming(invocation, interrupt, |line| {
                    let event = classify_line(line);
                    match &event {
                        ProgressEvent::Raw { line } => {
                            debug!(line, "unrecognized stream line, passing through");
                        }
                        ProgressEvent::Passive { kind } => debug!(kind, "passive stream event"),
                        _ => {}
                    }
                    renderer.render(&event).context("render agent progress")
                })?;
                renderer.finish().context("render agent progress")?;
                let stats = renderer.stats();
                debug!(
                    tool_calls = stats.tool_calls,
                    generated_chars = stats.generated_chars,
                    raw_lines = stats.raw_lines,
                    "stream finished"
                );
                Ok(outcome)
            }
        }
    }
}
