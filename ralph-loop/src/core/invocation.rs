//! Turning an agent entry into a concrete process invocation.
//!
//! The calling convention is the same for every agent: the configured
//! command, then the rendered instructions as the last argument.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, UndefinedBehavior, context};

use crate::agent::{Agent, OutputMode};
use crate::config::AgentConfig;

/// Values available to instruction templates.
#[derive(Debug, Clone, Copy)]
pub struct InvocationContext<'a> {
    pub agent: Agent,
    pub tasks_file: &'a Path,
    pub progress_file: &'a Path,
    /// 1-based.
    pub iteration: u32,
    pub iterations: u32,
}

/// A fully prepared agent process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub agent: Agent,
    pub program: String,
    pub args: Vec<String>,
    pub mode: OutputMode,
}

impl Invocation {
    pub fn argv(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

/// Render `instructions` for one iteration.
pub fn render_instructions(
    instructions: &str,
    ctx: &InvocationContext<'_>,
) -> Result<String, minijinja::Error> {
    environment().render_str(
        instructions,
        context! {
            agent => ctx.agent.as_str(),
            tasks_file => ctx.tasks_file.display().to_string(),
            progress_file => ctx.progress_file.display().to_string(),
            iteration => ctx.iteration,
            iterations => ctx.iterations,
        },
    )
}

/// Check that `instructions` render, using placeholder values.
pub fn check_instructions(instructions: &str) -> Result<(), minijinja::Error> {
    let probe = InvocationContext {
        agent: Agent::Claude,
        tasks_file: Path::new("tasks.json"),
        progress_file: Path::new("progress.txt"),
        iteration: 1,
        iterations: 1,
    };
    render_instructions(instructions, &probe).map(|_| ())
}

/// Build the invocation for one iteration.
pub fn prepare_invocation(config: &AgentConfig, ctx: &InvocationContext<'_>) -> Result<Invocation> {
    let (program, static_args) = config
        .command
        .split_first()
        .ok_or_else(|| anyhow!("{} command is empty", ctx.agent))?;
    let prompt = render_instructions(&config.instructions, ctx)
        .with_context(|| format!("render {} instructions", ctx.agent))?;

    let mut args = static_args.to_vec();
    args.push(prompt);
    Ok(Invocation {
        agent: ctx.agent,
        program: program.clone(),
        args,
        mode: ctx.agent.output_mode(&config.command),
    })
}
