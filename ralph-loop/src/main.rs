//! `ralph-loop`: run an AI coding agent once per open task.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use ralph_loop::agent::Agent;
use ralph_loop::config::{DEFAULT_CONFIG_PATH, RalphConfig};
use ralph_loop::core::iterations::resolve_iteration_count;
use ralph_loop::core::outcome::IterationStatus;
use ralph_loop::exit_codes;
use ralph_loop::io::config_store::{ConfigSource, effective_config, save_config};
use ralph_loop::io::interrupt::Interrupt;
use ralph_loop::io::invoker::ProcessInvoker;
use ralph_loop::io::task_store::{count_incomplete, incomplete_tasks};
use ralph_loop::logging;
use ralph_loop::looping::{LoopEvent, LoopRequest, LoopStop, run_loop};

const SEPARATOR: &str = "----------------------------------------";

#[derive(Parser)]
#[command(
    name = "ralph-loop",
    version,
    about = "CLI utility for running AI agent loops on task queues"
)]
struct Cli {
    /// Debug-level diagnostics on stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the agent loop.
    Run {
        /// Agent to run.
        #[arg(value_enum)]
        agent: Agent,
        /// Number of iterations (defaults to the number of incomplete tasks).
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        iterations: Option<i64>,
        /// Configuration file (defaults to .ralph/ralph_config.json).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the effective configuration, or recreate the file with defaults.
    Config {
        /// Overwrite the configuration file with default values.
        #[arg(long)]
        recreate: bool,
        /// Configuration file (defaults to .ralph/ralph_config.json).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run {
            agent,
            iterations,
            config,
        } => cmd_run(agent, iterations, config.as_deref()),
        Command::Config { recreate, config } => cmd_config(recreate, config.as_deref()),
    }
}

fn cmd_run(agent: Agent, explicit: Option<i64>, config_path: Option<&Path>) -> Result<i32> {
    let (cfg, _) = effective_config(config_path)?;
    let tasks_file = cfg.tasks_file.as_path();

    let iterations = resolve_iteration_count(explicit, || count_incomplete(tasks_file))?;
    if iterations == 0 {
        match explicit {
            None => println!(
                "No incomplete tasks found in {} (all items have passes: true)\nNothing to do. Exiting.",
                tasks_file.display()
            ),
            Some(_) => println!("0 iterations requested. Nothing to do. Exiting."),
        }
        return Ok(exit_codes::OK);
    }
    // With an explicit count the task list is optional; report it when readable.
    match incomplete_tasks(tasks_file) {
        Ok(open) => {
            println!("Found {} incomplete task(s) to work on", open.len());
            if let Some(next) = open.first() {
                println!("Most urgent open task: {}", next.label());
            }
        }
        Err(err) => warn!(err = %format!("{err:#}"), "task list not readable"),
    }

    let interrupt = Interrupt::install()?;
    let request = LoopRequest {
        config: &cfg,
        agent,
        iterations,
    };
    let outcome = run_loop(&request, &ProcessInvoker, &interrupt, print_loop_event)?;

    match outcome.stop {
        LoopStop::Completed => println!("All {iterations} iteration(s) completed"),
        LoopStop::StoppedOnFailure {
            iteration,
            exit_code,
        } => println!(
            "Stopping after iteration {iteration}: agent exited with {} (failure_policy = stop)",
            describe_exit(exit_code)
        ),
        LoopStop::Interrupted => {
            println!("\nInterrupted after {} iteration(s)", outcome.finished);
            return Ok(exit_codes::INTERRUPTED);
        }
    }
    match count_incomplete(tasks_file) {
        Ok(remaining) => println!("{remaining} incomplete task(s) remain"),
        Err(err) => warn!(err = %format!("{err:#}"), "could not re-read task list"),
    }
    Ok(exit_codes::OK)
}

fn print_loop_event(event: LoopEvent<'_>) {
    match event {
        LoopEvent::Started {
            iteration,
            iterations,
        } => println!("Iteration {iteration} of {iterations}"),
        LoopEvent::Recorded(record) => {
            match record.status {
                IterationStatus::Succeeded => println!("Completed iteration {}", record.iteration),
                IterationStatus::Failed { exit_code } => println!(
                    "Iteration {} exited with {}",
                    record.iteration,
                    describe_exit(exit_code)
                ),
                IterationStatus::Aborted | IterationStatus::SpawnFailed => return,
            }
            println!("{SEPARATOR}");
        }
    }
}

fn describe_exit(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

fn cmd_config(recreate: bool, config_path: Option<&Path>) -> Result<i32> {
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

    if recreate {
        save_config(path, &RalphConfig::default())?;
        println!("Configuration file created at: {}", path.display());
        println!("\nYou can edit this file to customize agent commands and instructions.");
        return Ok(exit_codes::OK);
    }

    let (cfg, source) = effective_config(Some(path))?;
    match source {
        ConfigSource::File(path) => {
            println!("Configuration file exists at: {}", path.display());
            println!("To recreate with defaults, run: ralph-loop config --recreate\n");
        }
        ConfigSource::Defaults(path) => {
            println!(
                "Configuration file not found at: {} (showing built-in defaults)",
                path.display()
            );
            println!("To create it, run: ralph-loop config --recreate\n");
        }
    }
    let rendered = serde_json::to_string_pretty(&cfg).context("serialize config json")?;
    println!("{rendered}");
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_defaults() {
        let cli = Cli::parse_from(["ralph-loop", "run", "claude"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                agent: Agent::Claude,
                iterations: None,
                config: None
            }
        ));
    }

    #[test]
    fn parse_run_with_options() {
        let cli = Cli::parse_from([
            "ralph-loop",
            "run",
            "cursor-agent",
            "-n",
            "3",
            "--config",
            "custom.json",
        ]);
        match cli.command {
            Command::Run {
                agent,
                iterations,
                config,
            } => {
                assert_eq!(agent, Agent::CursorAgent);
                assert_eq!(iterations, Some(3));
                assert_eq!(config, Some(PathBuf::from("custom.json")));
            }
            Command::Config { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn parse_negative_iterations_reaches_validation() {
        let cli = Cli::parse_from(["ralph-loop", "run", "opencode", "--iterations", "-2"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                iterations: Some(-2),
                ..
            }
        ));
    }

    #[test]
    fn unknown_agent_lists_choices() {
        let err = Cli::try_parse_from(["ralph-loop", "run", "codex"])
            .err()
            .expect("parse error");
        let rendered = err.to_string();
        assert!(rendered.contains("claude"));
        assert!(rendered.contains("cursor-agent"));
        assert!(rendered.contains("opencode"));
    }

    #[test]
    fn parse_config_recreate() {
        let cli = Cli::parse_from(["ralph-loop", "config", "--recreate"]);
        assert!(matches!(
            cli.command,
            Command::Config {
                recreate: true,
                config: None
            }
        ));
    }

    #[test]
    fn exit_description() {
        assert_eq!(describe_exit(Some(2)), "code 2");
        assert_eq!(describe_exit(None), "a signal");
    }
}
