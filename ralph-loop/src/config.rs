//! Loop configuration: per-agent command lines and shared file locations.
//!
//! The on-disk form is JSON (`.ralph/ralph_config.json`); see
//! [`crate::io::config_store`] for loading and saving.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::core::invocation::check_instructions;
use crate::error::RalphError;

pub const DEFAULT_CONFIG_PATH: &str = ".ralph/ralph_config.json";
pub const DEFAULT_TASKS_FILE: &str = ".ralph/tasks_list.json";
pub const DEFAULT_PROGRESS_FILE: &str = ".ralph/progress_tasks.txt";

/// How one agent is invoked.
///
/// Both fields are required when an agent entry appears in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    /// Executable followed by its static arguments.
    pub command: Vec<String>,
    /// Prompt appended as the final argument. May reference `{{ tasks_file }}`,
    /// `{{ progress_file }}`, `{{ agent }}`, `{{ iteration }}` and `{{ iterations }}`.
    pub instructions: String,
}

/// What to do after an agent exits non-zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and start the next iteration.
    #[default]
    Continue,
    /// Record the failure and end the loop.
    Stop,
}

/// Root configuration. Built once per command and never mutated during a run.
///
/// Absent top-level keys take their defaults and unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RalphConfig {
    pub tasks_file: PathBuf,
    pub progress_file: PathBuf,
    pub failure_policy: FailurePolicy,
    pub claude: AgentConfig,
    #[serde(rename = "cursor-agent", alias = "cursor_agent")]
    pub cursor_agent: AgentConfig,
    pub opencode: AgentConfig,
}

const INSTRUCTIONS: &str = r#"Initial tasks

  - Run `pwd` to see the directory you are working in. You will only be able to edit files in this directory.
  - Read @CLAUDE.md in the repository root, the git logs and @{{ progress_file }} to get up to speed on what was recently worked on.
  - Read the @{{ tasks_file }} list file and choose the single highest-priority feature (lowest "priority" number) that is not yet done to work on.
  - Do not work on multiple features at once.

  Then, work on that feature only.

  Once complete, you may update that single feature object "passes" property to true.

  Update `{{ progress_file }}` with a 3-4 lines summary of what has been done. Be extremely concise. Sacrifice grammar for the sake of concision.

  IT IS IMPERATIVE THAT YOU DO NOT UPDATE `{{ tasks_file }}` in any other way - only the single feature "passes" property. It is unacceptable to remove or edit other fields because this could lead to missing or buggy functionality.

  If you learn anything useful that might be helpful for future turns - such as implementation or details about writing or updating test cases, please update @CLAUDE.md with this information.

  Then commit these changes, other than `{{ tasks_file }}` and `{{ progress_file }}`. And report on how you did."#;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl AgentConfig {
    /// Built-in command line and instructions for `agent`.
    pub fn default_for(agent: Agent) -> Self {
        match agent {
            Agent::Claude => Self {
                command: strings(&[
                    "claude",
                    "--dangerously-skip-permissions",
                    "--model",
                    "opus",
                    "-p",
                ]),
                instructions: INSTRUCTIONS.to_string(),
            },
            Agent::CursorAgent => Self {
                command: strings(&[
                    "agent",
                    "--model",
                    "composer-1.5",
                    "--sandbox",
                    "disabled",
                    "--force",
                    "-p",
                    "--output-format",
                    "stream-json",
                    "--stream-partial-output",
                ]),
                instructions: INSTRUCTIONS.to_string(),
            },
            // opencode's `run` subcommand mangles backticks; quote paths instead.
            Agent::Opencode => Self {
                command: strings(&["opencode", "--model", "openai/gpt-5.1-codex-mini", "run"]),
                instructions: INSTRUCTIONS.replace('`', "\""),
            },
        }
    }
}

impl Default for RalphConfig {
    fn default() -> Self {
        Self {
            tasks_file: PathBuf::from(DEFAULT_TASKS_FILE),
            progress_file: PathBuf::from(DEFAULT_PROGRESS_FILE),
            failure_policy: FailurePolicy::default(),
            claude: AgentConfig::default_for(Agent::Claude),
            cursor_agent: AgentConfig::default_for(Agent::CursorAgent),
            opencode: AgentConfig::default_for(Agent::Opencode),
        }
    }
}

impl RalphConfig {
    pub fn agent(&self, agent: Agent) -> &AgentConfig {
        match agent {
            Agent::Claude => &self.claude,
            Agent::CursorAgent => &self.cursor_agent,
            Agent::Opencode => &self.opencode,
        }
    }

    /// Check every agent entry. `source` names the file for error messages.
    pub fn validate(&self, source: &std::path::Path) -> Result<(), RalphError> {
        for agent in Agent::ALL {
            let entry = self.agent(agent);
            let program_is_blank = entry
                .command
                .first()
                .is_none_or(|program| program.trim().is_empty());
            if program_is_blank {
                return Err(RalphError::config(
                    source,
                    format!("{agent}.command must be a non-empty array"),
                ));
            }
            check_instructions(&entry.instructions).map_err(|err| {
                RalphError::config(source, format!("{agent}.instructions: {err}"))
            })?;
        }
        if self.tasks_file.as_os_str().is_empty() {
            return Err(RalphError::config(source, "tasks_file must not be empty"));
        }
        if self.progress_file.as_os_str().is_empty() {
            return Err(RalphError::config(source, "progress_file must not be empty"));
        }
        Ok(())
    }
}
