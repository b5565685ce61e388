//! Test-only helpers: a scripted invoker and a throwaway workspace.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::config::RalphConfig;
use crate::core::invocation::Invocation;
use crate::error::RalphError;
use crate::io::interrupt::Interrupt;
use crate::io::invoker::Invoker;
use crate::io::process::ProcessOutcome;

/// What a scripted agent does when invoked.
#[derive(Debug, Clone)]
pub enum ScriptedAction {
    Exit(Option<i32>),
    /// Trigger the interrupt, then report the agent as killed.
    Interrupt,
    /// Trigger the interrupt, but report a plain exit: the agent died from
    /// the signal on its own before it could be killed.
    ExitOnInterrupt(Option<i32>),
    /// Behave as if the executable does not exist.
    Unavailable,
}

/// One scripted invocation, optionally rewriting a file first (the way a
/// real agent flips `passes` in the task list).
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub action: ScriptedAction,
    pub write: Option<(PathBuf, String)>,
}

impl ScriptedRun {
    pub fn exit(code: i32) -> Self {
        Self {
            action: ScriptedAction::Exit(Some(code)),
            write: None,
        }
    }

    pub fn interrupt() -> Self {
        Self {
            action: ScriptedAction::Interrupt,
            write: None,
        }
    }

    pub fn exit_on_interrupt(code: i32) -> Self {
        Self {
            action: ScriptedAction::ExitOnInterrupt(Some(code)),
            write: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            action: ScriptedAction::Unavailable,
            write: None,
        }
    }

    pub fn writing(mut self, path: &Path, contents: &str) -> Self {
        self.write = Some((path.to_path_buf(), contents.to_string()));
        self
    }
}

/// Invoker that replays [`ScriptedRun`]s in order and records every call.
pub struct ScriptedInvoker {
    runs: RefCell<VecDeque<ScriptedRun>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedInvoker {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl Invoker for ScriptedInvoker {
    fn invoke(&self, invocation: &Invocation, interrupt: &Interrupt) -> Result<ProcessOutcome> {
        self.calls.borrow_mut().push(invocation.clone());
        let run = self
            .runs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted run left"))?;
        if let Some((path, contents)) = &run.write {
            fs::write(path, contents)?;
        }
        match run.action {
            ScriptedAction::Exit(exit_code) => Ok(ProcessOutcome {
                exit_code,
                interrupted: false,
            }),
            ScriptedAction::Interrupt => {
                interrupt.trigger();
                Ok(ProcessOutcome {
                    exit_code: None,
                    interrupted: true,
                })
            }
            ScriptedAction::ExitOnInterrupt(exit_code) => {
                interrupt.trigger();
                Ok(ProcessOutcome {
                    exit_code,
                    interrupted: false,
                })
            }
            ScriptedAction::Unavailable => Err(RalphError::AgentUnavailable {
                program: invocation.program.clone(),
            }
            .into()),
        }
    }
}

/// Temporary directory holding a task list and a config pointing at it.
pub struct TestWorkspace {
    temp: TempDir,
    pub config: RalphConfig,
}

impl TestWorkspace {
    pub fn new(tasks_json: &str) -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let state_dir = temp.path().join(".ralph");
        fs::create_dir_all(&state_dir)?;
        let config = RalphConfig {
            tasks_file: state_dir.join("tasks_list.json"),
            progress_file: state_dir.join("progress_tasks.txt"),
            ..RalphConfig::default()
        };
        let workspace = Self { temp, config };
        workspace.write_tasks(tasks_json)?;
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn tasks_file(&self) -> &Path {
        &self.config.tasks_file
    }

    pub fn write_tasks(&self, tasks_json: &str) -> Result<()> {
        fs::write(&self.config.tasks_file, tasks_json)?;
        Ok(())
    }

    /// Lines of the progress log, or empty if it was never created.
    pub fn progress_lines(&self) -> Result<Vec<String>> {
        if !self.config.progress_file.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.config.progress_file)?;
        Ok(contents.lines().map(str::to_string).collect())
    }
}
