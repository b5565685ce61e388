//! Helpers for running agent processes that can be interrupted.
//!
//! One child at a time. The calling thread blocks on it, polling the
//! interrupt flag; in streaming mode it also consumes stdout lines as a
//! dedicated reader thread produces them.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};

use crate::core::invocation::Invocation;
use crate::error::RalphError;
use crate::io::interrupt::Interrupt;

/// How often a blocked wait checks the interrupt flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// The loop killed the process because an interrupt was requested.
    pub interrupted: bool,
}

impl ProcessOutcome {
    fn exited(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code(),
            interrupted: false,
        }
    }

    fn interrupted(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code(),
            interrupted: true,
        }
    }
}

fn command_for(invocation: &Invocation) -> Command {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args).stdin(Stdio::null());
    cmd
}

fn spawn(mut cmd: Command, program: &str) -> Result<Child> {
    debug!(program, "spawning agent process");
    match cmd.spawn() {
        Ok(child) => Ok(child),
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            error!(program, err = %err, "agent executable unavailable");
            Err(RalphError::AgentUnavailable {
                program: program.to_string(),
            }
            .into())
        }
        Err(err) => {
            error!(program, err = %err, "failed to spawn agent");
            Err(err).with_context(|| format!("spawn {program}"))
        }
    }
}

fn kill_and_reap(child: &mut Child) -> Result<ExitStatus> {
    warn!(pid = child.id(), "interrupt requested, killing agent");
    if let Err(err) = child.kill() {
        // InvalidInput means it already exited.
        if err.kind() != ErrorKind::InvalidInput {
            return Err(err).context("kill agent");
        }
    }
    child.wait().context("wait for agent after kill")
}

/// Wait for `child`, killing it if `interrupt` is set first.
fn wait_or_interrupt(child: &mut Child, interrupt: &Interrupt) -> Result<ProcessOutcome> {
    loop {
        if let Some(status) = child.try_wait().context("wait for agent")? {
            debug!(exit_code = ?status.code(), "agent finished");
            // The agent shares our process group and may have died from the
            // same SIGINT before this poll saw the flag.
            if interrupt.is_set() {
                return Ok(ProcessOutcome::interrupted(status));
            }
            return Ok(ProcessOutcome::exited(status));
        }
        if interrupt.is_set() {
            return Ok(ProcessOutcome::interrupted(kill_and_reap(child)?));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run with stdout/stderr attached to the terminal.
#[instrument(skip_all, fields(program = %invocation.program))]
pub fn run_inherited(invocation: &Invocation, interrupt: &Interrupt) -> Result<ProcessOutcome> {
    let mut cmd = command_for(invocation);
    cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    let mut child = spawn(cmd, &invocation.program)?;
    wait_or_interrupt(&mut child, interrupt)
}

/// Run with stdout piped, handing each line to `on_line` as soon as it is read.
///
/// stderr stays attached to the terminal. Invalid UTF-8 is replaced rather
/// than rejected so a garbled line cannot end the stream early.
#[instrument(skip_all, fields(program = %invocation.program))]
pub fn run_streaming<F>(
    invocation: &Invocation,
    interrupt: &Interrupt,
    mut on_line: F,
) -> Result<ProcessOutcome>
where
    F: FnMut(&str) -> Result<()>,
{
    let mut cmd = command_for(invocation);
    cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
    let mut child = spawn(cmd, &invocation.program)?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;

    let (tx, rx) = mpsc::channel::<String>();
    let reader = thread::spawn(move || forward_lines(stdout, tx));

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                if let Err(err) = on_line(&line) {
                    kill_and_reap(&mut child)?;
                    return Err(err);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if interrupt.is_set() {
            // Grandchildren may still hold the pipe open, so the reader is
            // left detached instead of joined.
            let status = kill_and_reap(&mut child)?;
            return Ok(ProcessOutcome::interrupted(status));
        }
    }

    let outcome = wait_or_interrupt(&mut child, interrupt)?;
    join_reader(reader);
    Ok(outcome)
}

fn forward_lines<R: Read>(reader: R, tx: mpsc::Sender<String>) -> Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).context("read agent stdout")?;
        if n == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.send(line).is_err() {
            // Receiver gone: the loop stopped listening.
            return Ok(());
        }
    }
}

fn join_reader(handle: thread::JoinHandle<Result<()>>) {
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(err = %format!("{err:#}"), "stdout reader failed"),
        Err(_) => warn!("stdout reader thread panicked"),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::agent::{Agent, OutputMode};

    fn sh(script: &str, mode: OutputMode) -> Invocation {
        Invocation {
            agent: Agent::Claude,
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            mode,
        }
    }

    #[test]
    fn inherited_run_reports_exit_code() {
        let outcome =
            run_inherited(&sh("exit 4", OutputMode::Inherit), &Interrupt::new()).expect("run");
        assert_eq!(
            outcome,
            ProcessOutcome {
                exit_code: Some(4),
                interrupted: false
            }
        );
    }

    #[test]
    fn streaming_run_delivers_lines_in_order() {
        let mut lines = Vec::new();
        let outcome = run_streaming(
            &sh("printf 'one\\ntwo\\nno-newline'", OutputMode::StreamJson),
            &Interrupt::new(),
            |line| {
                lines.push(line.to_string());
                Ok(())
            },
        )
        .expect("run");
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(lines, vec!["one\n", "two\n", "no-newline"]);
    }

    #[test]
    fn interrupt_kills_running_agent() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let outcome =
            run_inherited(&sh("sleep 30", OutputMode::Inherit), &interrupt).expect("run");
        assert!(outcome.interrupted);
    }

    #[test]
    fn agent_exiting_on_the_same_signal_counts_as_interrupted() {
        let mut child = command_for(&sh("exit 130", OutputMode::Inherit))
            .spawn()
            .expect("spawn");
        child.wait().expect("agent exits first");
        let interrupt = Interrupt::new();
        interrupt.trigger();

        let outcome = wait_or_interrupt(&mut child, &interrupt).expect("wait");
        assert_eq!(
            outcome,
            ProcessOutcome {
                exit_code: Some(130),
                interrupted: true
            }
        );
    }

    #[test]
    fn interrupt_during_stream_kills_agent() {
        let interrupt = Interrupt::new();
        let trigger = interrupt.clone();
        let outcome = run_streaming(
            &sh("echo started; sleep 30", OutputMode::StreamJson),
            &interrupt,
            |_| {
                trigger.trigger();
                Ok(())
            },
        )
        .expect("run");
        assert!(outcome.interrupted);
    }

    #[test]
    fn missing_program_is_agent_unavailable() {
        let invocation = Invocation {
            agent: Agent::Opencode,
            program: "ralph-loop-definitely-missing-binary".to_string(),
            args: Vec::new(),
            mode: OutputMode::Inherit,
        };
        let err = run_inherited(&invocation, &Interrupt::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RalphError>(),
            Some(RalphError::AgentUnavailable { .. })
        ));
    }
}
