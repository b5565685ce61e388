//! The closed set of supported agents.

use std::fmt;

use clap::ValueEnum;

/// An external coding agent the loop knows how to drive.
///
/// Adding a variant forces every `match` over agents (config lookup, default
/// commands, output mode) to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Agent {
    Claude,
    CursorAgent,
    Opencode,
}

/// How the loop consumes an agent's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// stdout/stderr go straight to the terminal; the loop only waits.
    Inherit,
    /// stdout is newline-delimited JSON, parsed into progress events as it arrives.
    StreamJson,
}

impl Agent {
    pub const ALL: [Agent; 3] = [Agent::Claude, Agent::CursorAgent, Agent::Opencode];

    pub fn as_str(self) -> &'static str {
        match self {
            Agent::Claude => "claude",
            Agent::CursorAgent => "cursor-agent",
            Agent::Opencode => "opencode",
        }
    }

    /// Streaming applies only to cursor-agent, and only when its command asks
    /// for a machine-readable output format.
    pub fn output_mode(self, command: &[String]) -> OutputMode {
        match self {
            Agent::CursorAgent if command.iter().any(|arg| arg == "--output-format") => {
                OutputMode::StreamJson
            }
            Agent::Claude | Agent::CursorAgent | Agent::Opencode => OutputMode::Inherit,
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
