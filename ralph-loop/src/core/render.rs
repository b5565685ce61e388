//! Terminal rendering of streamed progress events.

use std::io::{self, Write};
use std::time::Instant;

use crate::core::stream::{ProgressEvent, ToolKind, ToolOp};

/// Running totals for one streamed invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub tool_calls: u32,
    pub generated_chars: usize,
    pub raw_lines: u32,
}

/// Writes each event as soon as it is received.
///
/// Text deltas update a single line in place with `\r`; any other output
/// first terminates that line so messages never interleave.
pub struct StreamRenderer<W: Write> {
    out: W,
    stats: StreamStats,
    started: Instant,
    in_place_line: bool,
}

impl<W: Write> StreamRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stats: StreamStats::default(),
            started: Instant::now(),
            in_place_line: false,
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn render(&mut self, event: &ProgressEvent) -> io::Result<()> {
        match event {
            ProgressEvent::ModelIdentified { model } => {
                self.line(&format!("🤖 Using model: {model}"))?;
            }
            ProgressEvent::TextDelta { chars } => {
                self.stats.generated_chars += chars;
                write!(
                    self.out,
                    "\r📝 Generating: {} chars",
                    self.stats.generated_chars
                )?;
                self.in_place_line = true;
            }
            ProgressEvent::ToolStarted { op } => {
                self.stats.tool_calls += 1;
                let n = self.stats.tool_calls;
                let message = match op {
                    ToolOp::Write { path } => format!("🔧 Tool #{n}: Creating {path}"),
                    ToolOp::Read { path } => format!("📖 Tool #{n}: Reading {path}"),
                    ToolOp::Other { name } => format!("🔧 Tool #{n}: {name}"),
                };
                self.line(&message)?;
            }
            ProgressEvent::ToolCompleted { kind, lines, bytes } => {
                let message = match kind {
                    ToolKind::Write => {
                        format!("   ✅ Created {lines} lines ({} bytes)", bytes.unwrap_or(0))
                    }
                    ToolKind::Read => format!("   ✅ Read {lines} lines"),
                };
                self.line(&message)?;
            }
            ProgressEvent::Completed { duration_ms } => {
                let total_secs = self.started.elapsed().as_secs();
                self.line("")?;
                self.line(&format!(
                    "🎯 Completed in {duration_ms}ms ({total_secs}s total)"
                ))?;
                self.line(&format!(
                    "📊 Final stats: {} tools, {} chars generated",
                    self.stats.tool_calls, self.stats.generated_chars
                ))?;
            }
            ProgressEvent::Passive { .. } => {}
            ProgressEvent::Raw { line } => {
                self.stats.raw_lines += 1;
                self.line(line)?;
            }
        }
        self.out.flush()
    }

    /// Terminate a pending in-place line, if any.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.in_place_line {
            writeln!(self.out)?;
            self.in_place_line = false;
        }
        self.out.flush()
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        if self.in_place_line {
            writeln!(self.out)?;
            self.in_place_line = false;
        }
        writeln!(self.out, "{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::classify_line;

    fn render_all(events: &[ProgressEvent]) -> (String, StreamStats) {
        let mut buf = Vec::new();
        let stats = {
            let mut renderer = StreamRenderer::new(&mut buf);
            for event in events {
                renderer.render(event).expect("render");
            }
            renderer.finish().expect("finish");
            renderer.stats()
        };
        (String::from_utf8(buf).expect("utf8"), stats)
    }

    #[test]
    fn text_deltas_accumulate_on_one_line() {
        let (out, stats) = render_all(&[
            ProgressEvent::TextDelta { chars: 3 },
            ProgressEvent::TextDelta { chars: 4 },
        ]);
        assert_eq!(out, "\r📝 Generating: 3 chars\r📝 Generating: 7 chars\n");
        assert_eq!(stats.generated_chars, 7);
    }

    #[test]
    fn tool_lines_start_after_in_place_progress() {
        let (out, stats) = render_all(&[
            ProgressEvent::TextDelta { chars: 2 },
            ProgressEvent::ToolStarted {
                op: ToolOp::Read {
                    path: "README.md".to_string(),
                },
            },
            ProgressEvent::ToolCompleted {
                kind: ToolKind::Read,
                lines: 10,
                bytes: None,
            },
        ]);
        assert_eq!(
            out,
            "\r📝 Generating: 2 chars\n📖 Tool #1: Reading README.md\n   ✅ Read 10 lines\n"
        );
        assert_eq!(stats.tool_calls, 1);
    }

    #[test]
    fn completion_prints_final_stats() {
        let (out, _) = render_all(&[
            ProgressEvent::ToolStarted {
                op: ToolOp::Write {
                    path: "a.rs".to_string(),
                },
            },
            ProgressEvent::TextDelta { chars: 5 },
            ProgressEvent::Completed { duration_ms: 1200 },
        ]);
        assert!(out.contains("🔧 Tool #1: Creating a.rs\n"));
        assert!(out.contains("🎯 Completed in 1200ms"));
        assert!(out.contains("📊 Final stats: 1 tools, 5 chars generated\n"));
    }

    #[test]
    fn raw_and_passive_events() {
        let (out, stats) = render_all(&[
            ProgressEvent::Passive {
                kind: "user".to_string(),
            },
            ProgressEvent::Raw {
                line: "plain text".to_string(),
            },
        ]);
        assert_eq!(out, "plain text\n");
        assert_eq!(stats.raw_lines, 1);
    }

    #[test]
    fn unknown_line_is_rendered_and_later_lines_still_parse() {
        let lines = [
            "not json at all",
            r#"{"type":"system","subtype":"init","model":"composer"}"#,
        ];
        let events: Vec<ProgressEvent> = lines.iter().map(|line| classify_line(line)).collect();
        let (out, _) = render_all(&events);
        assert_eq!(out, "not json at all\n🤖 Using model: composer\n");
    }
}
