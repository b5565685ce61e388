//! Classification of streamed agent output into progress events.
//!
//! `cursor-agent --output-format stream-json` prints one JSON object per line.
//! Each line is matched against [`RULES`] in order; the first rule that
//! produces an event wins. Anything no rule claims becomes
//! [`ProgressEvent::Raw`] and is shown verbatim, so a garbled or unexpected
//! line never aborts a run.

use serde_json::Value;

/// File operation performed by a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOp {
    Read { path: String },
    Write { path: String },
    /// A tool without a dedicated rendering, identified by its payload key.
    Other { name: String },
}

/// Kind of completed tool call that reports a result size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Session started on `model`.
    ModelIdentified { model: String },
    /// The assistant produced `chars` more characters of text.
    TextDelta { chars: usize },
    ToolStarted { op: ToolOp },
    ToolCompleted {
        kind: ToolKind,
        lines: u64,
        bytes: Option<u64>,
    },
    /// Final summary line from the agent.
    Completed { duration_ms: u64 },
    /// Recognized event that carries nothing worth displaying.
    Passive { kind: String },
    /// Unrecognized output, passed through untouched.
    Raw { line: String },
}

/// A parsed stream-json line.
pub struct StreamLine<'a> {
    pub kind: &'a str,
    pub subtype: Option<&'a str>,
    pub value: &'a Value,
}

/// One entry of the classification table.
pub struct StreamRule {
    pub name: &'static str,
    pub apply: fn(&StreamLine<'_>) -> Option<ProgressEvent>,
}

/// Event types the agent is known to emit.
const KNOWN_KINDS: &[&str] = &["system", "user", "assistant", "thinking", "tool_call", "result"];

/// Classification rules in priority order.
pub const RULES: &[StreamRule] = &[
    StreamRule {
        name: "system-init",
        apply: system_init,
    },
    StreamRule {
        name: "assistant-text",
        apply: assistant_text,
    },
    StreamRule {
        name: "tool-started",
        apply: tool_started,
    },
    StreamRule {
        name: "tool-completed",
        apply: tool_completed,
    },
    StreamRule {
        name: "result",
        apply: result,
    },
    StreamRule {
        name: "passive",
        apply: passive,
    },
];

/// Classify a single line of agent output. Never fails.
pub fn classify_line(line: &str) -> ProgressEvent {
    let trimmed = line.trim();
    let raw = || ProgressEvent::Raw {
        line: line.trim_end_matches(['\r', '\n']).to_string(),
    };

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return raw();
    };
    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        return raw();
    };
    let parsed = StreamLine {
        kind,
        subtype: value.get("subtype").and_then(Value::as_str),
        value: &value,
    };

    RULES
        .iter()
        .find_map(|rule| (rule.apply)(&parsed))
        .unwrap_or_else(raw)
}

fn system_init(line: &StreamLine<'_>) -> Option<ProgressEvent> {
    if line.kind != "system" || line.subtype != Some("init") {
        return None;
    }
    let model = line
        .value
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    Some(ProgressEvent::ModelIdentified {
        model: model.to_string(),
    })
}

fn assistant_text(line: &StreamLine<'_>) -> Option<ProgressEvent> {
    if line.kind != "assistant" {
        return None;
    }
    let text = line
        .value
        .pointer("/message/content/0/text")
        .and_then(Value::as_str)?;
    if text.is_empty() {
        return None;
    }
    Some(ProgressEvent::TextDelta {
        chars: text.chars().count(),
    })
}

fn tool_started(line: &StreamLine<'_>) -> Option<ProgressEvent> {
    if line.kind != "tool_call" || line.subtype != Some("started") {
        return None;
    }
    let call = line.value.get("tool_call")?.as_object()?;
    let path_of = |key: &str| {
        call.get(key)
            .and_then(|payload| payload.pointer("/args/path"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    };
    let op = if call.contains_key("writeToolCall") {
        ToolOp::Write {
            path: path_of("writeToolCall"),
        }
    } else if call.contains_key("readToolCall") {
        ToolOp::Read {
            path: path_of("readToolCall"),
        }
    } else {
        ToolOp::Other {
            name: call.keys().next()?.clone(),
        }
    };
    Some(ProgressEvent::ToolStarted { op })
}

fn tool_completed(line: &StreamLine<'_>) -> Option<ProgressEvent> {
    if line.kind != "tool_call" || line.subtype != Some("completed") {
        return None;
    }
    let call = line.value.get("tool_call")?;
    if let Some(success) = call.pointer("/writeToolCall/result/success") {
        return Some(ProgressEvent::ToolCompleted {
            kind: ToolKind::Write,
            lines: success.get("linesCreated").and_then(Value::as_u64).unwrap_or(0),
            bytes: Some(success.get("fileSize").and_then(Value::as_u64).unwrap_or(0)),
        });
    }
    if let Some(success) = call.pointer("/readToolCall/result/success") {
        return Some(ProgressEvent::ToolCompleted {
            kind: ToolKind::Read,
            lines: success.get("totalLines").and_then(Value::as_u64).unwrap_or(0),
            bytes: None,
        });
    }
    None
}

fn result(line: &StreamLine<'_>) -> Option<ProgressEvent> {
    if line.kind != "result" {
        return None;
    }
    Some(ProgressEvent::Completed {
        duration_ms: line
            .value
            .get("duration_ms")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    })
}

fn passive(line: &StreamLine<'_>) -> Option<ProgressEvent> {
    KNOWN_KINDS
        .contains(&line.kind)
        .then(|| ProgressEvent::Passive {
            kind: line.kind.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_ordered_with_passive_last() {
        let names: Vec<&str> = RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            vec![
                "system-init",
                "assistant-text",
                "tool-started",
                "tool-completed",
                "result",
                "passive"
            ]
        );
    }

    #[test]
    fn system_init_reports_model() {
        let event = classify_line(r#"{"type":"system","subtype":"init","model":"composer-1.5"}"#);
        assert_eq!(
            event,
            ProgressEvent::ModelIdentified {
                model: "composer-1.5".to_string()
            }
        );

        let event = classify_line(r#"{"type":"system","subtype":"init"}"#);
        assert_eq!(
            event,
            ProgressEvent::ModelIdentified {
                model: "unknown".to_string()
            }
        );
    }

    #[test]
    fn assistant_text_counts_characters_not_bytes() {
        let event = classify_line(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"héllo"}]}}"#,
        );
        assert_eq!(event, ProgressEvent::TextDelta { chars: 5 });
    }

    #[test]
    fn empty_assistant_delta_is_passive() {
        let event = classify_line(r#"{"type":"assistant","message":{"content":[]}}"#);
        assert_eq!(
            event,
            ProgressEvent::Passive {
                kind: "assistant".to_string()
            }
        );
    }

    #[test]
    fn tool_calls_map_to_file_operations() {
        let started = classify_line(
            r#"{"type":"tool_call","subtype":"started","tool_call":{"writeToolCall":{"args":{"path":"src/main.rs"}}}}"#,
        );
        assert_eq!(
            started,
            ProgressEvent::ToolStarted {
                op: ToolOp::Write {
                    path: "src/main.rs".to_string()
                }
            }
        );

        let read = classify_line(
            r#"{"type":"tool_call","subtype":"started","tool_call":{"readToolCall":{"args":{}}}}"#,
        );
        assert_eq!(
            read,
            ProgressEvent::ToolStarted {
                op: ToolOp::Read {
                    path: "unknown".to_string()
                }
            }
        );

        let shell = classify_line(
            r#"{"type":"tool_call","subtype":"started","tool_call":{"shellToolCall":{"args":{"command":"ls"}}}}"#,
        );
        assert_eq!(
            shell,
            ProgressEvent::ToolStarted {
                op: ToolOp::Other {
                    name: "shellToolCall".to_string()
                }
            }
        );
    }

    #[test]
    fn tool_completion_reports_line_counts() {
        let write = classify_line(
            r#"{"type":"tool_call","subtype":"completed","tool_call":{"writeToolCall":{"result":{"success":{"linesCreated":12,"fileSize":340}}}}}"#,
        );
        assert_eq!(
            write,
            ProgressEvent::ToolCompleted {
                kind: ToolKind::Write,
                lines: 12,
                bytes: Some(340)
            }
        );

        let read = classify_line(
            r#"{"type":"tool_call","subtype":"completed","tool_call":{"readToolCall":{"result":{"success":{"totalLines":88}}}}}"#,
        );
        assert_eq!(
            read,
            ProgressEvent::ToolCompleted {
                kind: ToolKind::Read,
                lines: 88,
                bytes: None
            }
        );

        let failed = classify_line(
            r#"{"type":"tool_call","subtype":"completed","tool_call":{"readToolCall":{"result":{"error":"denied"}}}}"#,
        );
        assert_eq!(
            failed,
            ProgressEvent::Passive {
                kind: "tool_call".to_string()
            }
        );
    }

    #[test]
    fn result_reports_duration() {
        let event = classify_line(r#"{"type":"result","duration_ms":1500}"#);
        assert_eq!(event, ProgressEvent::Completed { duration_ms: 1500 });
    }

    #[test]
    fn unrecognized_lines_pass_through_verbatim() {
        for line in [
            "Error: authentication required",
            r#"{"type":"telemetry","x":1}"#,
            r#"{"no_type":true}"#,
            r#"{"type":"assistant","message":"#,
            "",
        ] {
            assert_eq!(
                classify_line(line),
                ProgressEvent::Raw {
                    line: line.to_string()
                }
            );
        }
    }

    #[test]
    fn raw_line_drops_only_line_terminator() {
        assert_eq!(
            classify_line("  indented output\r\n"),
            ProgressEvent::Raw {
                line: "  indented output".to_string()
            }
        );
    }

    #[test]
    fn parsing_continues_after_garbled_line() {
        let lines = [
            "{garbled",
            r#"{"type":"system","subtype":"init","model":"m"}"#,
        ];
        let events: Vec<ProgressEvent> = lines.iter().map(|line| classify_line(line)).collect();
        assert!(matches!(events[0], ProgressEvent::Raw { .. }));
        assert!(matches!(events[1], ProgressEvent::ModelIdentified { .. }));
    }
}
