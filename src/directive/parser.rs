//! Line scanner for the tool directive protocol.
//!
//! Grammar (simplified):
//! ```text
//! Reply      := { Line }
//! ReadFile   := "READ_FILE:" arg EOL
//! WriteFile  := "WRITE_FILE:" arg EOL Fence
//! RunCommand := "RUN_COMMAND:" arg EOL
//! Fence      := "```" [tag] EOL { line EOL } "```"
//! ```
//!
//! `WRITE_FILE` wins over everything else in the same reply, then
//! `READ_FILE`, then `RUN_COMMAND`. A `WRITE_FILE` line whose fence never
//! opens or never closes does not fire, and does not shadow a lower-priority
//! directive elsewhere in the reply.

use serde::{Deserialize, Serialize};

const READ_FILE_MARKER: &str = "READ_FILE:";
const WRITE_FILE_MARKER: &str = "WRITE_FILE:";
const RUN_COMMAND_MARKER: &str = "RUN_COMMAND:";
const FENCE_MARKER: &str = "```";

/// A structured action the model requested instead of answering directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolRequest {
    ReadFile {
        path: String,
    },
    WriteFile {
        path: String,
        content: String,
    },
    /// Recognized for forward compatibility; never executed.
    RunCommand {
        command: String,
    },
}

/// Extract at most one tool request from a model reply.
pub fn parse_reply(reply: &str) -> Option<ToolRequest> {
    let lines: Vec<&str> = reply.lines().collect();

    if let Some(request) = first_write(&lines) {
        return Some(request);
    }
    if let Some(path) = first_argument(&lines, READ_FILE_MARKER) {
        return Some(ToolRequest::ReadFile { path });
    }
    if let Some(command) = first_argument(&lines, RUN_COMMAND_MARKER) {
        return Some(ToolRequest::RunCommand { command });
    }
    None
}

/// All fenced code block bodies in the reply, in order. Feeds the
/// inline-suggestion channel when no directive fired.
pub fn code_blocks(reply: &str) -> Vec<String> {
    let lines: Vec<&str> = reply.lines().collect();
    let mut blocks = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        if let Some((body, consumed)) = fence_body(&lines[idx..]) {
            blocks.push(body);
            idx += consumed;
        } else {
            idx += 1;
        }
    }
    blocks
}

fn directive_argument(line: &str, marker: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix(marker)?;
    let argument = rest.trim();
    if argument.is_empty() {
        None
    } else {
        Some(argument.to_string())
    }
}

fn first_argument(lines: &[&str], marker: &str) -> Option<String> {
    lines
        .iter()
        .find_map(|line| directive_argument(line, marker))
}

fn first_write(lines: &[&str]) -> Option<ToolRequest> {
    for (idx, line) in lines.iter().enumerate() {
        let Some(path) = directive_argument(line, WRITE_FILE_MARKER) else {
            continue;
        };
        // The directive only fires when a fence opens on the very next line.
        if let Some((content, _)) = fence_body(&lines[idx + 1..]) {
            return Some(ToolRequest::WriteFile { path, content });
        }
    }
    None
}

fn opens_fence(line: &str) -> bool {
    match line.trim_start().strip_prefix(FENCE_MARKER) {
        Some(tag) => tag
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '.')),
        None => false,
    }
}

/// Body of a fence opening at `lines[0]`, plus the number of lines consumed
/// through the closing fence. `None` when the fence never opens or closes.
fn fence_body(lines: &[&str]) -> Option<(String, usize)> {
    let first = lines.first().copied()?;
    if !opens_fence(first) {
        return None;
    }
    let mut body = String::new();
    for (offset, line) in lines[1..].iter().enumerate() {
        if line.trim_start().starts_with(FENCE_MARKER) {
            return Some((body, offset + 2));
        }
        body.push_str(line);
        body.push('\n');
    }
    None
}
