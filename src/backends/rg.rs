//! ripgrep integration
//!
//! Builds the `rg --json` invocation for a SearchRequest and decodes its
//! output, one JSON message per line, into RawEvents.

use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::core::error::DecodeError;
use crate::core::model::{LineRecord, MatchSpan, RawEvent, SearchRequest};
use crate::core::paths::normalize_path_text;
use crate::core::util::command_exists;

/// Lines longer than this are dropped without being parsed (1 MB)
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Check if the search executable is available
pub fn is_rg_available(program: &Path) -> bool {
    command_exists(program)
}

/// Arguments passed to ripgrep for `request`.
///
/// The pattern always follows `--`, so text such as `-v` or `--files` is
/// searched for rather than parsed as an option. The trailing `.` searches the
/// working directory, which the caller sets to the request root.
pub fn build_args(request: &SearchRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--json".into()];

    if request.ignore_case() {
        args.push("--ignore-case".into());
    }
    if request.literal() {
        args.push("--fixed-strings".into());
    }
    if request.context_lines() > 0 {
        args.push("--context".into());
        args.push(request.context_lines().to_string().into());
    }
    for glob in request.globs() {
        args.push("--glob".into());
        args.push(glob.into());
    }

    args.push("--".into());
    args.push(request.pattern().into());
    args.push(".".into());
    args
}

/// Ready-to-spawn command for `request`
pub fn build_command(program: &Path, request: &SearchRequest) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(build_args(request))
        .current_dir(request.root())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// ripgrep's "arbitrary data": text when valid UTF-8, base64 bytes otherwise
#[derive(Debug, Deserialize)]
struct Data {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PathData {
    path: Option<Data>,
}

#[derive(Debug, Deserialize)]
struct LineData {
    path: Option<Data>,
    lines: Option<Data>,
    line_number: Option<u64>,
    #[serde(default)]
    submatches: Vec<Submatch>,
}

#[derive(Debug, Deserialize)]
struct Submatch {
    start: usize,
    end: usize,
}

/// Decode one line of `rg --json` output.
///
/// Unknown message kinds (`summary`, future additions) decode to
/// [`RawEvent::Other`]; structurally broken messages are errors.
pub fn decode_line(line: &[u8]) -> Result<RawEvent, DecodeError> {
    if line.len() > MAX_LINE_BYTES {
        return Err(DecodeError::Oversized {
            len: line.len(),
            limit: MAX_LINE_BYTES,
        });
    }

    let message: Message = serde_json::from_slice(line)?;

    match message.kind.as_str() {
        "begin" => Ok(RawEvent::Begin {
            path: decode_path("begin", message.data)?,
        }),
        "end" => Ok(RawEvent::End {
            path: decode_path("end", message.data)?,
        }),
        "match" => Ok(RawEvent::Match(decode_line_record("match", message.data)?)),
        "context" => Ok(RawEvent::Context(decode_line_record(
            "context",
            message.data,
        )?)),
        _ => Ok(RawEvent::Other),
    }
}

fn decode_path(kind: &'static str, data: serde_json::Value) -> Result<String, DecodeError> {
    let data: PathData = serde_json::from_value(data)?;
    let path = data.path.ok_or(DecodeError::MissingField {
        kind,
        field: "path",
    })?;
    let text = path.text.ok_or(DecodeError::NonUtf8 {
        kind,
        field: "path",
    })?;
    Ok(normalize_path_text(&text))
}

fn decode_line_record(
    kind: &'static str,
    data: serde_json::Value,
) -> Result<LineRecord, DecodeError> {
    let data: LineData = serde_json::from_value(data)?;

    let path = data
        .path
        .ok_or(DecodeError::MissingField {
            kind,
            field: "path",
        })?
        .text
        .ok_or(DecodeError::NonUtf8 {
            kind,
            field: "path",
        })?;
    let lines = data
        .lines
        .ok_or(DecodeError::MissingField {
            kind,
            field: "lines",
        })?
        .text
        .ok_or(DecodeError::NonUtf8 {
            kind,
            field: "lines",
        })?;
    let line_number = data
        .line_number
        .filter(|n| *n > 0)
        .ok_or(DecodeError::MissingField {
            kind,
            field: "line_number",
        })?;

    let text = trim_line_ending(&lines).to_string();
    let submatches = data
        .submatches
        .into_iter()
        .filter(|s| s.start <= s.end)
        .map(|s| MatchSpan {
            start: s.start.min(text.len()),
            end: s.end.min(text.len()),
        })
        .collect();

    Ok(LineRecord {
        path: normalize_path_text(&path),
        line_number,
        text,
        submatches,
    })
}

fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
