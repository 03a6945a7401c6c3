//! Renderer module
//!
//! Renders search reports and file views to different output formats:
//! jsonl, json, md, raw

use colored::Colorize;
use serde_json::json;
use std::io::Write;

use crate::core::model::{DisplayLine, FileView, MatchSpan, SearchReport};
use crate::core::util::digit_width;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
    /// Highlight matches in raw output
    pub color: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
            color: false,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Renderer for search reports and file views
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    #[allow(dead_code)]
    pub fn new(format: OutputFormat) -> Self {
        Self::with_config(RenderConfig::new(format))
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a search report to a string
    pub fn render_report(&self, report: &SearchReport) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.report_jsonl(report),
            OutputFormat::Json => self.to_json(report),
            OutputFormat::Markdown => self.report_markdown(report),
            OutputFormat::Raw => self.report_raw(report),
        }
    }

    /// Render a file view to a string
    pub fn render_view(&self, view: &FileView) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.view_jsonl(view),
            OutputFormat::Json => self.to_json(view),
            OutputFormat::Markdown => self.view_markdown(view),
            OutputFormat::Raw => view
                .lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Render a report to a writer, newline terminated
    pub fn write_report<W: Write>(&self, report: &SearchReport, mut writer: W) -> std::io::Result<()> {
        write_terminated(&mut writer, &self.render_report(report))
    }

    /// Render a view to a writer, newline terminated
    pub fn write_view<W: Write>(&self, view: &FileView, mut writer: W) -> std::io::Result<()> {
        write_terminated(&mut writer, &self.render_view(view))
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
        }
    }

    fn join_records(&self, records: Vec<String>) -> String {
        records.join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// One line per file group, then a summary line
    fn report_jsonl(&self, report: &SearchReport) -> String {
        let mut records: Vec<String> = report.groups.iter().map(|g| self.to_json(g)).collect();

        let summary = json!({
            "summary": {
                "pattern": report.pattern,
                "files": report.groups.len(),
                "match_count": report.match_count,
                "line_number_width": report.line_number_width,
                "truncated_by_count": report.truncated_by_count,
                "truncated_by_time": report.truncated_by_time,
                "decode_failures": report.decode_failures,
                "elapsed_ms": report.elapsed_ms,
            }
        });
        records.push(self.to_json(&summary));

        self.join_records(records)
    }

    fn view_jsonl(&self, view: &FileView) -> String {
        let records = view
            .lines
            .iter()
            .map(|line| {
                self.to_json(&json!({
                    "path": view.path,
                    "line_number": line.line_number,
                    "text": line.text,
                }))
            })
            .collect();
        self.join_records(records)
    }

    fn report_markdown(&self, report: &SearchReport) -> String {
        let mut output = String::new();

        if report.groups.is_empty() {
            output.push_str(&format!("_No matches for `{}`._\n", report.pattern));
        }

        let width = report.line_number_width.max(1);
        for group in &report.groups {
            output.push_str(&format!("## `{}`\n\n```\n", group.path));
            for line in &group.lines {
                let marker = if line.is_match { '>' } else { ' ' };
                output.push_str(&format!(
                    "{} {:>width$} │ {}\n",
                    marker,
                    line.line_number,
                    line.text,
                    width = width
                ));
            }
            output.push_str("```\n\n");
        }

        if report.is_truncated() {
            let reason = if report.truncated_by_count {
                format!("stopped after {} matches", report.match_count)
            } else {
                format!("time limit reached after {} ms", report.elapsed_ms)
            };
            output.push_str(&format!("> ⚠️ Results truncated: {}\n", reason));
        }

        output
    }

    fn view_markdown(&self, view: &FileView) -> String {
        let width = view
            .lines
            .iter()
            .map(|l| digit_width(l.line_number))
            .max()
            .unwrap_or(1);

        let mut output = format!("## `{}`\n\n```\n", view.path);
        for line in &view.lines {
            output.push_str(&format!(
                "{:>width$} │ {}\n",
                line.line_number,
                line.text,
                width = width
            ));
        }
        output.push_str("```\n");
        if view.lossy {
            output.push_str("\n> ⚠️ Invalid UTF-8 was replaced\n");
        }
        output
    }

    /// grep-style `path:line:text`; context lines use `-` separators
    fn report_raw(&self, report: &SearchReport) -> String {
        let mut lines = Vec::new();
        for group in &report.groups {
            for line in &group.lines {
                lines.push(self.raw_line(&group.path, line));
            }
        }
        lines.join("\n")
    }

    fn raw_line(&self, path: &str, line: &DisplayLine) -> String {
        let sep = if line.is_match { ":" } else { "-" };
        if !self.config.color {
            return format!("{}{}{}{}{}", path, sep, line.line_number, sep, line.text);
        }

        format!(
            "{}{}{}{}{}",
            path.magenta(),
            sep,
            line.line_number.to_string().green(),
            sep,
            highlight(&line.text, &line.spans)
        )
    }
}

/// Color the matched byte ranges of `text`. Spans that overlap or do not fall
/// on character boundaries are skipped.
fn highlight(text: &str, spans: &[MatchSpan]) -> String {
    let mut spans = spans.to_vec();
    spans.sort_by_key(|s| s.start);

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor
            || span.end > text.len()
            || span.start >= span.end
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            continue;
        }
        output.push_str(&text[cursor..span.start]);
        output.push_str(&text[span.start..span.end].red().bold().to_string());
        cursor = span.end;
    }
    output.push_str(&text[cursor..]);
    output
}

fn write_terminated<W: Write>(writer: &mut W, output: &str) -> std::io::Result<()> {
    if output.is_empty() {
        return Ok(());
    }
    writer.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FileGroup, NumberedLine};

    fn report() -> SearchReport {
        SearchReport {
            pattern: "foo".into(),
            groups: vec![
                FileGroup {
                    path: "src/b.rs".into(),
                    lines: vec![
                        DisplayLine {
                            line_number: 9,
                            text: "let x = 1;".into(),
                            is_match: false,
                            spans: Vec::new(),
                        },
                        DisplayLine {
                            line_number: 10,
                            text: "foo(x);".into(),
                            is_match: true,
                            spans: vec![MatchSpan { start: 0, end: 3 }],
                        },
                    ],
                },
                FileGroup {
                    path: "a.txt".into(),
                    lines: vec![DisplayLine {
                        line_number: 2,
                        text: "a foo".into(),
                        is_match: true,
                        spans: vec![MatchSpan { start: 2, end: 5 }],
                    }],
                },
            ],
            line_number_width: 2,
            match_count: 2,
            truncated_by_count: false,
            truncated_by_time: false,
            decode_failures: 0,
            elapsed_ms: 12,
        }
    }

    fn view() -> FileView {
        FileView {
            path: "notes.txt".into(),
            lines: (1..=10)
                .map(|n| NumberedLine {
                    line_number: n,
                    text: format!("line {}", n),
                })
                .collect(),
            lossy: false,
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("MARKDOWN".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("RAW".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);

        let result = "invalid".parse::<OutputFormat>();
        assert!(result.unwrap_err().contains("Unknown format"));
    }

    #[test]
    fn test_render_config_builders() {
        let config = RenderConfig::new(OutputFormat::Json)
            .with_pretty(true)
            .with_color(true);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.pretty);
        assert!(config.color);

        let config = RenderConfig::default();
        assert_eq!(config.format, OutputFormat::Jsonl);
        assert!(!config.pretty);
        assert!(!config.color);
    }

    #[test]
    fn test_report_jsonl() {
        let output = Renderer::new(OutputFormat::Jsonl).render_report(&report());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["path"], "src/b.rs");
        assert_eq!(first["lines"][1]["is_match"], true);

        let summary: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(summary["summary"]["match_count"], 2);
        assert_eq!(summary["summary"]["files"], 2);
        assert_eq!(summary["summary"]["truncated_by_count"], false);
    }

    #[test]
    fn test_report_jsonl_empty_still_has_summary() {
        let output = Renderer::new(OutputFormat::Jsonl).render_report(&SearchReport::empty(""));
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("\"summary\""));
    }

    #[test]
    fn test_report_json_round_trips() {
        let original = report();
        let output = Renderer::new(OutputFormat::Json).render_report(&original);
        let parsed: SearchReport = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_report_json_pretty() {
        let config = RenderConfig::new(OutputFormat::Json).with_pretty(true);
        let output = Renderer::with_config(config).render_report(&report());
        assert!(output.contains("\n  "));
    }

    #[test]
    fn test_report_markdown() {
        let output = Renderer::new(OutputFormat::Markdown).render_report(&report());
        assert!(output.contains("## `src/b.rs`"));
        assert!(output.contains("   9 │ let x = 1;"));
        assert!(output.contains("> 10 │ foo(x);"));
        assert!(output.contains(">  2 │ a foo"));
        assert!(!output.contains("truncated"));

        // first-appearance order is kept
        assert!(output.find("src/b.rs").unwrap() < output.find("a.txt").unwrap());
    }

    #[test]
    fn test_report_markdown_truncated() {
        let mut report = report();
        report.truncated_by_time = true;
        let output = Renderer::new(OutputFormat::Markdown).render_report(&report);
        assert!(output.contains("time limit reached"));

        report.truncated_by_time = false;
        report.truncated_by_count = true;
        let output = Renderer::new(OutputFormat::Markdown).render_report(&report);
        assert!(output.contains("stopped after 2 matches"));
    }

    #[test]
    fn test_report_markdown_empty() {
        let output = Renderer::new(OutputFormat::Markdown).render_report(&SearchReport::empty("zzz"));
        assert!(output.contains("No matches for `zzz`"));
    }

    #[test]
    fn test_report_raw_plain() {
        let output = Renderer::new(OutputFormat::Raw).render_report(&report());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec!["src/b.rs-9-let x = 1;", "src/b.rs:10:foo(x);", "a.txt:2:a foo"]
        );
    }

    #[test]
    fn test_highlight_keeps_text() {
        colored::control::set_override(true);
        let output = highlight("a foo b", &[MatchSpan { start: 2, end: 5 }]);
        assert!(output.starts_with("a "));
        assert!(output.ends_with(" b"));
        assert!(output.contains("foo"));
    }

    #[test]
    fn test_highlight_skips_bad_spans() {
        // 'é' is two bytes; a span ending inside it is ignored
        assert_eq!(highlight("é", &[MatchSpan { start: 0, end: 1 }]), "é");
        assert_eq!(highlight("abc", &[MatchSpan { start: 2, end: 9 }]), "abc");
        assert_eq!(highlight("abc", &[]), "abc");
    }

    #[test]
    fn test_view_jsonl() {
        let output = Renderer::new(OutputFormat::Jsonl).render_view(&view());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 10);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["path"], "notes.txt");
        assert_eq!(first["line_number"], 1);
        assert_eq!(first["text"], "line 1");
    }

    #[test]
    fn test_view_markdown_aligns_numbers() {
        let output = Renderer::new(OutputFormat::Markdown).render_view(&view());
        assert!(output.contains("## `notes.txt`"));
        assert!(output.contains(" 1 │ line 1\n"));
        assert!(output.contains("10 │ line 10\n"));
    }

    #[test]
    fn test_view_raw() {
        let output = Renderer::new(OutputFormat::Raw).render_view(&view());
        assert!(output.starts_with("line 1\nline 2"));
    }

    #[test]
    fn test_write_report_terminates_output() {
        let mut buffer = Vec::new();
        Renderer::new(OutputFormat::Raw)
            .write_report(&report(), &mut buffer)
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.ends_with("a.txt:2:a foo\n"));

        let mut buffer = Vec::new();
        Renderer::new(OutputFormat::Raw)
            .write_report(&SearchReport::empty("x"), &mut buffer)
            .unwrap();
        assert!(buffer.is_empty());
    }
}
