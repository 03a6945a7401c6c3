//! Search Result Model
//!
//! Types flowing through one search: the immutable request, the raw events
//! decoded from the search process, the collected buffer, and the grouped
//! report handed to renderers.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::RequestError;

/// One search, fully specified. Built through [`SearchRequestBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pattern: String,
    root: PathBuf,
    ignore_case: bool,
    literal: bool,
    globs: Vec<String>,
    context_lines: usize,
    max_results: usize,
    time_limit: Duration,
}

impl SearchRequest {
    pub fn builder(pattern: impl Into<String>, root: impl Into<PathBuf>) -> SearchRequestBuilder {
        SearchRequestBuilder {
            pattern: pattern.into(),
            root: root.into(),
            ignore_case: false,
            literal: false,
            globs: Vec::new(),
            context_lines: 0,
            max_results: crate::core::config::DEFAULT_MAX_RESULTS,
            time_limit: crate::core::config::DEFAULT_TIME_LIMIT,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn literal(&self) -> bool {
        self.literal
    }

    /// Include/exclude globs in request order; a leading `!` excludes
    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    pub fn context_lines(&self) -> usize {
        self.context_lines
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    pattern: String,
    root: PathBuf,
    ignore_case: bool,
    literal: bool,
    globs: Vec<String>,
    context_lines: usize,
    max_results: usize,
    time_limit: Duration,
}

impl SearchRequestBuilder {
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn literal(mut self, literal: bool) -> Self {
        self.literal = literal;
        self
    }

    pub fn glob(mut self, glob: impl Into<String>) -> Self {
        self.globs.push(glob.into());
        self
    }

    pub fn globs<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globs.extend(globs.into_iter().map(Into::into));
        self
    }

    pub fn context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Validate and freeze the request. The pattern is trimmed.
    pub fn build(self) -> Result<SearchRequest, RequestError> {
        let pattern = self.pattern.trim().to_string();
        if pattern.is_empty() {
            return Err(RequestError::EmptyPattern);
        }
        if !self.root.is_absolute() {
            return Err(RequestError::RelativeRoot(self.root));
        }
        if self.max_results == 0 {
            return Err(RequestError::ZeroMaxResults);
        }
        if self.time_limit.is_zero() {
            return Err(RequestError::ZeroTimeLimit);
        }

        Ok(SearchRequest {
            pattern,
            root: self.root,
            ignore_case: self.ignore_case,
            literal: self.literal,
            globs: self.globs,
            context_lines: self.context_lines,
            max_results: self.max_results,
            time_limit: self.time_limit,
        })
    }
}

/// Byte span of a matched substring within a line's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// A `match` or `context` line reported by the search process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Path relative to the search root, '/' separated
    pub path: String,
    pub line_number: u64,
    /// Line text without its trailing line terminator
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submatches: Vec<MatchSpan>,
}

/// One decoded line of search process output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawEvent {
    Begin { path: String },
    Match(LineRecord),
    Context(LineRecord),
    End { path: String },
    Other,
}

impl RawEvent {
    pub fn path(&self) -> Option<&str> {
        match self {
            RawEvent::Begin { path } | RawEvent::End { path } => Some(path),
            RawEvent::Match(line) | RawEvent::Context(line) => Some(&line.path),
            RawEvent::Other => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, RawEvent::Match(_))
    }
}

/// Why collection stopped early, if it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Truncation {
    /// The search process finished on its own
    #[default]
    None,
    /// The result cap was reached
    Count,
    /// The time budget ran out
    Time,
}

/// Everything one collector run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionResult {
    /// Events in the order the search process emitted them
    pub events: Vec<RawEvent>,
    pub truncation: Truncation,
    /// Lines that were dropped because they could not be decoded
    pub decode_failures: usize,
    pub elapsed: Duration,
}

impl CollectionResult {
    pub fn match_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_match()).count()
    }

    pub fn truncated_by_count(&self) -> bool {
        self.truncation == Truncation::Count
    }

    pub fn truncated_by_time(&self) -> bool {
        self.truncation == Truncation::Time
    }
}

/// One rendered line inside a file group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLine {
    pub line_number: u64,
    pub text: String,
    pub is_match: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<MatchSpan>,
}

/// A contiguous region of results within one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroup {
    pub path: String,
    pub lines: Vec<DisplayLine>,
}

/// Renderer-agnostic outcome of one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub pattern: String,
    pub groups: Vec<FileGroup>,
    /// Widest line number (in digits) across all groups
    pub line_number_width: usize,
    pub match_count: usize,
    pub truncated_by_count: bool,
    pub truncated_by_time: bool,
    #[serde(default)]
    pub decode_failures: usize,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl SearchReport {
    /// Report for a search that never ran (blank pattern)
    pub fn empty(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            groups: Vec::new(),
            line_number_width: 1,
            match_count: 0,
            truncated_by_count: false,
            truncated_by_time: false,
            decode_failures: 0,
            elapsed_ms: 0,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated_by_count || self.truncated_by_time
    }
}

/// A single line of a viewed file, 1-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedLine {
    pub line_number: u64,
    pub text: String,
}

/// Contents of a file read through the path-scoped reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileView {
    pub path: String,
    pub lines: Vec<NumberedLine>,
    /// Whether invalid UTF-8 had to be replaced
    #[serde(default)]
    pub lossy: bool,
}
