//! Error types
//!
//! One enum per layer. Decode failures never leave the collector; everything a
//! caller can observe funnels into [`ServiceError`], which knows its HTTP
//! status class and the process exit code the CLI uses for it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// sysexits(3) codes used by the CLI
pub mod exit_code {
    pub const DATA_ERR: i32 = 65;
    pub const NO_INPUT: i32 = 66;
    pub const UNAVAILABLE: i32 = 69;
    pub const IO_ERR: i32 = 74;
    pub const NO_PERM: i32 = 77;
    pub const CONFIG: i32 = 78;
}

/// Rejected while building a [`crate::core::model::SearchRequest`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("search pattern is empty")]
    EmptyPattern,

    #[error("search root must be an absolute path: {}", .0.display())]
    RelativeRoot(PathBuf),

    #[error("max results must be at least 1")]
    ZeroMaxResults,

    #[error("time limit must be greater than zero")]
    ZeroTimeLimit,
}

/// A single line of search output that could not be turned into an event
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line of {len} bytes exceeds the {limit} byte ceiling")]
    Oversized { len: usize, limit: usize },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} message is missing `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("{kind} message carries non-UTF-8 `{field}`")]
    NonUtf8 {
        kind: &'static str,
        field: &'static str,
    },
}

/// Failure of the search process itself (never a decode or timeout)
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("search process I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Failure of the path-scoped file reader
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("path escapes the search root: {0}")]
    Forbidden(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file too large to view: {path} ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Everything the request layer can fail with
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("forbidden: actor is not allowed to view this instance")]
    Forbidden,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    View(#[from] ViewError),
}

impl ServiceError {
    /// HTTP status class a host would answer with
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::Forbidden | ServiceError::View(ViewError::Forbidden(_)) => 403,
            ServiceError::View(ViewError::NotFound(_)) => 404,
            ServiceError::View(ViewError::TooLarge { .. }) => 413,
            _ => 500,
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::Forbidden | ServiceError::View(ViewError::Forbidden(_)) => {
                exit_code::NO_PERM
            }
            ServiceError::View(ViewError::NotFound(_)) => exit_code::NO_INPUT,
            ServiceError::View(ViewError::TooLarge { .. }) => exit_code::DATA_ERR,
            ServiceError::Config(_) | ServiceError::Request(_) => exit_code::CONFIG,
            ServiceError::Search(SearchError::Launch { .. }) => exit_code::UNAVAILABLE,
            ServiceError::Search(SearchError::Io(_)) | ServiceError::View(ViewError::Io { .. }) => {
                exit_code::IO_ERR
            }
        }
    }
}
