//! Path-scoped file reading
//!
//! Backs the view operation: resolves a caller-supplied path inside the root,
//! refuses anything that escapes it, and returns the content as numbered
//! lines. Non-UTF-8 bytes are replaced rather than rejected.

use std::fs;
use std::path::Path;

use crate::core::config::DEFAULT_MAX_VIEW_BYTES;
use crate::core::error::ViewError;
use crate::core::model::{FileView, NumberedLine};
use crate::core::paths::{relative_within_root, resolve_within_root, normalize_path};

/// Configuration for file reading
#[derive(Debug, Clone, Copy)]
pub struct FileReadConfig {
    /// Maximum file size to read (bytes)
    pub max_file_size: u64,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_VIEW_BYTES,
        }
    }
}

/// Read `relative` under `root` as numbered lines
pub fn read_file_lines(
    root: &Path,
    relative: &str,
    config: &FileReadConfig,
) -> Result<FileView, ViewError> {
    let resolved = resolve_within_root(root, relative)?;

    let metadata = fs::metadata(&resolved).map_err(|source| ViewError::Io {
        path: relative.to_string(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(ViewError::NotFound(relative.to_string()));
    }
    if metadata.len() > config.max_file_size {
        return Err(ViewError::TooLarge {
            path: relative.to_string(),
            size: metadata.len(),
            limit: config.max_file_size,
        });
    }

    let bytes = fs::read(&resolved).map_err(|source| ViewError::Io {
        path: relative.to_string(),
        source,
    })?;

    let (content, lossy) = match String::from_utf8(bytes) {
        Ok(content) => (content, false),
        Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
    };

    let lines = content
        .lines()
        .enumerate()
        .map(|(index, text)| NumberedLine {
            line_number: index as u64 + 1,
            text: text.to_string(),
        })
        .collect();

    // Report the lexically normalized path, which is what the caller asked for
    let path = relative_within_root(relative)
        .map(|p| normalize_path(&p))
        .unwrap_or_else(|| relative.to_string());

    Ok(FileView { path, lines, lossy })
}
