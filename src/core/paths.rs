//! Path normalization and root confinement
//!
//! All paths handed to callers are relative to the search root and use '/' as
//! separator. Anything resolving outside the root is rejected.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::core::error::ViewError;

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Normalize a path reported by the search process: '/' separators, no
/// leading `./`
pub fn normalize_path_text(text: &str) -> String {
    let mut normalized = text.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized
}

/// Lexically check that `relative` names something strictly below the root.
///
/// Returns the path with `.` and `..` segments folded away, or `None` if it is
/// absolute, empty, names the root itself, or climbs above it.
pub fn relative_within_root(relative: &str) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.iter().collect())
}

/// True if `path` lies below `root` (component-wise, never equal to it)
pub fn is_strict_descendant(path: &Path, root: &Path) -> bool {
    path != root && path.starts_with(root)
}

/// Resolve a caller-supplied relative path against `root`.
///
/// The lexical check runs first so traversal attempts are refused without
/// touching the filesystem. Containment is then re-checked on the fully
/// canonicalized path, which catches symlinks pointing out of the root.
pub fn resolve_within_root(root: &Path, relative: &str) -> Result<PathBuf, ViewError> {
    let lexical =
        relative_within_root(relative).ok_or_else(|| ViewError::Forbidden(relative.to_string()))?;

    let canonical_root = root.canonicalize().map_err(|source| ViewError::Io {
        path: normalize_path(root),
        source,
    })?;

    let resolved = match canonical_root.join(&lexical).canonicalize() {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(ViewError::Io {
                path: relative.to_string(),
                source: e,
            })
        }
        Err(_) => return Err(ViewError::NotFound(relative.to_string())),
    };

    if !is_strict_descendant(&resolved, &canonical_root) {
        return Err(ViewError::Forbidden(relative.to_string()));
    }

    Ok(resolved)
}
