//! Path safety validation for mapping sources and destinations.
//!
//! Every path declared in a configuration (file or directory, src or dest,
//! inline or list-sourced) must stay inside its repository root. This module
//! rejects absolute paths and paths that lexically escape the root via `..`.
//!
//! Normalization happens *before* the traversal check: `a/../b` normalizes to
//! `b` and is accepted, while `../escape` keeps its leading `..` and is
//! rejected. Checking is purely lexical; no filesystem access occurs.

use crate::error::{Error, Result};

/// Lexically normalize a relative path, resolving `.` and `..` segments.
///
/// Interior `..` segments cancel the preceding segment; leading `..` segments
/// that cannot be canceled are preserved so the caller can detect escapes.
///
/// # Examples
///
/// ```
/// use sync_config::path::normalize;
///
/// assert_eq!(normalize("a/../b"), "b");
/// assert_eq!(normalize("./docs//README.md"), "docs/README.md");
/// assert_eq!(normalize("../escape"), "../escape");
/// ```
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(&s) if s != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Check that a path is repository-relative and does not escape its root.
///
/// The `context` identifies the declaration being checked (group, target,
/// mapping) and is carried into the returned error.
pub fn check_path(path: &str, context: &str) -> Result<()> {
    if is_absolute(path) {
        return Err(Error::AbsolutePath {
            path: path.to_string(),
            context: context.to_string(),
        });
    }

    let normalized = normalize(path);
    if normalized == ".." || normalized.starts_with("../") {
        return Err(Error::PathTraversal {
            path: path.to_string(),
            context: context.to_string(),
        });
    }

    Ok(())
}

/// Paths are compared as declared, with forward slashes; a leading slash,
/// backslash, or Windows drive prefix all count as absolute.
fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}
