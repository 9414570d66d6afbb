//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `sync-config` engine. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur while loading, resolving, or validating a configuration. Each
//!   variant corresponds to a specific type of error and includes positional
//!   context (group, target, mapping) so the offending declaration can be
//!   located without a source-line map.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the crate to simplify function signatures.
//!
//! ## Load vs. Validation Errors
//!
//! Errors raised while loading a document (`Io`, `Yaml`, including unknown
//! field rejection) are distinct variants from the semantic errors raised by
//! validation, so callers can tell "not well-formed" apart from "well-formed
//! but invalid". Every validator returns on the first violation; errors are
//! never accumulated, silently discarded, or partially reported.

use thiserror::Error;

/// Main error type for configuration loading, resolution, and validation.
#[derive(Error, Debug)]
pub enum Error {
    /// The document declares a configuration version this engine does not
    /// support.
    #[error("unsupported configuration version {version} (supported: {supported})")]
    UnsupportedVersion { version: u64, supported: u64 },

    /// A required field is empty or missing.
    #[error("missing required field '{field}' in {context}")]
    MissingRequiredField { field: String, context: String },

    /// A value does not match the required format (repository or branch
    /// name, or a structural rule with no more specific variant).
    #[error("invalid {field} {value:?} in {context}")]
    InvalidFormat {
        field: String,
        value: String,
        context: String,
    },

    /// A path lexically escapes its root via `..` after normalization.
    #[error("path {path:?} escapes the repository root in {context}")]
    PathTraversal { path: String, context: String },

    /// A path is absolute; all mapping paths must be repository-relative.
    #[error("path {path:?} is absolute in {context}")]
    AbsolutePath { path: String, context: String },

    /// Two lists of the same kind share an ID.
    #[error("duplicate {kind} id {id:?}")]
    DuplicateListId { kind: String, id: String },

    /// A target references a list ID that does not exist.
    #[error("{kind} reference {reference:?} not found for {target} in {group}")]
    ListReferenceNotFound {
        group: String,
        target: String,
        reference: String,
        kind: String,
    },

    /// The same target repository appears twice within one group
    /// (case-insensitive).
    #[error("duplicate target repository {repo:?} in {group}")]
    DuplicateTarget { group: String, repo: String },

    /// Two mappings of the same kind within one target share a destination.
    #[error("duplicate destination {dest:?} in {context}")]
    DuplicateDestination { context: String, dest: String },

    /// A file mapping and a directory mapping within one target share a
    /// destination.
    #[error("destination {dest:?} is claimed by both a file and a directory mapping in {context}")]
    FileDirectoryDestinationConflict { context: String, dest: String },

    /// A target declares neither file nor directory mappings.
    #[error("no file or directory mappings declared for {context}")]
    NoMappings { context: String },

    /// The flat (legacy) configuration form does not support directory
    /// mappings.
    #[error("directory mappings are not supported in the flat configuration form ({context})")]
    DirectoriesNotSupported { context: String },

    /// A pull request label is empty after trimming surrounding whitespace.
    #[error("empty pull request label in {context}")]
    EmptyLabel { context: String },

    /// An exclude or include-only entry is not a syntactically valid glob
    /// pattern.
    #[error("invalid glob pattern {pattern:?} in {context}: {source}")]
    InvalidGlob {
        context: String,
        pattern: String,
        source: glob::PatternError,
    },

    /// Two groups share an ID.
    #[error("duplicate group id {id:?}")]
    DuplicateGroupId { id: String },

    /// A group lists its own ID in `depends_on`.
    #[error("group {group:?} depends on itself")]
    SelfDependency { group: String },

    /// A `depends_on` entry names a group that does not exist.
    #[error("group {group:?} depends on unknown group {dependency:?}")]
    UnknownDependency { group: String, dependency: String },

    /// The group dependency relation contains a cycle.
    #[error("circular dependency detected involving group {group:?}")]
    CircularDependency { group: String },

    /// Under the `error` conflict strategy, two sources claim the same
    /// destination in the same target repository.
    #[error(
        "destination {dest:?} in {repo:?} is claimed by both source {first:?} and source {second:?}"
    )]
    DestinationConflict {
        repo: String,
        dest: String,
        first: String,
        second: String,
    },

    /// Validation was canceled cooperatively between validation steps.
    #[error("validation canceled at {at}: {reason}")]
    ValidationCanceled { at: String, reason: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML decoding error, wrapped from `serde_yaml::Error`. Unknown
    /// fields anywhere in the document surface as this variant.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unsupported_version() {
        let error = Error::UnsupportedVersion {
            version: 2,
            supported: 1,
        };
        let display = format!("{}", error);
        assert!(display.contains("unsupported configuration version 2"));
        assert!(display.contains("supported: 1"));
    }

    #[test]
    fn test_error_display_missing_required_field() {
        let error = Error::MissingRequiredField {
            field: "dest".to_string(),
            context: "group 0 (ci), target 1 (org/service), file mapping 2".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("missing required field 'dest'"));
        assert!(display.contains("file mapping 2"));
    }

    #[test]
    fn test_error_display_path_traversal() {
        let error = Error::PathTraversal {
            path: "../escape".to_string(),
            context: "group 0".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("../escape"));
        assert!(display.contains("escapes the repository root"));
    }

    #[test]
    fn test_error_display_list_reference_not_found() {
        let error = Error::ListReferenceNotFound {
            group: "group 0 (ci)".to_string(),
            target: "target 0 (org/service)".to_string(),
            reference: "missing-list".to_string(),
            kind: "file_list".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("missing-list"));
        assert!(display.contains("org/service"));
        assert!(display.contains("ci"));
    }

    #[test]
    fn test_error_display_dependency_errors() {
        let display = format!("{}", Error::SelfDependency { group: "a".into() });
        assert!(display.contains("depends on itself"));

        let display = format!(
            "{}",
            Error::UnknownDependency {
                group: "y".into(),
                dependency: "nonexistent".into(),
            }
        );
        assert!(display.contains("nonexistent"));

        let display = format!("{}", Error::CircularDependency { group: "a".into() });
        assert!(display.contains("circular dependency"));
    }

    #[test]
    fn test_error_display_destination_conflict() {
        let error = Error::DestinationConflict {
            repo: "org/service".to_string(),
            dest: "Makefile".to_string(),
            first: "templates".to_string(),
            second: "ci".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Makefile"));
        assert!(display.contains("templates"));
        assert!(display.contains("ci"));
    }

    #[test]
    fn test_error_display_validation_canceled() {
        let error = Error::ValidationCanceled {
            at: "group 1 (docs)".to_string(),
            reason: "shutdown requested".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("validation canceled"));
        assert!(display.contains("group 1 (docs)"));
        assert!(display.contains("shutdown requested"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error =
            serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        let display = format!("{}", error);
        assert!(display.contains("YAML parsing error"));
    }
}
