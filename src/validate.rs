//! # Configuration Validation
//!
//! This module implements semantic validation of a loaded configuration:
//! identifier format checks, per-target structural and security checks, and
//! the fail-fast orchestrator that sequences them. Validation operates on
//! the canonical group form produced at load time and on fully expanded
//! mappings; it runs after default cascading and list resolution.
//!
//! ## Pipeline
//!
//! 1. Version check against [`SUPPORTED_VERSION`](crate::config::SUPPORTED_VERSION).
//! 2. List definitions, in declared order: structural, path, and pattern
//!    checks on every entry. Expansion can shadow an entry or never
//!    reference its list; neither exempts the declaration from checking.
//! 3. Per group, in declared order: source validation, global/defaults
//!    validation, and per-target validation with a case-folded seen-repo
//!    set for duplicate detection.
//! 4. One dependency-graph check over the complete group set.
//!
//! The first violation wins; errors are never accumulated. Every error
//! carries positional context (group index/ID, target index/repo, mapping
//! index).
//!
//! ## Cancellation and Tracing
//!
//! Cancellation is advisory and polled, never preemptive: a shared
//! [`CancelToken`] is checked before each group, each target, and each
//! mapping, and surfaces as a `ValidationCanceled` error carrying the poll
//! site and the cancellation reason. Step-level tracing goes through the
//! `log` facade when [`ValidateOptions::trace`] is set and is a no-op
//! unless the embedding application installs a logger; it never substitutes
//! for the returned error.

use crate::config::{Config, DirectoryMapping, FileMapping, Group, Target, SUPPORTED_VERSION};
use crate::error::{Error, Result};
use crate::graph;
use crate::path;
use log::debug;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

/// Two `org/repo` segments, each starting alphanumeric followed by word
/// characters, dots, or hyphens. Compiled once; safe for unsynchronized
/// concurrent reads.
static REPO_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][\w.-]*/[A-Za-z0-9][\w.-]*$").expect("repo name pattern is valid")
});

/// Branch names and branch prefixes: alphanumeric start followed by word
/// characters, dots, slashes, or hyphens.
static BRANCH_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][\w./-]*$").expect("branch name pattern is valid"));

/// Check a repository name against the `org/repo` format.
pub fn check_repo_name(value: &str, context: &str) -> Result<()> {
    if REPO_NAME_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            field: "repository name".to_string(),
            value: value.to_string(),
            context: context.to_string(),
        })
    }
}

/// Check a branch name or branch prefix against the branch format.
///
/// `field` names the declaration being checked (`branch`, `branch_prefix`).
pub fn check_branch_name(field: &str, value: &str, context: &str) -> Result<()> {
    if BRANCH_NAME_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            field: field.to_string(),
            value: value.to_string(),
            context: context.to_string(),
        })
    }
}

/// Shared flag for cooperative cancellation of a running validation.
///
/// Cloning is cheap; all clones observe the same flag. Canceling records a
/// reason that is carried into the resulting error.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    flag: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation with a generic reason.
    pub fn cancel(&self) {
        self.cancel_with("canceled by caller");
    }

    /// Request cancellation, recording why.
    pub fn cancel_with(&self, reason: impl Into<String>) {
        let mut guard = self
            .inner
            .reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(reason.into());
        self.inner.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    fn reason(&self) -> String {
        self.inner
            .reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .unwrap_or_else(|| "canceled".to_string())
    }
}

/// Options for a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Emit step-level `log::debug!` lines while validating.
    pub trace: bool,

    /// Polled at iteration boundaries; `None` disables cancellation.
    pub cancel: Option<CancelToken>,
}

impl ValidateOptions {
    fn check_canceled(&self, at: &str) -> Result<()> {
        if let Some(token) = &self.cancel {
            if token.is_canceled() {
                return Err(Error::ValidationCanceled {
                    at: at.to_string(),
                    reason: token.reason(),
                });
            }
        }
        Ok(())
    }

    fn trace(&self, step: &str) {
        if self.trace {
            debug!("validate: {}", step);
        }
    }
}

impl Config {
    /// Validate the loaded configuration. Fail-fast: the first violation
    /// is returned and nothing further is checked.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&ValidateOptions::default())
    }

    /// Validate with optional step tracing and cooperative cancellation.
    pub fn validate_with(&self, opts: &ValidateOptions) -> Result<()> {
        if self.version != SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion {
                version: self.version,
                supported: SUPPORTED_VERSION,
            });
        }

        validate_lists(self, opts)?;

        let flat = !self.is_group_based();
        for (group_index, group) in self.groups().iter().enumerate() {
            let context = group_context(group_index, group);
            opts.check_canceled(&context)?;
            opts.trace(&context);
            validate_group(group_index, group, flat, opts)?;
        }

        opts.trace("dependency graph");
        graph::check_dependencies(self.groups())
    }
}

/// Check every declared list entry, referenced or not.
///
/// The resolver works per destination: a list entry shadowed by an inline
/// mapping, or in a list no target references, never reaches the expanded
/// per-target checks. The declaration itself still must not carry unsafe
/// paths or malformed patterns.
fn validate_lists(config: &Config, opts: &ValidateOptions) -> Result<()> {
    for (list_index, list) in config.file_lists.iter().enumerate() {
        let context = list_context(list_index, "file list", &list.id);
        opts.check_canceled(&context)?;
        opts.trace(&context);
        for (mapping_index, mapping) in list.files.iter().enumerate() {
            let mapping_ctx = format!("{}, file mapping {}", context, mapping_index);
            validate_file_mapping(mapping, &mapping_ctx)?;
        }
    }

    for (list_index, list) in config.directory_lists.iter().enumerate() {
        let context = list_context(list_index, "directory list", &list.id);
        opts.check_canceled(&context)?;
        opts.trace(&context);
        for (mapping_index, mapping) in list.directories.iter().enumerate() {
            let mapping_ctx = format!("{}, directory mapping {}", context, mapping_index);
            validate_directory_mapping(mapping, &mapping_ctx)?;
        }
    }

    Ok(())
}

fn validate_group(group_index: usize, group: &Group, flat: bool, opts: &ValidateOptions) -> Result<()> {
    let context = group_context(group_index, group);

    if group.source.repo.is_empty() {
        return Err(Error::MissingRequiredField {
            field: "source.repo".to_string(),
            context: context.clone(),
        });
    }
    check_repo_name(&group.source.repo, &context)?;
    check_branch_name("branch", &group.source.branch, &context)?;

    // Cascading guarantees a branch prefix and a label list by this point;
    // both still carry user-declared values that need checking.
    if !group.defaults.branch_prefix.is_empty() {
        check_branch_name("branch_prefix", &group.defaults.branch_prefix, &context)?;
    }
    if let Some(labels) = &group.defaults.pr_labels {
        check_labels(labels, &context)?;
    }
    check_labels(&group.global.pr_labels, &context)?;

    let mut seen_repos: HashSet<String> = HashSet::new();
    for (target_index, target) in group.targets.iter().enumerate() {
        let target_ctx = format!("{}, {}", context, target_context(target_index, target));
        opts.check_canceled(&target_ctx)?;
        opts.trace(&target_ctx);

        if target.repo.is_empty() {
            return Err(Error::MissingRequiredField {
                field: "repo".to_string(),
                context: target_ctx,
            });
        }
        check_repo_name(&target.repo, &target_ctx)?;

        if !seen_repos.insert(target.repo.to_lowercase()) {
            return Err(Error::DuplicateTarget {
                group: context.clone(),
                repo: target.repo.clone(),
            });
        }

        validate_target(target, &target_ctx, flat, opts)?;
    }

    Ok(())
}

fn validate_target(target: &Target, context: &str, flat: bool, opts: &ValidateOptions) -> Result<()> {
    if flat && !target.directories.is_empty() {
        return Err(Error::DirectoriesNotSupported {
            context: context.to_string(),
        });
    }
    if target.files.is_empty() && target.directories.is_empty() {
        return Err(Error::NoMappings {
            context: context.to_string(),
        });
    }

    if let Some(branch) = &target.branch {
        check_branch_name("branch", branch, context)?;
    }
    if let Some(labels) = &target.pr_labels {
        check_labels(labels, context)?;
    }

    // The destination set spans files and directories: a duplicate within
    // one kind and a file/directory collision are reported distinctly.
    let mut destinations: HashMap<&str, DestKind> = HashMap::new();

    for (mapping_index, mapping) in target.files.iter().enumerate() {
        let mapping_ctx = format!("{}, file mapping {}", context, mapping_index);
        opts.check_canceled(&mapping_ctx)?;
        validate_file_mapping(mapping, &mapping_ctx)?;
        claim_destination(&mut destinations, &mapping.dest, DestKind::File, &mapping_ctx)?;
    }

    for (mapping_index, mapping) in target.directories.iter().enumerate() {
        let mapping_ctx = format!("{}, directory mapping {}", context, mapping_index);
        opts.check_canceled(&mapping_ctx)?;
        validate_directory_mapping(mapping, &mapping_ctx)?;
        claim_destination(
            &mut destinations,
            &mapping.dest,
            DestKind::Directory,
            &mapping_ctx,
        )?;
    }

    Ok(())
}

fn validate_file_mapping(mapping: &FileMapping, context: &str) -> Result<()> {
    if mapping.dest.is_empty() {
        return Err(Error::MissingRequiredField {
            field: "dest".to_string(),
            context: context.to_string(),
        });
    }
    // Deletions may carry an empty or placeholder src.
    if !mapping.delete && mapping.src.is_empty() {
        return Err(Error::MissingRequiredField {
            field: "src".to_string(),
            context: context.to_string(),
        });
    }

    if !mapping.src.is_empty() {
        path::check_path(&mapping.src, context)?;
    }
    path::check_path(&mapping.dest, context)?;
    Ok(())
}

fn validate_directory_mapping(mapping: &DirectoryMapping, context: &str) -> Result<()> {
    if mapping.dest.is_empty() {
        return Err(Error::MissingRequiredField {
            field: "dest".to_string(),
            context: context.to_string(),
        });
    }
    if !mapping.delete && mapping.src.is_empty() {
        return Err(Error::MissingRequiredField {
            field: "src".to_string(),
            context: context.to_string(),
        });
    }

    if !mapping.src.is_empty() {
        path::check_path(&mapping.src, context)?;
    }
    path::check_path(&mapping.dest, context)?;

    // Malformed patterns are rejected here, not at match time.
    for pattern in mapping.exclude.iter().flatten() {
        check_glob(pattern, context)?;
    }
    for pattern in mapping.include_only.iter().flatten() {
        check_glob(pattern, context)?;
    }

    Ok(())
}

fn check_glob(pattern: &str, context: &str) -> Result<()> {
    glob::Pattern::new(pattern)
        .map(|_| ())
        .map_err(|source| Error::InvalidGlob {
            context: context.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

fn check_labels(labels: &[String], context: &str) -> Result<()> {
    for label in labels {
        if label.trim().is_empty() {
            return Err(Error::EmptyLabel {
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DestKind {
    File,
    Directory,
}

fn claim_destination<'a>(
    destinations: &mut HashMap<&'a str, DestKind>,
    dest: &'a str,
    kind: DestKind,
    context: &str,
) -> Result<()> {
    match destinations.insert(dest, kind) {
        None => Ok(()),
        Some(previous) if previous == kind => Err(Error::DuplicateDestination {
            context: context.to_string(),
            dest: dest.to_string(),
        }),
        Some(_) => Err(Error::FileDirectoryDestinationConflict {
            context: context.to_string(),
            dest: dest.to_string(),
        }),
    }
}

fn group_context(index: usize, group: &Group) -> String {
    if group.id.is_empty() {
        format!("group {}", index)
    } else {
        format!("group {} ({})", index, group.id)
    }
}

fn target_context(index: usize, target: &Target) -> String {
    if target.repo.is_empty() {
        format!("target {}", index)
    } else {
        format!("target {} ({})", index, target.repo)
    }
}

fn list_context(index: usize, kind: &str, id: &str) -> String {
    if id.is_empty() {
        format!("{} {}", kind, index)
    } else {
        format!("{} {} ({})", kind, index, id)
    }
}
