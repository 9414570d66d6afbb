//! Default values and the default cascader.
//!
//! Fallbacks are layered: document-wide settings seed group-level ones,
//! which in turn fill target and mapping level gaps. A default is applied
//! only when a field is genuinely unset (`None` or an empty string); an
//! explicit value, including an explicit empty collection, is never
//! overwritten. The cascade is idempotent, which matters because it runs
//! both after decode and again after list resolution so list-sourced
//! directory mappings pick up mapping-level defaults too.

use crate::config::Config;

/// Branch synced from when a source declares none.
pub const DEFAULT_BRANCH: &str = "main";

/// Prefix for generated sync branches when no default is declared.
pub const DEFAULT_BRANCH_PREFIX: &str = "chore/sync-files";

/// Label attached to sync pull requests when no defaults are declared.
pub const DEFAULT_PR_LABEL: &str = "automated-sync";

/// Glob patterns excluded from directory syncs when a mapping declares no
/// exclusions: VCS directories, dependency/build artifacts, OS metadata,
/// and temp files.
pub const DEFAULT_DIRECTORY_EXCLUDES: &[&str] = &[
    ".git/**",
    ".svn/**",
    ".hg/**",
    "node_modules/**",
    "target/**",
    "dist/**",
    "build/**",
    "tmp/**",
    "*.tmp",
    "*.swp",
    ".DS_Store",
    "Thumbs.db",
];

/// Apply cascading defaults to every group and mapping in place.
///
/// Runs during [`Config::load`](crate::config::Config::load), before and
/// after list resolution. Safe to call any number of times.
pub fn apply_defaults(config: &mut Config) {
    let document_branch_prefix = config.defaults.branch_prefix.clone();
    let document_labels = config.defaults.pr_labels.clone();
    let document_title = config.defaults.pr_title.clone();
    let document_global_labels = config.global.pr_labels.clone();

    for group in &mut config.groups {
        if group.source.branch.is_empty() {
            group.source.branch = DEFAULT_BRANCH.to_string();
        }

        if group.defaults.branch_prefix.is_empty() {
            group.defaults.branch_prefix = if document_branch_prefix.is_empty() {
                DEFAULT_BRANCH_PREFIX.to_string()
            } else {
                document_branch_prefix.clone()
            };
        }

        if group.defaults.pr_labels.is_none() {
            group.defaults.pr_labels = Some(
                document_labels
                    .clone()
                    .unwrap_or_else(|| vec![DEFAULT_PR_LABEL.to_string()]),
            );
        }

        if group.defaults.pr_title.is_none() {
            group.defaults.pr_title = document_title.clone();
        }

        // Document-wide labels are additive and never overridden.
        for label in &document_global_labels {
            if !group.global.pr_labels.contains(label) {
                group.global.pr_labels.push(label.clone());
            }
        }

        if group.enabled.is_none() {
            group.enabled = Some(true);
        }

        for target in &mut group.targets {
            for mapping in &mut target.directories {
                if mapping.exclude.is_none() {
                    mapping.exclude = Some(
                        DEFAULT_DIRECTORY_EXCLUDES
                            .iter()
                            .map(|p| p.to_string())
                            .collect(),
                    );
                }
                if mapping.preserve_structure.is_none() {
                    mapping.preserve_structure = Some(true);
                }
                if mapping.include_hidden.is_none() {
                    mapping.include_hidden = Some(true);
                }
            }
        }
    }
}
