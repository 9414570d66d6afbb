//! # Configuration Schema and Loading
//!
//! This module defines the data structures that represent a sync
//! configuration document, as well as the logic for loading it. A document
//! describes one or more source repositories, reusable named file/directory
//! lists, groups that bind a source to target repositories with dependency
//! ordering, and cascading default/global settings.
//!
//! ## Key Components
//!
//! - **`Config`**: The document root. Holds either a list of `Group`s or,
//!   for backward compatibility, a flat form (single `Source` plus
//!   `Target`s) that is adapted at load time into one synthetic group.
//!
//! - **`Group`**: An independently enable/disable-able unit binding one
//!   source repository to a set of target repositories, with optional
//!   ordering dependencies on other groups.
//!
//! - **`FileMapping` / `DirectoryMapping`**: Declared correspondences
//!   between a source-repository path and a target-repository path.
//!
//! - **`FileList` / `DirectoryList`**: Reusable named mapping fragments
//!   referenced by ID from targets.
//!
//! ## Loading
//!
//! Decoding is strict: any unknown field, top-level or nested, rejects the
//! entire document. This is a hard contract for catching declaration typos
//! early. [`Config::load`] and [`Config::from_reader`] perform decode,
//! legacy adaptation, default cascading, and list resolution, but do *not*
//! validate; call [`Config::validate`](crate::validate) separately.
//!
//! Once loaded, a `Config` is mutated in place only by the default cascader
//! and list resolver; after validation succeeds it is treated as immutable
//! and is safe for unrestricted concurrent read-only use.

use crate::defaults;
use crate::error::{Error, Result};
use crate::lists;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

/// The one configuration version this engine supports.
pub const SUPPORTED_VERSION: u64 = 1;

/// ID and name given to the synthetic group adapted from the flat form.
pub const FLAT_GROUP_ID: &str = "default";

/// Root of a sync configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Document schema version; must equal [`SUPPORTED_VERSION`].
    pub version: u64,

    /// Group-based form: each group binds a source to its targets.
    #[serde(default)]
    pub groups: Vec<Group>,

    /// Flat (legacy) form: a single source shared by all `targets`.
    /// Adapted into one synthetic group at load time.
    #[serde(default)]
    pub source: Option<Source>,

    /// Flat (legacy) form targets.
    #[serde(default)]
    pub targets: Vec<Target>,

    /// Reusable named file mapping lists, referenced by targets.
    #[serde(default)]
    pub file_lists: Vec<FileList>,

    /// Reusable named directory mapping lists, referenced by targets.
    #[serde(default)]
    pub directory_lists: Vec<DirectoryList>,

    /// Document-wide settings merged into every group, never overridden.
    #[serde(default)]
    pub global: GlobalSettings,

    /// Document-wide fallback values seeding group-level defaults.
    #[serde(default)]
    pub defaults: DefaultSettings,

    /// Policy for resolving multi-source fan-in conflicts.
    #[serde(default)]
    pub conflict_resolution: Option<ConflictResolution>,

    /// Whether the document declared `groups` (as opposed to the flat
    /// form). Set during legacy adaptation, never decoded.
    #[serde(skip)]
    group_based: bool,
}

/// A unit binding one source repository to a set of target repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Group {
    /// Human-readable group name.
    #[serde(default)]
    pub name: String,

    /// Unique key, referenced by other groups' `depends_on`.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Relative ordering hint for the executor; carried, not interpreted.
    #[serde(default)]
    pub priority: i64,

    /// IDs of groups that must be synced before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Tri-state: unset defaults to true during cascading, so an explicit
    /// `false` stays distinguishable from "not declared".
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub source: Source,

    /// Group-level settings merged with the document-wide `global`.
    #[serde(default)]
    pub global: GlobalSettings,

    /// Group-level fallbacks; seeded from the document-wide `defaults`.
    #[serde(default)]
    pub defaults: DefaultSettings,

    #[serde(default)]
    pub targets: Vec<Target>,
}

/// The repository files are synced from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    /// Repository in `org/repo` form.
    #[serde(default)]
    pub repo: String,

    /// Branch to read from; empty means unset and cascades to `main`.
    #[serde(default)]
    pub branch: String,

    /// Identifier used by priority-based conflict resolution.
    #[serde(default)]
    pub id: Option<String>,
}

/// A repository files are synced to, with its mappings and overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Repository in `org/repo` form.
    #[serde(default)]
    pub repo: String,

    /// Target-level branch override.
    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub files: Vec<FileMapping>,

    #[serde(default)]
    pub directories: Vec<DirectoryMapping>,

    /// IDs of file lists to expand into `files`; later refs win per
    /// destination, inline entries win over all refs.
    #[serde(default)]
    pub file_list_refs: Vec<String>,

    /// IDs of directory lists to expand into `directories`.
    #[serde(default)]
    pub directory_list_refs: Vec<String>,

    /// Content transform settings, carried through for the executor; this
    /// engine never evaluates them.
    #[serde(default)]
    pub transform: Option<Transform>,

    /// Pull request metadata overrides.
    #[serde(default)]
    pub pr_labels: Option<Vec<String>>,

    #[serde(default)]
    pub pr_title: Option<String>,

    #[serde(default)]
    pub pr_assignees: Vec<String>,
}

/// A single file correspondence between source and target repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileMapping {
    /// Path in the source repository. Required unless `delete` is set;
    /// deletions may carry an empty or placeholder src.
    #[serde(default)]
    pub src: String,

    /// Path in the target repository. Always required.
    #[serde(default)]
    pub dest: String,

    /// Delete `dest` from the target instead of copying.
    #[serde(default)]
    pub delete: bool,
}

/// A directory correspondence between source and target repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryMapping {
    #[serde(default)]
    pub src: String,

    #[serde(default)]
    pub dest: String,

    /// Glob patterns excluded from the sync. Unset cascades to the default
    /// exclusion set; an explicit empty list excludes nothing.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// When set, only paths matching these globs are synced.
    #[serde(default)]
    pub include_only: Option<Vec<String>>,

    /// Tri-state: unset cascades to true.
    #[serde(default)]
    pub preserve_structure: Option<bool>,

    /// Tri-state: unset cascades to true.
    #[serde(default)]
    pub include_hidden: Option<bool>,

    /// Module sync settings, carried through for the executor.
    #[serde(default)]
    pub module: Option<ModuleConfig>,

    /// Delete `dest` from the target instead of copying.
    #[serde(default)]
    pub delete: bool,
}

/// Module sync settings attached to a directory mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    #[serde(rename = "type", default)]
    pub module_type: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub check_tags: Option<bool>,
}

/// Opaque content transform settings carried through to the executor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transform {
    /// Substitute the target repository name into synced content.
    #[serde(default)]
    pub repo_name: bool,

    /// Template variables; data only, never evaluated here.
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// A reusable named collection of file mappings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileList {
    /// Unique across all file lists in the document.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub files: Vec<FileMapping>,
}

/// A reusable named collection of directory mappings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryList {
    /// Unique across all directory lists in the document.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub directories: Vec<DirectoryMapping>,
}

/// Settings merged across all targets, never overridden by more specific
/// levels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Labels attached to every pull request.
    #[serde(default)]
    pub pr_labels: Vec<String>,
}

/// Fallback values applied where no explicit value is declared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultSettings {
    /// Prefix for generated sync branches; empty means unset.
    #[serde(default)]
    pub branch_prefix: String,

    /// Default pull request labels. Unset cascades to the built-in label;
    /// an explicit empty list means "no labels".
    #[serde(default)]
    pub pr_labels: Option<Vec<String>>,

    #[serde(default)]
    pub pr_title: Option<String>,
}

/// Policy for resolving conflicts when multiple sources target the same
/// repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConflictResolution {
    #[serde(default)]
    pub strategy: ConflictStrategy,

    /// Source IDs ordered highest priority first; only consulted by the
    /// `priority` strategy. Unlisted IDs sort last.
    #[serde(default)]
    pub priority: Vec<String>,
}

/// Which source's content wins when two sources claim the same destination.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Later-declared source wins per destination.
    #[default]
    LastWins,
    /// Sources ranked by the declared priority list of source IDs.
    Priority,
    /// Any destination claimed by more than one source is a hard failure.
    Error,
}

/// One (source, target, effective-defaults) contribution, as consumed by
/// the sync executor and the conflict resolver.
#[derive(Debug, Clone, Copy)]
pub struct SourceTarget<'a> {
    pub group: &'a Group,
    pub source: &'a Source,
    pub target: &'a Target,
    pub defaults: &'a DefaultSettings,
}

impl Config {
    /// Load a configuration from a YAML file.
    ///
    /// Performs strict decode, legacy adaptation, default cascading, and
    /// list resolution. Does not validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a configuration from an arbitrary byte stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Config> {
        let mut config: Config = serde_yaml::from_reader(reader)?;
        config.canonicalize()?;
        defaults::apply_defaults(&mut config);
        lists::resolve_lists(&mut config)?;
        // Directory defaults apply to list-sourced entries too; the cascade
        // only touches genuinely unset fields, so the second pass is
        // idempotent.
        defaults::apply_defaults(&mut config);
        Ok(config)
    }

    /// Load a configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Config> {
        Self::from_reader(yaml.as_bytes())
    }

    /// Adapt the flat (legacy) form into the canonical group representation.
    ///
    /// Pure translation, run once at load time: downstream code only ever
    /// sees `groups` and never branches on the declared form beyond
    /// [`Config::is_group_based`].
    fn canonicalize(&mut self) -> Result<()> {
        let has_flat = self.source.is_some() || !self.targets.is_empty();

        if !self.groups.is_empty() {
            if has_flat {
                return Err(Error::InvalidFormat {
                    field: "config".to_string(),
                    value: "groups".to_string(),
                    context: "a document cannot combine groups with a flat source/targets form"
                        .to_string(),
                });
            }
            self.group_based = true;
            return Ok(());
        }

        if has_flat {
            let source = self.source.take().ok_or_else(|| Error::MissingRequiredField {
                field: "source".to_string(),
                context: "flat configuration".to_string(),
            })?;
            self.groups.push(Group {
                name: FLAT_GROUP_ID.to_string(),
                id: FLAT_GROUP_ID.to_string(),
                source,
                targets: std::mem::take(&mut self.targets),
                ..Group::default()
            });
        }

        self.group_based = false;
        Ok(())
    }

    /// All groups in declared order. Format-transparent: the flat form
    /// appears as its single synthetic group.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Whether the document declared the group-based form.
    pub fn is_group_based(&self) -> bool {
        self.group_based
    }

    /// The effective conflict resolution policy; defaults to `last-wins`
    /// when the document omits one.
    pub fn conflict_policy(&self) -> ConflictResolution {
        self.conflict_resolution.clone().unwrap_or_default()
    }

    /// The set of all target repositories across enabled groups.
    pub fn all_targets(&self) -> BTreeSet<String> {
        self.enabled_groups()
            .flat_map(|group| group.targets.iter().map(|t| t.repo.clone()))
            .collect()
    }

    /// All (source, target, effective-defaults) contributions for one
    /// target repository, in group declaration order.
    ///
    /// Repository comparison is case-insensitive, matching the per-group
    /// duplicate rule. Multiple contributions mean multi-source fan-in; the
    /// conflict resolver decides which content wins per destination.
    pub fn target_mappings<'a>(&'a self, repo: &str) -> Vec<SourceTarget<'a>> {
        self.enabled_groups()
            .flat_map(|group| {
                group
                    .targets
                    .iter()
                    .filter(|t| t.repo.eq_ignore_ascii_case(repo))
                    .map(move |target| SourceTarget {
                        group,
                        source: &group.source,
                        target,
                        defaults: &group.defaults,
                    })
            })
            .collect()
    }

    fn enabled_groups(&self) -> impl Iterator<Item = &Group> + '_ {
        self.groups.iter().filter(|g| g.enabled != Some(false))
    }
}
