//! # Multi-Source Conflict Resolution
//!
//! When targets in different groups name the same repository (multi-source
//! fan-in), more than one source mapping can claim the same destination.
//! This module decides which content wins per destination, according to the
//! document's [`ConflictResolution`] policy:
//!
//! - **`last-wins`**: destinations merge like the list resolver, the
//!   later-declared source winning ties.
//! - **`priority`**: sources are ranked by their Source ID's position in
//!   the declared priority list (unlisted IDs sort last); higher-priority
//!   claims stand, and later sources only fill unclaimed destinations.
//! - **`error`**: any destination claimed by more than one source is a
//!   hard failure naming both source IDs and the destination.
//!
//! The resolver is a pure function over the contributions returned by
//! [`Config::target_mappings`](crate::config::Config::target_mappings): it
//! never mutates the underlying targets and produces a derived, read-only
//! view for the executor. It applies to the group form only; the flat
//! legacy form has a single source by construction.

use crate::config::{
    ConflictResolution, ConflictStrategy, DefaultSettings, DirectoryMapping, FileMapping, Source,
    SourceTarget,
};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A file destination claimed by one source, with the defaults in effect
/// for its group.
#[derive(Debug, Clone, Copy)]
pub struct FileClaim<'a> {
    pub source: &'a Source,
    pub mapping: &'a FileMapping,
    pub defaults: &'a DefaultSettings,
}

/// A directory destination claimed by one source.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryClaim<'a> {
    pub source: &'a Source,
    pub mapping: &'a DirectoryMapping,
    pub defaults: &'a DefaultSettings,
}

/// The merged, per-destination execution plan for one target repository.
///
/// Keyed by destination; exactly one claim survives per destination.
#[derive(Debug, Default)]
pub struct MergedTarget<'a> {
    pub repo: String,
    pub files: BTreeMap<&'a str, FileClaim<'a>>,
    pub directories: BTreeMap<&'a str, DirectoryClaim<'a>>,
}

/// Merge every contribution targeting `repo` into one execution plan.
///
/// With exactly one contributing source there is no conflict and the plan
/// is that source's mappings verbatim.
pub fn resolve_conflicts<'a>(
    repo: &str,
    contributions: &[SourceTarget<'a>],
    policy: &ConflictResolution,
) -> Result<MergedTarget<'a>> {
    let mut plan = MergedTarget {
        repo: repo.to_string(),
        ..MergedTarget::default()
    };

    if contributions.len() <= 1 {
        if let Some(contribution) = contributions.first() {
            claim_last_wins(&mut plan, contribution);
        }
        return Ok(plan);
    }

    match policy.strategy {
        ConflictStrategy::LastWins => {
            for contribution in contributions {
                claim_last_wins(&mut plan, contribution);
            }
        }
        ConflictStrategy::Priority => {
            let mut ranked: Vec<&SourceTarget<'a>> = contributions.iter().collect();
            // Stable sort keeps declaration order among equal ranks.
            ranked.sort_by_key(|c| source_rank(c.source, policy));
            for contribution in ranked {
                claim_if_unclaimed(&mut plan, contribution);
            }
        }
        ConflictStrategy::Error => {
            for contribution in contributions {
                claim_or_fail(&mut plan, contribution, repo)?;
            }
        }
    }

    Ok(plan)
}

fn claim_last_wins<'a>(plan: &mut MergedTarget<'a>, contribution: &SourceTarget<'a>) {
    for mapping in &contribution.target.files {
        plan.files.insert(
            mapping.dest.as_str(),
            FileClaim {
                source: contribution.source,
                mapping,
                defaults: contribution.defaults,
            },
        );
    }
    for mapping in &contribution.target.directories {
        plan.directories.insert(
            mapping.dest.as_str(),
            DirectoryClaim {
                source: contribution.source,
                mapping,
                defaults: contribution.defaults,
            },
        );
    }
}

fn claim_if_unclaimed<'a>(plan: &mut MergedTarget<'a>, contribution: &SourceTarget<'a>) {
    for mapping in &contribution.target.files {
        plan.files.entry(mapping.dest.as_str()).or_insert(FileClaim {
            source: contribution.source,
            mapping,
            defaults: contribution.defaults,
        });
    }
    for mapping in &contribution.target.directories {
        plan.directories
            .entry(mapping.dest.as_str())
            .or_insert(DirectoryClaim {
                source: contribution.source,
                mapping,
                defaults: contribution.defaults,
            });
    }
}

fn claim_or_fail<'a>(
    plan: &mut MergedTarget<'a>,
    contribution: &SourceTarget<'a>,
    repo: &str,
) -> Result<()> {
    for mapping in &contribution.target.files {
        if let Some(existing) = plan.files.get(mapping.dest.as_str()) {
            return Err(conflict_error(repo, &mapping.dest, existing.source, contribution.source));
        }
        plan.files.insert(
            mapping.dest.as_str(),
            FileClaim {
                source: contribution.source,
                mapping,
                defaults: contribution.defaults,
            },
        );
    }
    for mapping in &contribution.target.directories {
        if let Some(existing) = plan.directories.get(mapping.dest.as_str()) {
            return Err(conflict_error(repo, &mapping.dest, existing.source, contribution.source));
        }
        plan.directories.insert(
            mapping.dest.as_str(),
            DirectoryClaim {
                source: contribution.source,
                mapping,
                defaults: contribution.defaults,
            },
        );
    }
    Ok(())
}

fn conflict_error(repo: &str, dest: &str, first: &Source, second: &Source) -> Error {
    Error::DestinationConflict {
        repo: repo.to_string(),
        dest: dest.to_string(),
        first: source_label(first),
        second: source_label(second),
    }
}

/// Position in the declared priority list; unlisted or ID-less sources
/// sort last.
fn source_rank(source: &Source, policy: &ConflictResolution) -> usize {
    source
        .id
        .as_deref()
        .and_then(|id| policy.priority.iter().position(|p| p == id))
        .unwrap_or(usize::MAX)
}

/// The source's ID when declared, its repository name otherwise.
fn source_label(source: &Source) -> String {
    source
        .id
        .clone()
        .unwrap_or_else(|| source.repo.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn fan_in_config(extra: &str) -> Config {
        let yaml = format!(
            r#"
version: 1
{extra}
groups:
  - id: a
    source: {{ repo: org/templates, id: tpl }}
    targets:
      - repo: org/service
        files:
          - src: tpl-makefile
            dest: Makefile
          - src: tpl-only
            dest: tpl-only.txt
  - id: b
    source: {{ repo: org/ci, id: ci }}
    targets:
      - repo: org/service
        files:
          - src: ci-makefile
            dest: Makefile
          - src: ci-only
            dest: ci-only.txt
"#
        );
        Config::parse(&yaml).unwrap()
    }

    #[test]
    fn test_single_source_has_no_conflict() {
        let config = Config::parse(
            r#"
version: 1
groups:
  - id: a
    source: { repo: org/templates, id: tpl }
    targets:
      - repo: org/service
        files: [{ src: f, dest: f }]
"#,
        )
        .unwrap();
        let contributions = config.target_mappings("org/service");
        let plan = resolve_conflicts(
            "org/service",
            &contributions,
            &ConflictResolution {
                strategy: ConflictStrategy::Error,
                priority: vec![],
            },
        )
        .unwrap();
        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.files["f"].mapping.src, "f");
    }

    #[test]
    fn test_last_wins_takes_later_declared_source() {
        let config = fan_in_config("");
        let contributions = config.target_mappings("org/service");
        let plan =
            resolve_conflicts("org/service", &contributions, &config.conflict_policy()).unwrap();

        assert_eq!(plan.files["Makefile"].mapping.src, "ci-makefile");
        // Non-conflicting destinations from both sources survive.
        assert_eq!(plan.files["tpl-only.txt"].mapping.src, "tpl-only");
        assert_eq!(plan.files["ci-only.txt"].mapping.src, "ci-only");
    }

    #[test]
    fn test_priority_ranks_by_declared_source_ids() {
        let config = fan_in_config(
            "conflict_resolution:\n  strategy: priority\n  priority: [tpl, ci]",
        );
        let contributions = config.target_mappings("org/service");
        let plan =
            resolve_conflicts("org/service", &contributions, &config.conflict_policy()).unwrap();

        // tpl outranks ci, so its Makefile claim stands; ci still fills
        // destinations tpl never claimed.
        assert_eq!(plan.files["Makefile"].mapping.src, "tpl-makefile");
        assert_eq!(plan.files["ci-only.txt"].mapping.src, "ci-only");
    }

    #[test]
    fn test_priority_unlisted_sources_sort_last() {
        let config = fan_in_config("conflict_resolution:\n  strategy: priority\n  priority: [ci]");
        let contributions = config.target_mappings("org/service");
        let plan =
            resolve_conflicts("org/service", &contributions, &config.conflict_policy()).unwrap();
        assert_eq!(plan.files["Makefile"].mapping.src, "ci-makefile");
    }

    #[test]
    fn test_error_strategy_names_both_sources_and_destination() {
        let config = fan_in_config("conflict_resolution:\n  strategy: error");
        let contributions = config.target_mappings("org/service");
        let err = resolve_conflicts("org/service", &contributions, &config.conflict_policy())
            .unwrap_err();
        match &err {
            Error::DestinationConflict {
                repo,
                dest,
                first,
                second,
            } => {
                assert_eq!(repo, "org/service");
                assert_eq!(dest, "Makefile");
                assert_eq!(first, "tpl");
                assert_eq!(second, "ci");
            }
            other => panic!("expected DestinationConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_resolver_does_not_mutate_targets() {
        let config = fan_in_config("");
        let before = serde_yaml::to_string(&config.groups()[0]).unwrap();
        let contributions = config.target_mappings("org/service");
        let _ = resolve_conflicts("org/service", &contributions, &config.conflict_policy());
        let after = serde_yaml::to_string(&config.groups()[0]).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_directories_merge_per_destination_too() {
        let config = Config::parse(
            r#"
version: 1
groups:
  - id: a
    source: { repo: org/templates, id: tpl }
    targets:
      - repo: org/service
        directories:
          - src: tpl-docs
            dest: docs
  - id: b
    source: { repo: org/ci, id: ci }
    targets:
      - repo: org/service
        directories:
          - src: ci-docs
            dest: docs
"#,
        )
        .unwrap();
        let contributions = config.target_mappings("org/service");
        let plan =
            resolve_conflicts("org/service", &contributions, &config.conflict_policy()).unwrap();
        assert_eq!(plan.directories.len(), 1);
        assert_eq!(plan.directories["docs"].mapping.src, "ci-docs");
    }
}
