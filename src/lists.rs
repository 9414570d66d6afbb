//! # List Registry and Resolver
//!
//! Reusable named file/directory lists are referenced by ID from targets
//! and expanded into concrete per-destination mappings before validation.
//! Validators only ever operate on fully expanded mappings.
//!
//! ## Override Order
//!
//! Resolution is destination-keyed with a deterministic override order:
//! referenced lists apply in declaration order, each subsequent list's
//! entries overwriting prior entries that share a destination; the target's
//! own inline entries are overlaid last and always win. The resulting
//! collection contains exactly one entry per destination; order within the
//! collection is unspecified, only per-destination content is guaranteed.
//!
//! Entries copied out of a list are independent deep clones (including the
//! nested module settings and the exclude/include-only collections): one
//! list may be referenced by many targets and must not be aliased into any
//! target's mutable working copy. Resolution is idempotent.

use crate::config::{Config, DirectoryList, FileList};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Expand every target's list references into concrete mappings, in place.
///
/// Fails with [`Error::DuplicateListId`] if two lists of the same kind
/// share an ID, and [`Error::ListReferenceNotFound`] if a target references
/// an ID with no matching list.
pub fn resolve_lists(config: &mut Config) -> Result<()> {
    let file_index = index_file_lists(&config.file_lists)?;
    let directory_index = index_directory_lists(&config.directory_lists)?;

    for (group_index, group) in config.groups.iter_mut().enumerate() {
        let group_label = label(group_index, "group", &group.id);

        for (target_index, target) in group.targets.iter_mut().enumerate() {
            let target_label = label(target_index, "target", &target.repo);

            if !target.file_list_refs.is_empty() {
                let mut merged = BTreeMap::new();
                for reference in &target.file_list_refs {
                    let list = file_index.get(reference.as_str()).ok_or_else(|| {
                        Error::ListReferenceNotFound {
                            group: group_label.clone(),
                            target: target_label.clone(),
                            reference: reference.clone(),
                            kind: "file_list".to_string(),
                        }
                    })?;
                    for mapping in &list.files {
                        merged.insert(mapping.dest.clone(), mapping.clone());
                    }
                }
                // Inline entries always win, regardless of ref order.
                for mapping in target.files.drain(..) {
                    merged.insert(mapping.dest.clone(), mapping);
                }
                target.files = merged.into_values().collect();
            }

            if !target.directory_list_refs.is_empty() {
                let mut merged = BTreeMap::new();
                for reference in &target.directory_list_refs {
                    let list = directory_index.get(reference.as_str()).ok_or_else(|| {
                        Error::ListReferenceNotFound {
                            group: group_label.clone(),
                            target: target_label.clone(),
                            reference: reference.clone(),
                            kind: "directory_list".to_string(),
                        }
                    })?;
                    for mapping in &list.directories {
                        // Deep clone: the shared list definition must not be
                        // mutated by downstream default cascading.
                        merged.insert(mapping.dest.clone(), mapping.clone());
                    }
                }
                for mapping in target.directories.drain(..) {
                    merged.insert(mapping.dest.clone(), mapping);
                }
                target.directories = merged.into_values().collect();
            }
        }
    }

    Ok(())
}

/// File and directory lists share one ID namespace per kind, checked
/// independently.
fn index_file_lists(lists: &[FileList]) -> Result<BTreeMap<&str, &FileList>> {
    let mut index = BTreeMap::new();
    for list in lists {
        if index.insert(list.id.as_str(), list).is_some() {
            return Err(Error::DuplicateListId {
                kind: "file_list".to_string(),
                id: list.id.clone(),
            });
        }
    }
    Ok(index)
}

fn index_directory_lists(lists: &[DirectoryList]) -> Result<BTreeMap<&str, &DirectoryList>> {
    let mut index = BTreeMap::new();
    for list in lists {
        if index.insert(list.id.as_str(), list).is_some() {
            return Err(Error::DuplicateListId {
                kind: "directory_list".to_string(),
                id: list.id.clone(),
            });
        }
    }
    Ok(index)
}

fn label(index: usize, kind: &str, id: &str) -> String {
    if id.is_empty() {
        format!("{} {}", kind, index)
    } else {
        format!("{} {} ({})", kind, index, id)
    }
}
