//! Group dependency graph validation.
//!
//! Builds an adjacency mapping from each group's `depends_on` list and
//! certifies that the relation is well-formed: every referenced ID exists,
//! no group depends on itself, and the graph is acyclic. Cycle detection is
//! a depth-first traversal with three-state coloring, linear in groups plus
//! edges.
//!
//! This module only certifies acyclicity. It computes no execution order;
//! the sync executor derives any valid topological ordering independently
//! from the same edges.

use crate::config::Group;
use crate::error::{Error, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Finished,
}

/// Validate the dependency relation across all groups.
///
/// Also enforces group-ID uniqueness, which the adjacency index requires.
pub fn check_dependencies(groups: &[Group]) -> Result<()> {
    let mut index: HashMap<&str, &Group> = HashMap::with_capacity(groups.len());
    for group in groups {
        if index.insert(group.id.as_str(), group).is_some() {
            return Err(Error::DuplicateGroupId {
                id: group.id.clone(),
            });
        }
    }

    for group in groups {
        for dependency in &group.depends_on {
            if dependency == &group.id {
                return Err(Error::SelfDependency {
                    group: group.id.clone(),
                });
            }
            if !index.contains_key(dependency.as_str()) {
                return Err(Error::UnknownDependency {
                    group: group.id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    let mut marks: HashMap<&str, Mark> = groups
        .iter()
        .map(|g| (g.id.as_str(), Mark::Unvisited))
        .collect();
    for group in groups {
        if marks[group.id.as_str()] == Mark::Unvisited {
            visit(group.id.as_str(), &index, &mut marks)?;
        }
    }

    Ok(())
}

/// Depth-first traversal with an explicit work stack of (node, next-edge)
/// frames. A dependency chain can be arbitrarily deep; recursing per edge
/// would risk overflowing the call stack.
fn visit<'a>(
    start: &'a str,
    index: &HashMap<&'a str, &'a Group>,
    marks: &mut HashMap<&'a str, Mark>,
) -> Result<()> {
    let mut stack: Vec<(&'a str, usize)> = Vec::new();
    marks.insert(start, Mark::OnStack);
    stack.push((start, 0));

    while let Some(frame) = stack.last_mut() {
        let (id, cursor) = *frame;
        let dependencies = &index[id].depends_on;

        if cursor == dependencies.len() {
            marks.insert(id, Mark::Finished);
            stack.pop();
            continue;
        }
        frame.1 += 1;

        let dependency = dependencies[cursor].as_str();
        match marks[dependency] {
            Mark::OnStack => {
                // Re-encountering a node still on the stack closes a cycle;
                // report the group that discovered it.
                return Err(Error::CircularDependency {
                    group: id.to_string(),
                });
            }
            Mark::Unvisited => {
                marks.insert(dependency, Mark::OnStack);
                stack.push((dependency, 0));
            }
            Mark::Finished => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, depends_on: &[&str]) -> Group {
        Group {
            id: id.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            ..Group::default()
        }
    }

    #[test]
    fn test_valid_dependency_chain() {
        let groups = vec![group("a", &[]), group("b", &["a"]), group("c", &["a", "b"])];
        assert!(check_dependencies(&groups).is_ok());
    }

    #[test]
    fn test_empty_and_independent_groups() {
        assert!(check_dependencies(&[]).is_ok());
        let groups = vec![group("a", &[]), group("b", &[])];
        assert!(check_dependencies(&groups).is_ok());
    }

    #[test]
    fn test_self_dependency() {
        let groups = vec![group("x", &["x"])];
        let err = check_dependencies(&groups).unwrap_err();
        assert!(matches!(err, Error::SelfDependency { ref group } if group == "x"));
    }

    #[test]
    fn test_unknown_dependency_names_both_groups() {
        let groups = vec![group("y", &["nonexistent"])];
        let err = check_dependencies(&groups).unwrap_err();
        match &err {
            Error::UnknownDependency { group, dependency } => {
                assert_eq!(group, "y");
                assert_eq!(dependency, "nonexistent");
            }
            other => panic!("expected UnknownDependency, got {:?}", other),
        }
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_two_node_cycle() {
        let groups = vec![group("a", &["b"]), group("b", &["a"])];
        let err = check_dependencies(&groups).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
    }

    #[test]
    fn test_longer_cycle_behind_valid_prefix() {
        let groups = vec![
            group("root", &[]),
            group("a", &["root", "b"]),
            group("b", &["c"]),
            group("c", &["a"]),
        ];
        let err = check_dependencies(&groups).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let groups = vec![
            group("base", &[]),
            group("left", &["base"]),
            group("right", &["base"]),
            group("top", &["left", "right"]),
        ];
        assert!(check_dependencies(&groups).is_ok());
    }

    #[test]
    fn test_deep_dependency_chain() {
        // Far deeper than any call stack would tolerate per-edge recursion.
        let mut groups: Vec<Group> = vec![group("g0", &[])];
        for i in 1..100_000 {
            let previous = format!("g{}", i - 1);
            groups.push(group(&format!("g{}", i), &[previous.as_str()]));
        }
        assert!(check_dependencies(&groups).is_ok());

        // Closing the chain into one long cycle is still detected.
        groups[0].depends_on = vec!["g99999".to_string()];
        let err = check_dependencies(&groups).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
    }

    #[test]
    fn test_duplicate_group_id() {
        let groups = vec![group("a", &[]), group("a", &[])];
        let err = check_dependencies(&groups).unwrap_err();
        assert!(matches!(err, Error::DuplicateGroupId { ref id } if id == "a"));
    }
}
