//! # Sync Configuration Engine
//!
//! This library is the configuration resolution and validation engine for a
//! declarative, multi-repository file-synchronization tool. Users describe
//! one or more source repositories, reusable named file/directory lists,
//! groups that bind a source to target repositories with dependency
//! ordering, and cascading default/global settings. The engine turns that
//! raw declaration into a fully resolved, internally consistent plan,
//! rejecting anything ambiguous, insecure, or structurally invalid before
//! any network or filesystem operation occurs.
//!
//! ## Quick Example
//!
//! ```
//! use sync_config::config::Config;
//!
//! let config = Config::parse(r#"
//! version: 1
//! groups:
//!   - id: ci
//!     source:
//!       repo: org/templates
//!     targets:
//!       - repo: org/service
//!         files:
//!           - src: ci.yml
//!             dest: .github/workflows/ci.yml
//! "#).unwrap();
//!
//! // Loading cascades defaults and resolves list references.
//! assert_eq!(config.groups()[0].source.branch, "main");
//!
//! // Validation is a separate, fail-fast step.
//! config.validate().unwrap();
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: The document schema, strict YAML
//!   loading, legacy flat-form adaptation, and format-transparent access.
//! - **Default Cascading (`defaults`)**: Layered fallback application
//!   (document → group → target/mapping) that never clobbers an explicit
//!   value.
//! - **List Resolution (`lists`)**: Expansion of named list references into
//!   concrete per-destination mappings with a deterministic override order.
//! - **Validation (`validate`, `graph`, `path`)**: Identifier, path-safety,
//!   structural, and dependency-graph checks with positional error
//!   provenance, optional tracing, and cooperative cancellation.
//! - **Conflict Resolution (`conflict`)**: A pure resolver deciding which
//!   source wins each destination under multi-source fan-in.
//!
//! ## Execution Flow
//!
//! 1. **Decode**: strict YAML decode; unknown fields reject the document.
//! 2. **Adapt**: the flat legacy form becomes one synthetic group.
//! 3. **Cascade**: defaults fill genuinely unset fields.
//! 4. **Resolve**: list references expand into concrete mappings.
//! 5. **Validate**: fail-fast semantic checks over the canonical form.
//! 6. **Hand off**: the validated, now-immutable `Config` feeds the sync
//!    executor, which may consult the conflict resolver per target.
//!
//! The engine is single-pass and synchronous, spawns no tasks, and holds no
//! shared mutable state beyond process-wide immutable constants. A `Config`
//! must be owned exclusively during load and validation; once validated it
//! is safe for unrestricted concurrent read-only use.

pub mod config;
pub mod conflict;
pub mod defaults;
pub mod error;
pub mod graph;
pub mod lists;
pub mod path;
pub mod validate;

#[cfg(test)]
mod path_proptest;
