//! Property-based tests for path safety validation.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{check_path, normalize};
    use proptest::prelude::*;

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(input in "[a-zA-Z0-9_./]{0,40}") {
            let once = normalize(&input);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: normalized output never contains empty or `.` segments
        #[test]
        fn normalize_removes_dot_and_empty_segments(input in "[a-zA-Z0-9_./]{0,40}") {
            let result = normalize(&input);
            if !result.is_empty() {
                for segment in result.split('/') {
                    prop_assert_ne!(segment, "");
                    prop_assert_ne!(segment, ".");
                }
            }
        }

        /// Property: `..` segments only survive at the front of the output
        #[test]
        fn normalize_keeps_parent_segments_only_leading(input in "[a-zA-Z0-9_./]{0,40}") {
            let result = normalize(&input);
            let segments: Vec<&str> = result.split('/').collect();
            let first_normal = segments.iter().position(|s| *s != "..");
            if let Some(pos) = first_normal {
                for segment in &segments[pos..] {
                    prop_assert_ne!(*segment, "..");
                }
            }
        }

        /// Property: a path without any `..` segment never changes meaning
        /// (same segments survive, minus `.` and empty ones)
        #[test]
        fn normalize_preserves_plain_segments(input in "[a-zA-Z0-9_]{1,10}(/[a-zA-Z0-9_]{1,10}){0,5}") {
            let result = normalize(&input);
            prop_assert_eq!(result, input);
        }
    }

    // ============================================================================
    // check_path property tests
    // ============================================================================

    proptest! {
        /// Property: plain relative paths always pass
        #[test]
        fn check_path_accepts_plain_relative(input in "[a-zA-Z0-9_]{1,10}(/[a-zA-Z0-9_.]{1,10}){0,5}") {
            prop_assert!(check_path(&input, "proptest").is_ok());
        }

        /// Property: any path starting with `/` is rejected
        #[test]
        fn check_path_rejects_leading_slash(input in "/[a-zA-Z0-9_./]{0,20}") {
            prop_assert!(check_path(&input, "proptest").is_err());
        }

        /// Property: prefixing enough `..` segments to outnumber the real
        /// segments always produces a rejection
        #[test]
        fn check_path_rejects_escaping_prefix(
            depth in 1usize..4,
            tail in "[a-zA-Z0-9_]{1,10}",
        ) {
            let prefix = "../".repeat(depth + 1);
            let path = format!("{}{}", prefix, tail);
            prop_assert!(check_path(&path, "proptest").is_err());
        }

        /// Property: check_path is deterministic
        #[test]
        fn check_path_is_deterministic(input in ".{0,40}") {
            let first = check_path(&input, "proptest").is_ok();
            let second = check_path(&input, "proptest").is_ok();
            prop_assert_eq!(first, second);
        }

        /// Property: acceptance depends only on the normalized form; a
        /// path whose normalization has no leading `..` and no absolute
        /// prefix is accepted
        #[test]
        fn check_path_matches_normalized_form(input in "([a-zA-Z0-9_.][a-zA-Z0-9_./]{0,39})?") {
            let normalized = normalize(&input);
            let escapes = normalized == ".." || normalized.starts_with("../");
            prop_assert_eq!(check_path(&input, "proptest").is_err(), escapes);
        }
    }
}
