// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Profile Resolution
//!
//! Turns the raw `--profile` argument into the ordered work list of
//! credential sections to rotate.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure parsing, no disk or network access

use std::collections::HashSet;

/// Profile used when none is given on the command line
pub const DEFAULT_PROFILE: &str = "default";

/// Separator between profile names in the raw argument
pub const PROFILE_SEPARATOR: char = ',';

/// Resolve a comma-separated profile list.
///
/// Leading and trailing separators are trimmed, then the remainder is split
/// on the separator. Input order is preserved and duplicates are kept, so
/// `"a,b,"` yields `["a", "b"]` and `""` yields `[""]`.
pub fn resolve_profiles(raw: &str) -> Vec<String> {
    raw.trim_matches(PROFILE_SEPARATOR)
        .split(PROFILE_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// Profile names that appear more than once, in order of first repetition
pub fn duplicate_profiles(profiles: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for profile in profiles {
        if !seen.insert(profile.as_str()) && reported.insert(profile.as_str()) {
            duplicates.push(profile.as_str());
        }
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_default_profile() {
        assert_eq!(resolve_profiles(DEFAULT_PROFILE), vec!["default"]);
    }

    #[test]
    fn test_preserves_order_and_count() {
        assert_eq!(resolve_profiles("prod,dev,staging"), vec!["prod", "dev", "staging"]);
    }

    #[test]
    fn test_trailing_separator_trimmed() {
        assert_eq!(resolve_profiles("a,b,"), vec!["a", "b"]);
    }

    #[test]
    fn test_boundary_separators_trimmed_inner_kept() {
        assert_eq!(resolve_profiles(",,a,,b,,"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_empty_input_yields_single_empty_identifier() {
        assert_eq!(resolve_profiles(""), vec![""]);
        assert_eq!(resolve_profiles(",,,"), vec![""]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        assert_eq!(resolve_profiles("a,b,a"), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_whitespace_is_not_trimmed() {
        assert_eq!(resolve_profiles(" a, b"), vec![" a", " b"]);
    }

    #[test]
    fn test_duplicate_profiles_reported_once() {
        let profiles = resolve_profiles("a,b,a,a,b,c");
        assert_eq!(duplicate_profiles(&profiles), vec!["a", "b"]);
        assert!(duplicate_profiles(&resolve_profiles("x,y")).is_empty());
    }
}
