#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Free-text search tokenization for location names.
//!
//! A query is uppercased and split on runs of non-word characters; the
//! literal token `AND` is dropped. A candidate matches when every token is a
//! substring of its uppercased name, in any order. The same tokens drive the
//! `LIKE '%TOKEN%'` predicates used for name search against the store.

use std::sync::LazyLock;

use crash_map_database_models::LocationRow;
use regex::Regex;

/// Runs of characters outside `[A-Za-z0-9_]`.
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid regex"));

/// Token ignored as a conjunction.
const STOPWORD: &str = "AND";

/// Splits a query into ordered uppercase tokens.
///
/// Empty tokens and the literal `AND` are discarded, so `"State AND Madison"`
/// and `"State Madison"` tokenize identically.
#[must_use]
pub fn tokenize(query: &str) -> Vec<String> {
    let upper = query.to_uppercase();
    NON_WORD_RE
        .split(&upper)
        .filter(|token| !token.is_empty() && *token != STOPWORD)
        .map(str::to_string)
        .collect()
}

/// Returns `true` if every token is a substring of the uppercased candidate.
///
/// Matching is containment, not whole-word: `"STATE"` matches `"STATEN"`.
/// An empty token list matches everything.
#[must_use]
pub fn matches_all_tokens(candidate: &str, tokens: &[String]) -> bool {
    let upper = candidate.to_uppercase();
    tokens.iter().all(|token| upper.contains(token.as_str()))
}

/// Wraps each token as a `%TOKEN%` substring pattern for `LIKE`.
#[must_use]
pub fn like_patterns(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|token| format!("%{token}%")).collect()
}

/// Filters locations whose name matches every token of `query`.
///
/// Keeps input order and stops after `limit` matches. A blank query, or one
/// that tokenizes to nothing, matches nothing.
#[must_use]
pub fn filter_locations<'a>(
    locations: &'a [LocationRow],
    query: &str,
    limit: usize,
) -> Vec<&'a LocationRow> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    locations
        .iter()
        .filter(|location| matches_all_tokens(&location.name, &tokens))
        .take(limit)
        .collect()
}
