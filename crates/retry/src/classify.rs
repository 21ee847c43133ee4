// SPDX-License-Identifier: MIT

//! Classification of retryable vs. non-retryable errors by message pattern
//! (spec §4.2).

const RETRYABLE_PATTERNS: &[&str] = &[
    "rate limit",
    "timeout",
    "connection reset",
    "socket hang up",
    "http 429",
    "http 503",
    "network",
    "service unavailable",
];

/// Whether `error` matches one of the known transient-failure patterns.
/// Case-insensitive substring match, same as the patterns in spec §4.2.
pub fn is_retryable(error: &str) -> bool {
    let lower = error.to_lowercase();
    RETRYABLE_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
