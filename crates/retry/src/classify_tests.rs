// SPDX-License-Identifier: MIT

use super::*;

#[yare::parameterized(
    rate_limit = { "Rate limit exceeded" },
    timeout = { "request timeout" },
    connection_reset = { "Connection reset by peer" },
    socket_hang_up = { "socket hang up" },
    http_429 = { "HTTP 429 Too Many Requests" },
    http_503 = { "HTTP 503 Service Unavailable" },
    network = { "network error" },
    service_unavailable = { "Service Unavailable" },
)]
fn retryable_patterns_are_recognized(message: &str) {
    assert!(is_retryable(message));
}

#[yare::parameterized(
    invalid_input = { "invalid input: missing field" },
    auth_failure = { "authentication failed" },
)]
fn non_retryable_errors_are_not_recognized(message: &str) {
    assert!(!is_retryable(message));
}
