// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("failed to open journal store at {path}: {source}")]
    Open { path: String, #[source] source: rusqlite::Error },
    #[error("journal query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("journal writer has already shut down")]
    Closed,
    #[error("payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}
