// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tb-core operations.

use thiserror::Error;

use crate::card::CardId;

/// All possible errors that can occur in tb-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("card not found: {0}")]
    CardNotFound(CardId),

    #[error("invalid card: {0}")]
    Validation(String),

    #[error("invalid card kind: '{0}'\n  hint: valid kinds are: error, question, proposal, ux")]
    InvalidKind(String),

    #[error(
        "invalid status: '{0}'\n  hint: valid statuses are: pending, open_error, closed, discarded"
    )]
    InvalidStatus(String),

    #[error("invalid card id: '{0}'\n  hint: card ids are integers assigned by the store")]
    InvalidCardId(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for tb-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
