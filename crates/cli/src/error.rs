// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use tb_core::CardId;

/// All possible errors that can occur in the tboard library.
///
/// Messages are shown to the user verbatim, so the underlying cause is kept.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport or authentication failure talking to the card store.
    #[error("store error: {0}")]
    Store(String),

    /// The store rejected a malformed mutation.
    #[error("invalid card: {0}")]
    Validation(String),

    /// The card id no longer exists in the store.
    #[error("card not found: {0}\n  hint: it may have been deleted by someone else")]
    NotFound(CardId),

    /// The first load of a board failed.
    #[error("initial sync failed: {0}")]
    Sync(String),

    /// The image store could not keep an upload.
    #[error("image upload failed: {0}")]
    Upload(String),

    /// The issue tracker proxy answered with a failure.
    #[error("issue tracker error ({status}): {body}")]
    Remote { status: u16, body: String },

    /// The issue tracker proxy could not be reached.
    #[error("issue tracker unreachable: {0}\n  hint: is the tracker proxy running?")]
    TrackerUnreachable(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(tb_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tb_core::Error> for Error {
    fn from(err: tb_core::Error) -> Self {
        match err {
            tb_core::Error::CardNotFound(id) => Error::NotFound(id),
            tb_core::Error::Validation(msg) => Error::Validation(msg),
            other => Error::Core(other),
        }
    }
}

/// A specialized Result type for tboard operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
