// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mutation guard: counts open editing surfaces and vetoes cache refreshes
//! while any of them is open.
//!
//! A counter rather than a flag, so several nested or simultaneous editors
//! compose. Prefer [`MutationGuard::session`], which releases on every exit
//! path including early returns and errors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Process-wide count of open "unsafe to refresh" sessions for one board.
#[derive(Debug, Clone, Default)]
pub struct MutationGuard {
    open: Arc<AtomicUsize>,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one more editing surface as open.
    pub fn enter(&self) {
        self.open.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks one editing surface as closed.
    ///
    /// An unmatched exit is a caller bug; the counter stays at zero.
    pub fn exit(&self) {
        let released = self
            .open
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if released.is_err() {
            warn!("mutation guard exit without matching enter, clamping at zero");
        }
    }

    /// True while at least one session is open.
    pub fn is_blocked(&self) -> bool {
        self.open_sessions() > 0
    }

    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Opens a session that is released when the returned value is dropped.
    pub fn session(&self) -> GuardSession {
        self.enter();
        GuardSession {
            guard: self.clone(),
        }
    }
}

/// An open editing session. Dropping it calls [`MutationGuard::exit`].
#[derive(Debug)]
#[must_use = "the session closes as soon as it is dropped"]
pub struct GuardSession {
    guard: MutationGuard,
}

impl Drop for GuardSession {
    fn drop(&mut self) {
        self.guard.exit();
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
