// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Parent issues as reported by the external issue tracker.

use serde::{Deserialize, Serialize};

/// An issue under test. Cards hang off its `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentIssue {
    pub key: String,
    pub summary: String,
    /// Workflow state in the tracker; opaque to the board.
    pub status: String,
    #[serde(default)]
    pub assignee: Option<String>,
}

/// Keys of the given issues, in tracker order.
pub fn issue_keys(issues: &[ParentIssue]) -> Vec<String> {
    issues.iter().map(|issue| issue.key.clone()).collect()
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
