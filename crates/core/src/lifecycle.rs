// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Card lifecycle: status transitions, edit-form submission, drag-and-drop
//! resolution and per-issue summaries.
//!
//! Every status is reachable from every other one, so a transition is a
//! validated replace rather than a walk over an edge table.

use serde::{Deserialize, Serialize};

use crate::card::{Card, CardId, CardKind, CardPatch, CardStatus};

impl CardStatus {
    /// Moves to `target`. Total: testers may reclassify a finding at any time.
    pub fn transition_to(self, target: CardStatus) -> CardStatus {
        target
    }
}

impl Card {
    /// The developer reply, surfaced only while the card is an open error.
    ///
    /// The stored value survives other statuses so it reappears if the card
    /// is reopened.
    pub fn visible_reply(&self) -> Option<&str> {
        match self.status {
            CardStatus::OpenError => self.developer_reply.as_deref(),
            _ => None,
        }
    }
}

/// Values submitted from the card edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditForm {
    #[serde(rename = "ref")]
    pub reference: String,
    pub kind: CardKind,
    pub summary: String,
    /// Empty means no detail.
    #[serde(default)]
    pub detail: String,
    pub status: CardStatus,
}

impl EditForm {
    /// Pre-fills the form from an existing card.
    pub fn from_card(card: &Card) -> Self {
        EditForm {
            reference: card.reference.clone(),
            kind: card.kind,
            summary: card.summary.clone(),
            detail: card.detail.clone().unwrap_or_default(),
            status: card.status,
        }
    }

    /// Wholesale replacement of the form fields. Tester, reply and images
    /// are not part of the form and stay as they are.
    pub fn into_patch(self) -> CardPatch {
        let detail = if self.detail.trim().is_empty() {
            None
        } else {
            Some(self.detail)
        };
        CardPatch {
            reference: Some(self.reference),
            kind: Some(self.kind),
            summary: Some(self.summary),
            detail: Some(detail),
            status: Some(self.status),
            ..CardPatch::default()
        }
    }
}

/// Resolves a drag payload to the dragged card's id.
///
/// Returns `None` for an empty or malformed payload; such drops are no-ops.
pub fn resolve_drop(payload: &str) -> Option<CardId> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }
    payload.parse().ok()
}

/// Counts shown in an issue header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueStats {
    pub total: usize,
    /// Closed plus discarded.
    pub resolved: usize,
    pub open_errors: usize,
    pub pending: usize,
}

impl IssueStats {
    pub fn from_cards(cards: &[Card]) -> Self {
        cards.iter().fold(IssueStats::default(), |mut stats, card| {
            stats.total += 1;
            match card.status {
                CardStatus::OpenError => stats.open_errors += 1,
                CardStatus::Pending => stats.pending += 1,
                CardStatus::Closed | CardStatus::Discarded => stats.resolved += 1,
            }
            stats
        })
    }
}

/// Number of cards reading as resolved (closed or discarded).
pub fn closed_count(cards: &[Card]) -> usize {
    cards.iter().filter(|card| card.status.is_resolved()).count()
}

/// Cards of one column, optionally narrowed to a single tester, in cache order.
pub fn filter_column<'a>(
    cards: &'a [Card],
    status: CardStatus,
    tester: Option<&str>,
) -> Vec<&'a Card> {
    cards
        .iter()
        .filter(|card| card.status == status)
        .filter(|card| match tester {
            Some(name) => card.tester.as_deref() == Some(name),
            None => true,
        })
        .collect()
}

/// A value the user explicitly confirmed. Destructive operations take one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed<T>(T);

impl<T> Confirmed<T> {
    /// Asks `confirm` about `value`; `None` when the user declines.
    pub fn ask<F>(value: T, confirm: F) -> Option<Self>
    where
        F: FnOnce(&T) -> bool,
    {
        if confirm(&value) {
            Some(Confirmed(value))
        } else {
            None
        }
    }

    /// For callers that obtained confirmation up front (e.g. `--yes`).
    pub fn given(value: T) -> Self {
        Confirmed(value)
    }

    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
