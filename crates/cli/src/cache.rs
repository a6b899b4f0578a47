// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory card cache for one board view.
//!
//! The cache holds an immutable [`Snapshot`] that is swapped wholesale on
//! each successful sync; readers never observe a half-applied update.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use tb_core::{Card, CardId};

/// The set of parent keys a board is tracking. Order-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedKeys(BTreeSet<String>);

impl TrackedKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TrackedKeys(
            keys.into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.trim().is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

/// Cards grouped by parent key, each group in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    by_parent: BTreeMap<String, Vec<Card>>,
}

impl Snapshot {
    /// One empty group per tracked key.
    pub fn empty(keys: &TrackedKeys) -> Self {
        Snapshot {
            by_parent: keys.iter().map(|k| (k.clone(), Vec::new())).collect(),
        }
    }

    /// Groups `cards` under the tracked keys, keeping their order.
    ///
    /// Cards whose parent is not tracked are left out of the snapshot.
    pub fn from_cards(keys: &TrackedKeys, cards: Vec<Card>) -> Self {
        let mut snapshot = Snapshot::empty(keys);
        let mut dropped = 0usize;

        for card in cards {
            match snapshot.by_parent.get_mut(&card.parent_key) {
                Some(group) => group.push(card),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(dropped, "ignored cards for untracked issues");
        }
        snapshot
    }

    /// Cards of one issue; empty for unknown keys.
    pub fn cards_for(&self, key: &str) -> &[Card] {
        self.by_parent.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.by_parent.values().flatten().find(|card| card.id == id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.by_parent.keys()
    }

    /// Total number of cards across all issues.
    pub fn len(&self) -> usize {
        self.by_parent.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handle to the board's current snapshot.
///
/// Clones refer to the same cache; subscribers are woken on every replace.
#[derive(Debug, Clone)]
pub struct CardCache {
    tx: Arc<watch::Sender<Arc<Snapshot>>>,
}

impl Default for CardCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CardCache {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Snapshot::default()));
        CardCache { tx: Arc::new(tx) }
    }

    /// The current snapshot. Cheap: shares the underlying data.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    /// Swaps in a new snapshot.
    pub fn replace(&self, snapshot: Snapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
