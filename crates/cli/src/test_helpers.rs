// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory collaborators for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use tokio::sync::{mpsc, Notify};

use tb_core::{
    Card, CardDraft, CardId, CardKind, CardPatch, CardStatus, ChangeEvent, ParentIssue,
};

use crate::error::{Error, Result};
use crate::images::ImageStore;
use crate::store::{RemoteStore, StoreFuture};
use crate::tracker::IssueTracker;

pub fn make_card(id: i64, parent: &str, status: CardStatus) -> Card {
    let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        + chrono::Duration::seconds(id);
    Card {
        id: CardId::new(id),
        parent_key: parent.to_string(),
        reference: format!("AC{id}"),
        kind: CardKind::Error,
        summary: format!("finding {id}"),
        detail: None,
        status,
        tester: None,
        developer_reply: None,
        images: Vec::new(),
        created_at: created,
        updated_at: created,
    }
}

pub fn make_issue(key: &str) -> ParentIssue {
    ParentIssue {
        key: key.to_string(),
        summary: format!("issue {key}"),
        status: "In Progress".to_string(),
        assignee: None,
    }
}

/// Card store backed by a vector, with call counters and fault switches.
#[derive(Default)]
pub struct MockStore {
    cards: Mutex<Vec<Card>>,
    next_id: AtomicUsize,
    subscribers: Mutex<Vec<mpsc::Sender<ChangeEvent>>>,

    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    /// Parent keys of every list call, in order.
    pub listed: Mutex<Vec<Vec<String>>>,

    pub fail_list: AtomicBool,
    pub fail_subscribe: AtomicBool,

    /// While set, list calls park until `release` is notified.
    pub hold_list: AtomicBool,
    pub release: Notify,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        let next = cards.iter().map(|c| c.id.get()).max().unwrap_or(0);
        let store = Self::default();
        *store.cards.lock().unwrap() = cards;
        store.next_id.store(next as usize, Ordering::SeqCst);
        store
    }

    /// Writes straight into the backing store, bypassing the client path.
    pub fn insert(&self, card: Card) {
        self.cards.lock().unwrap().push(card);
    }

    pub fn stored(&self) -> Vec<Card> {
        self.cards.lock().unwrap().clone()
    }

    /// Delivers `event` to every live subscriber.
    pub fn push(&self, event: ChangeEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        for tx in subscribers.iter() {
            let _ = tx.try_send(event.clone());
        }
    }

    /// Subscriptions whose receiver is still alive.
    pub fn active_subscribers(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Simulates connection loss on every open change feed.
    pub fn drop_subscribers(&self) {
        self.subscribers.lock().unwrap().clear();
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Lets one parked list call finish and stops parking new ones.
    pub fn release_list(&self) {
        self.hold_list.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn hold(&self) {
        self.hold_list.store(true, Ordering::SeqCst);
    }

    pub fn fail(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }
}

impl RemoteStore for MockStore {
    fn list<'a>(&'a self, parent_keys: &'a [String]) -> StoreFuture<'a, Vec<Card>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.listed.lock().unwrap().push(parent_keys.to_vec());
            if self.hold_list.load(Ordering::SeqCst) {
                self.release.notified().await;
            }
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(Error::Store("store unreachable".to_string()));
            }
            let cards = self.cards.lock().unwrap();
            Ok(cards
                .iter()
                .filter(|c| parent_keys.contains(&c.parent_key))
                .cloned()
                .collect())
        })
    }

    fn create(&self, draft: CardDraft) -> StoreFuture<'_, Card> {
        Box::pin(async move {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            draft.validate()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            let card = Card::from_draft(CardId::new(id), draft, Utc::now());
            self.cards.lock().unwrap().push(card.clone());
            Ok(card)
        })
    }

    fn update(&self, id: CardId, patch: CardPatch) -> StoreFuture<'_, Card> {
        Box::pin(async move {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            patch.validate()?;
            let mut cards = self.cards.lock().unwrap();
            let card = cards
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(Error::NotFound(id))?;
            patch.apply(card, Utc::now());
            Ok(card.clone())
        })
    }

    fn delete(&self, id: CardId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            let mut cards = self.cards.lock().unwrap();
            let before = cards.len();
            cards.retain(|c| c.id != id);
            if cards.len() == before {
                return Err(Error::NotFound(id));
            }
            Ok(())
        })
    }

    fn subscribe<'a>(&'a self, _scope: &'a str) -> StoreFuture<'a, mpsc::Receiver<ChangeEvent>> {
        Box::pin(async move {
            self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_subscribe.load(Ordering::SeqCst) {
                return Err(Error::Store("realtime unavailable".to_string()));
            }
            let (tx, rx) = mpsc::channel(16);
            self.subscribers.lock().unwrap().push(tx);
            Ok(rx)
        })
    }
}

/// Issue tracker that records posted comments.
#[derive(Default)]
pub struct MockTracker {
    pub issues: Mutex<Vec<ParentIssue>>,
    pub comments: Mutex<Vec<(String, String)>>,
    pub list_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    /// When set, every comment is rejected with this status and body.
    pub reject_comments: Mutex<Option<(u16, String)>>,
}

impl MockTracker {
    pub fn with_issues(keys: &[&str]) -> Self {
        let tracker = Self::default();
        tracker.set_issues(keys);
        tracker
    }

    pub fn set_issues(&self, keys: &[&str]) {
        *self.issues.lock().unwrap() = keys.iter().map(|k| make_issue(k)).collect();
    }

    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }
}

impl IssueTracker for MockTracker {
    fn list_issues(&self) -> StoreFuture<'_, Vec<ParentIssue>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(Error::Remote {
                    status: 502,
                    body: "tracker down".to_string(),
                });
            }
            Ok(self.issues.lock().unwrap().clone())
        })
    }

    fn post_comment<'a>(&'a self, issue_key: &'a str, text: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if let Some((status, body)) = self.reject_comments.lock().unwrap().clone() {
                return Err(Error::Remote { status, body });
            }
            self.comments
                .lock()
                .unwrap()
                .push((issue_key.to_string(), text.to_string()));
            Ok(())
        })
    }
}

/// Image store that hands out predictable URLs.
#[derive(Default)]
pub struct MockImages {
    pub stored: Mutex<Vec<String>>,
    pub removed: Mutex<Vec<String>>,
    pub fail_store: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl ImageStore for MockImages {
    fn store<'a>(&'a self, blob: Vec<u8>, extension: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move {
            if self.fail_store.load(Ordering::SeqCst) {
                return Err(Error::Upload("bucket full".to_string()));
            }
            let mut stored = self.stored.lock().unwrap();
            let url = format!("mem://{}_{}.{extension}", stored.len() + 1, blob.len());
            stored.push(url.clone());
            Ok(url)
        })
    }

    fn remove<'a>(&'a self, url: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(Error::Upload(format!("cannot remove {url}")));
            }
            self.removed.lock().unwrap().push(url.to_string());
            Ok(())
        })
    }
}
