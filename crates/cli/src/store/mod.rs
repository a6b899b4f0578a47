// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote card store access.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SyncEngine  │────►│ RemoteStore │────►│  tb-remote  │
//! │             │◄────│   (trait)   │◄────│   server    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                   │
//!        └── ChangeEvent ────┘  (subscription channel)
//! ```
//!
//! The trait is object-safe and returns boxed futures so engines can be
//! tested against an in-memory store.

mod websocket;

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use tb_core::{Card, CardDraft, CardId, CardPatch, ChangeEvent};

use crate::error::Result;

pub use websocket::WebSocketStore;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Contract of the authoritative card store.
pub trait RemoteStore: Send + Sync + 'static {
    /// Cards for any of `parent_keys`, oldest first.
    ///
    /// Fails with [`Error::Store`](crate::Error::Store) on transport or
    /// auth failure.
    fn list<'a>(&'a self, parent_keys: &'a [String]) -> StoreFuture<'a, Vec<Card>>;

    /// Files a new card; the store assigns id and timestamps.
    fn create(&self, draft: CardDraft) -> StoreFuture<'_, Card>;

    /// Applies a partial update; `NotFound` for stale ids.
    fn update(&self, id: CardId, patch: CardPatch) -> StoreFuture<'_, Card>;

    /// Removes a card permanently; `NotFound` for stale ids.
    fn delete(&self, id: CardId) -> StoreFuture<'_, ()>;

    /// Opens a change feed for `scope`.
    ///
    /// Delivery is at-least-once and unordered relative to concurrent
    /// mutations, and stops silently on connection loss (the channel closes).
    /// Dropping the receiver ends the subscription.
    fn subscribe<'a>(&'a self, scope: &'a str) -> StoreFuture<'a, mpsc::Receiver<ChangeEvent>>;
}
