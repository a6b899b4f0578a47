// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the card database for shared access and fans out a change event
//! after every successful mutation.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::info;

use tb_core::protocol::CARDS_TABLE;
use tb_core::{Card, CardDb, CardDraft, CardId, CardPatch, ChangeEvent, Operation, Result};

/// File name of the card database inside the data directory.
pub const DB_FILE_NAME: &str = "cards.db";

/// Shared server state containing the card database.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    db: Mutex<CardDb>,
    /// Change notifications for subscribed connections.
    changes: broadcast::Sender<ChangeEvent>,
}

impl ServerState {
    /// Opens (or creates) the card database in `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        Ok(Self::with_db(CardDb::open(&data_dir.join(DB_FILE_NAME))?))
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Ok(Self::with_db(CardDb::open_in_memory()?))
    }

    fn with_db(db: CardDb) -> Self {
        let (changes, _) = broadcast::channel(1024);
        ServerState {
            inner: Arc::new(ServerStateInner {
                db: Mutex::new(db),
                changes,
            }),
        }
    }

    pub async fn list(&self, parent_keys: &[String]) -> Result<Vec<Card>> {
        self.inner.db.lock().await.list(parent_keys)
    }

    pub async fn create(&self, draft: CardDraft) -> Result<Card> {
        let card = self.inner.db.lock().await.create(draft)?;
        info!(id = %card.id, issue = %card.parent_key, "card created");
        self.notify(Operation::Insert);
        Ok(card)
    }

    pub async fn update(&self, id: CardId, patch: CardPatch) -> Result<Card> {
        let card = self.inner.db.lock().await.update(id, &patch)?;
        info!(%id, status = %card.status, "card updated");
        self.notify(Operation::Update);
        Ok(card)
    }

    pub async fn delete(&self, id: CardId) -> Result<()> {
        self.inner.db.lock().await.delete(id)?;
        info!(%id, "card deleted");
        self.notify(Operation::Delete);
        Ok(())
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.changes.subscribe()
    }

    fn notify(&self, operation: Operation) {
        // No receivers just means nobody is subscribed.
        let _ = self
            .inner
            .changes
            .send(ChangeEvent::new(operation, CARDS_TABLE));
    }
}
