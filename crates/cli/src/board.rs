// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Board composition: one view over the issues under test and their cards.
//!
//! A [`BoardContext`] carries the per-board singletons (mutation guard and
//! card cache). It is created once per view and handed to the engine, so
//! nothing about a board lives in process-global state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tb_core::issue::issue_keys;
use tb_core::{Card, CardId, CardPatch, IssueStats, ParentIssue};

use crate::cache::{CardCache, Snapshot};
use crate::engine::{SyncConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::guard::{GuardSession, MutationGuard};
use crate::images::ImageStore;
use crate::store::{RemoteStore, WebSocketStore};
use crate::tracker::{export_to_tracker, IssueTracker};

/// Shared state of one board view.
#[derive(Debug, Clone, Default)]
pub struct BoardContext {
    pub guard: MutationGuard,
    pub cache: CardCache,
}

impl BoardContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Timing of a board's background work.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Period of the issue list poll.
    pub issue_poll_interval: Duration,
    pub sync: SyncConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            issue_poll_interval: Duration::from_secs(30),
            sync: SyncConfig::default(),
        }
    }
}

pub struct Board<S: RemoteStore = WebSocketStore> {
    context: BoardContext,
    engine: Arc<SyncEngine<S>>,
    tracker: Arc<dyn IssueTracker>,
    images: Arc<dyn ImageStore>,
    issues: Arc<watch::Sender<Vec<ParentIssue>>>,
    issue_poll_interval: Duration,
    issue_poll: Option<JoinHandle<()>>,
}

impl<S: RemoteStore> Board<S> {
    pub fn new(
        store: Arc<S>,
        tracker: Arc<dyn IssueTracker>,
        images: Arc<dyn ImageStore>,
        config: BoardConfig,
    ) -> Self {
        let context = BoardContext::new();
        let engine = Arc::new(SyncEngine::new(store, &context, config.sync));
        let (issues, _) = watch::channel(Vec::new());
        Board {
            context,
            engine,
            tracker,
            images,
            issues: Arc::new(issues),
            issue_poll_interval: config.issue_poll_interval,
            issue_poll: None,
        }
    }

    /// Starts polling the issue list; the first poll runs immediately.
    ///
    /// Every change of the issue key set retargets the engine.
    pub fn start(&mut self) {
        if self.issue_poll.is_some() {
            return;
        }
        self.issue_poll = Some(tokio::spawn(issue_loop(
            Arc::clone(&self.engine),
            Arc::clone(&self.tracker),
            Arc::clone(&self.issues),
            self.issue_poll_interval,
        )));
    }

    /// Stops every background task and empties the cache.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.issue_poll.take() {
            handle.abort();
        }
        self.engine.untrack().await;
    }

    /// Loads the issue list once and tracks its keys.
    ///
    /// One-shot callers use this instead of [`Board::start`] so that a
    /// tracker failure is returned rather than logged.
    pub async fn load_issues(&self) -> Result<Vec<ParentIssue>> {
        poll_issues(&self.engine, self.tracker.as_ref(), &self.issues).await
    }

    pub fn context(&self) -> &BoardContext {
        &self.context
    }

    pub fn engine(&self) -> &SyncEngine<S> {
        &self.engine
    }

    /// Issues under test, as of the last successful issue poll.
    pub fn issues(&self) -> watch::Receiver<Vec<ParentIssue>> {
        self.issues.subscribe()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.engine.snapshot()
    }

    /// Opens an editing session; background refreshes are held off until
    /// the session is dropped.
    pub fn editor(&self) -> GuardSession {
        self.context.guard.session()
    }

    pub fn stats(&self, issue_key: &str) -> IssueStats {
        IssueStats::from_cards(self.snapshot().cards_for(issue_key))
    }

    /// Posts the test report for one issue to the tracker.
    pub async fn export(&self, issue_key: &str) -> Result<String> {
        let snapshot = self.snapshot();
        export_to_tracker(self.tracker.as_ref(), issue_key, snapshot.cards_for(issue_key)).await
    }

    fn cached_card(&self, id: CardId) -> Result<Card> {
        self.snapshot().card(id).cloned().ok_or(Error::NotFound(id))
    }

    /// Uploads an image and appends its URL to the card.
    ///
    /// If the card update fails the upload is removed again.
    pub async fn attach_image(&self, id: CardId, blob: Vec<u8>, extension: &str) -> Result<Card> {
        let card = self.cached_card(id)?;
        let url = self.images.store(blob, extension).await?;

        match self.engine.update(id, CardPatch::images(card.images_with(&url))).await {
            Ok(card) => {
                info!(%id, %url, "image attached");
                Ok(card)
            }
            Err(e) => {
                remove_best_effort(self.images.as_ref(), &url).await;
                Err(e)
            }
        }
    }

    /// Drops an image URL from the card, then deletes the image.
    ///
    /// Deleting the image is best-effort; a failure is only logged.
    pub async fn detach_image(&self, id: CardId, url: &str) -> Result<Card> {
        let card = self.cached_card(id)?;
        let updated = self
            .engine
            .update(id, CardPatch::images(card.images_without(url)))
            .await?;
        remove_best_effort(self.images.as_ref(), url).await;
        info!(%id, url, "image detached");
        Ok(updated)
    }
}

impl<S: RemoteStore> Drop for Board<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.issue_poll.take() {
            handle.abort();
        }
    }
}

async fn remove_best_effort(images: &dyn ImageStore, url: &str) {
    if let Err(e) = images.remove(url).await {
        warn!(error = %e, url, "could not delete image");
    }
}

async fn poll_issues<S: RemoteStore>(
    engine: &SyncEngine<S>,
    tracker: &dyn IssueTracker,
    issues: &watch::Sender<Vec<ParentIssue>>,
) -> Result<Vec<ParentIssue>> {
    let list = tracker.list_issues().await?;
    let keys = issue_keys(&list);
    debug!(count = list.len(), "issue list polled");
    issues.send_replace(list.clone());
    engine.track(keys).await;
    Ok(list)
}

async fn issue_loop<S: RemoteStore>(
    engine: Arc<SyncEngine<S>>,
    tracker: Arc<dyn IssueTracker>,
    issues: Arc<watch::Sender<Vec<ParentIssue>>>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = poll_issues(&engine, tracker.as_ref(), &issues).await {
            warn!(error = %e, "cannot load issues, keeping the current board");
        }
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
