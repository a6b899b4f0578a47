// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine: keeps one board's card cache in step with the remote store.
//!
//! Refreshes are triggered by:
//! - the initial mount of a tracked key set (loud)
//! - the poll timer (silent)
//! - change notifications from the store (silent)
//! - explicit callers via [`SyncEngine::refresh`] (loud) or
//!   [`SyncEngine::refresh_silently`]
//!
//! At most one refresh runs at a time; a request that arrives while another
//! is in flight is dropped. The mutation guard is consulted before the fetch
//! and again before the result is committed. A fetch that completes after
//! the tracked key set changed is discarded.
//!
//! The commit-time guard check and the cache replacement run without an
//! await in between. That makes them atomic on a current-thread runtime
//! (see [`crate::runtime`]); on a multi-thread runtime an editor opened on
//! another worker in that window can still see the commit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tb_core::lifecycle::resolve_drop;
use tb_core::protocol::CARDS_TABLE;
use tb_core::{Card, CardDraft, CardId, CardPatch, CardStatus, Confirmed, EditForm};

use crate::board::BoardContext;
use crate::cache::{CardCache, Snapshot, TrackedKeys};
use crate::error::{Error, Result};
use crate::guard::MutationGuard;
use crate::store::{RemoteStore, WebSocketStore};

/// Timing and scope of the engine's background work.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period of the silent poll.
    pub poll_interval: Duration,
    /// Change feed scope to subscribe to.
    pub scope: String,
    /// Wait before re-opening a change feed that failed or closed.
    pub resubscribe_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            poll_interval: Duration::from_secs(5),
            scope: CARDS_TABLE.to_string(),
            resubscribe_delay: Duration::from_secs(30),
        }
    }
}

/// What became of one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The cache was replaced with this many cards.
    Committed { cards: usize },
    /// Another refresh was running; this one was dropped.
    InFlight,
    /// An editor was open before the fetch or when it completed.
    Blocked,
    /// The tracked key set changed while fetching.
    Stale,
    /// No key set is tracked.
    Untracked,
    /// A silent refresh failed; the last snapshot is kept.
    Failed,
}

/// User-visible sync status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    /// A loud refresh is running.
    pub loading: bool,
    /// Message of the last failed loud refresh, cleared on the next success.
    pub last_error: Option<String>,
    pub last_synced: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Loud,
    Silent,
}

#[derive(Debug, Default)]
struct Target {
    generation: u64,
    keys: TrackedKeys,
}

struct Shared<S> {
    store: Arc<S>,
    guard: MutationGuard,
    cache: CardCache,
    state: watch::Sender<SyncState>,
    target: watch::Sender<Target>,
    refreshing: AtomicBool,
    config: SyncConfig,
}

/// Marks a refresh as in flight until dropped, including when the refresh
/// future is cancelled.
struct Flight<'a> {
    refreshing: &'a AtomicBool,
    state: Option<&'a watch::Sender<SyncState>>,
}

impl<'a> Flight<'a> {
    fn acquire(refreshing: &'a AtomicBool) -> Option<Self> {
        refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Flight {
                refreshing,
                state: None,
            })
    }

    fn show_loading(&mut self, state: &'a watch::Sender<SyncState>) {
        state.send_modify(|s| s.loading = true);
        self.state = Some(state);
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state {
            state.send_modify(|s| s.loading = false);
        }
        self.refreshing.store(false, Ordering::SeqCst);
    }
}

impl<S: RemoteStore> Shared<S> {
    async fn sync(&self, mode: Mode) -> Result<Refresh> {
        let (generation, keys) = {
            let target = self.target.borrow();
            (target.generation, target.keys.clone())
        };
        if keys.is_empty() {
            return Ok(Refresh::Untracked);
        }
        if self.guard.is_blocked() {
            debug!(?mode, "editor open, skipping refresh");
            return Ok(Refresh::Blocked);
        }
        let Some(mut flight) = Flight::acquire(&self.refreshing) else {
            debug!(?mode, "refresh already in flight, dropping request");
            return Ok(Refresh::InFlight);
        };
        if mode == Mode::Loud {
            flight.show_loading(&self.state);
        }

        let fetched = self.store.list(&keys.to_vec()).await;

        let cards = match fetched {
            Ok(cards) => cards,
            Err(e) => {
                if mode == Mode::Loud && self.target.borrow().generation == generation {
                    self.state.send_modify(|s| s.last_error = Some(e.to_string()));
                }
                return Err(e);
            }
        };

        if self.guard.is_blocked() {
            debug!(?mode, "editor opened during fetch, discarding result");
            return Ok(Refresh::Blocked);
        }

        // Holding the target borrow keeps `track` from swapping the key set
        // between the generation check and the commit.
        let target = self.target.borrow();
        if target.generation != generation {
            debug!("tracked issues changed during fetch, discarding result");
            return Ok(Refresh::Stale);
        }
        let snapshot = Snapshot::from_cards(&keys, cards);
        let count = snapshot.len();
        self.cache.replace(snapshot);
        drop(target);
        drop(flight);

        self.state.send_modify(|s| {
            s.last_error = None;
            s.last_synced = Some(Utc::now());
        });
        match mode {
            Mode::Loud => info!(cards = count, issues = keys.len(), "board refreshed"),
            Mode::Silent => debug!(cards = count, issues = keys.len(), "board refreshed"),
        }
        Ok(Refresh::Committed { cards: count })
    }

    async fn sync_silently(&self) -> Refresh {
        match self.sync(Mode::Silent).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "background refresh failed, keeping last snapshot");
                Refresh::Failed
            }
        }
    }
}

/// Background tasks of one tracked key set. Dropping aborts both.
struct Tracking {
    poll: JoinHandle<()>,
    push: JoinHandle<()>,
}

impl Tracking {
    fn start<S: RemoteStore>(shared: &Arc<Shared<S>>) -> Self {
        Tracking {
            poll: tokio::spawn(poll_loop(Arc::clone(shared))),
            push: tokio::spawn(push_loop(Arc::clone(shared))),
        }
    }
}

impl Drop for Tracking {
    fn drop(&mut self) {
        self.poll.abort();
        self.push.abort();
    }
}

/// Mount refresh on the first tick, then a silent refresh per period.
async fn poll_loop<S: RemoteStore>(shared: Arc<Shared<S>>) {
    let mut ticker = tokio::time::interval(shared.config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    ticker.tick().await;
    if let Err(e) = shared.sync(Mode::Loud).await {
        warn!(error = %e, "initial board load failed");
    }

    loop {
        ticker.tick().await;
        shared.sync_silently().await;
    }
}

/// One silent refresh of the whole key set per change notification,
/// whatever record or table it names.
async fn push_loop<S: RemoteStore>(shared: Arc<Shared<S>>) {
    let scope = shared.config.scope.clone();
    loop {
        match shared.store.subscribe(&scope).await {
            Ok(mut changes) => {
                debug!(%scope, "listening for card changes");
                while let Some(event) = changes.recv().await {
                    debug!(operation = %event.operation, table = %event.table, "change notification");
                    shared.sync_silently().await;
                }
                warn!(%scope, "change feed closed, relying on polling");
            }
            Err(e) => warn!(error = %e, %scope, "cannot subscribe to changes, relying on polling"),
        }
        tokio::time::sleep(shared.config.resubscribe_delay).await;
    }
}

/// Client-side sync engine for one board view.
///
/// Mutations go straight to the store. Only delete refreshes the cache
/// afterwards; creates and updates come back through the change feed or the
/// next poll.
pub struct SyncEngine<S: RemoteStore = WebSocketStore> {
    shared: Arc<Shared<S>>,
    tracking: Mutex<Option<Tracking>>,
}

impl<S: RemoteStore> SyncEngine<S> {
    /// Creates an idle engine sharing the board's guard and cache.
    pub fn new(store: Arc<S>, context: &BoardContext, config: SyncConfig) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        let (target, _) = watch::channel(Target::default());
        SyncEngine {
            shared: Arc::new(Shared {
                store,
                guard: context.guard.clone(),
                cache: context.cache.clone(),
                state,
                target,
                refreshing: AtomicBool::new(false),
                config,
            }),
            tracking: Mutex::new(None),
        }
    }

    /// Starts tracking `keys`, replacing any previous key set.
    ///
    /// The previous poll timer and change feed are torn down before the new
    /// ones start, and the cache restarts empty. Tracking the same set again
    /// is a no-op. Returns whether anything changed.
    pub async fn track<I, K>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys = TrackedKeys::new(keys);
        let mut tracking = self.tracking.lock().await;

        let unchanged = self.shared.target.borrow().keys == keys;
        let running = tracking.is_some();
        if unchanged && running == !keys.is_empty() {
            return false;
        }

        tracking.take();
        self.shared.target.send_modify(|target| {
            target.generation += 1;
            target.keys = keys.clone();
        });
        self.shared.cache.replace(Snapshot::empty(&keys));
        self.shared.state.send_modify(|state| {
            state.last_error = None;
            state.last_synced = None;
        });

        if keys.is_empty() {
            info!("stopped tracking issues");
        } else {
            info!(issues = ?keys.to_vec(), "tracking issues");
            *tracking = Some(Tracking::start(&self.shared));
        }
        true
    }

    /// Stops all background work and empties the cache.
    pub async fn untrack(&self) {
        self.track(Vec::<String>::new()).await;
    }

    /// Waits until the tracked key set has loaded once, or failed to.
    ///
    /// Returns immediately when nothing is tracked.
    pub async fn ready(&self) -> Result<()> {
        if self.tracked().is_empty() {
            return Ok(());
        }
        let mut state = self.shared.state.subscribe();
        let state = state
            .wait_for(|s| s.last_synced.is_some() || s.last_error.is_some())
            .await
            .map_err(|_| Error::Sync("sync engine stopped".to_string()))?;
        match &state.last_error {
            Some(message) => Err(Error::Sync(message.clone())),
            None => Ok(()),
        }
    }

    pub fn tracked(&self) -> TrackedKeys {
        self.shared.target.borrow().keys.clone()
    }

    /// Refreshes now, showing the loading state and returning any error.
    pub async fn refresh(&self) -> Result<Refresh> {
        self.shared.sync(Mode::Loud).await
    }

    /// Refreshes now in the background style: errors are logged, not returned.
    pub async fn refresh_silently(&self) -> Refresh {
        self.shared.sync_silently().await
    }

    pub async fn create(&self, draft: CardDraft) -> Result<Card> {
        draft.validate()?;
        let card = self.shared.store.create(draft).await?;
        info!(id = %card.id, issue = %card.parent_key, "card created");
        Ok(card)
    }

    pub async fn update(&self, id: CardId, patch: CardPatch) -> Result<Card> {
        patch.validate()?;
        let card = self.shared.store.update(id, patch).await?;
        info!(%id, status = %card.status, "card updated");
        Ok(card)
    }

    /// Submits the edit form as a wholesale replacement of its fields.
    pub async fn edit(&self, id: CardId, form: EditForm) -> Result<Card> {
        self.update(id, form.into_patch()).await
    }

    /// Drops the dragged card onto the `target` column.
    ///
    /// A payload that does not name a card is ignored: no store call is made
    /// and `None` is returned.
    pub async fn move_card(&self, payload: &str, target: CardStatus) -> Result<Option<Card>> {
        let Some(id) = resolve_drop(payload) else {
            debug!(payload, "drop without a card id ignored");
            return Ok(None);
        };
        self.update(id, CardPatch::status(target)).await.map(Some)
    }

    /// Deletes a confirmed card and refreshes the cache right away.
    ///
    /// The follow-up refresh is silent and still honours the guard, so the
    /// deleted card stays visible while an editor is open.
    pub async fn delete(&self, id: Confirmed<CardId>) -> Result<Refresh> {
        let id = id.into_inner();
        self.shared.store.delete(id).await?;
        info!(%id, "card deleted");
        Ok(self.shared.sync_silently().await)
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.cache.snapshot()
    }

    /// Wakes on every committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.cache.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.shared.state.subscribe()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
