// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket client for the tb-remote card store.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use tb_core::protocol::{ClientMessage, ErrorKind, ServerMessage};
use tb_core::{Card, CardDraft, CardId, CardPatch, ChangeEvent};

use super::{RemoteStore, StoreFuture};
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Buffered change notifications per subscription.
const CHANGE_BUFFER: usize = 64;

/// Default upper bound for one request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Card store reached over a WebSocket.
///
/// Requests share one lazily opened connection and are answered in order.
/// A broken connection is dropped and reopened by the next request.
/// Each subscription uses a dedicated connection.
pub struct WebSocketStore {
    url: String,
    conn: Mutex<Option<WsStream>>,
    request_timeout: Duration,
}

impl WebSocketStore {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketStore {
            url: url.into(),
            conn: Mutex::new(None),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, msg: ClientMessage) -> Result<ServerMessage> {
        let mut conn = self.conn.lock().await;
        if conn.is_none() {
            *conn = Some(connect(&self.url).await?);
        }
        let ws = conn
            .as_mut()
            .ok_or_else(|| Error::Store("connection closed".to_string()))?;

        let result = match tokio::time::timeout(self.request_timeout, exchange(ws, &msg)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Store("request timed out".to_string())),
        };

        if result.is_err() {
            // The reply may still arrive later and would be read as the
            // answer to the next request.
            *conn = None;
        }
        result
    }
}

async fn connect(url: &str) -> Result<WsStream> {
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| Error::Store(format!("cannot connect to {url}: {e}")))?;
    debug!(url, "connected to card store");
    Ok(ws)
}

/// Sends one message and waits for the next text frame.
async fn exchange(ws: &mut WsStream, msg: &ClientMessage) -> Result<ServerMessage> {
    let json = msg.to_json()?;
    ws.send(Message::Text(json.into()))
        .await
        .map_err(|e| Error::Store(format!("send failed: {e}")))?;

    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return ServerMessage::from_json(&text)
                    .map_err(|e| Error::Store(format!("malformed response: {e}")));
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(Error::Store("connection closed".to_string()));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(Error::Store(format!("receive failed: {e}"))),
        }
    }
}

/// Maps an error reply (or an answer of the wrong shape) to a client error.
fn failure(reply: ServerMessage, id: Option<CardId>) -> Error {
    match reply {
        ServerMessage::Error {
            kind: ErrorKind::NotFound,
            message,
        } => match id {
            Some(id) => Error::NotFound(id),
            None => Error::Store(message),
        },
        ServerMessage::Error {
            kind: ErrorKind::Validation,
            message,
        } => Error::Validation(message),
        ServerMessage::Error { message, .. } => Error::Store(message),
        other => Error::Store(format!("unexpected response: {other:?}")),
    }
}

/// Relays change notifications until either side goes away.
async fn forward_changes(mut ws: WsStream, tx: mpsc::Sender<ChangeEvent>) {
    loop {
        tokio::select! {
            _ = tx.closed() => {
                let _ = ws.close(None).await;
                debug!("change subscription released");
                return;
            }
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => match ServerMessage::from_json(&text) {
                    Ok(ServerMessage::Change(event)) => {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Ok(other) => debug!(?other, "ignoring message on change feed"),
                    Err(e) => warn!(error = %e, "malformed change notification"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    warn!("change feed closed by store");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "change feed failed");
                    return;
                }
            }
        }
    }
}

impl RemoteStore for WebSocketStore {
    fn list<'a>(&'a self, parent_keys: &'a [String]) -> StoreFuture<'a, Vec<Card>> {
        Box::pin(async move {
            match self.request(ClientMessage::list(parent_keys.to_vec())).await? {
                ServerMessage::Cards { cards } => Ok(cards),
                other => Err(failure(other, None)),
            }
        })
    }

    fn create(&self, draft: CardDraft) -> StoreFuture<'_, Card> {
        Box::pin(async move {
            match self.request(ClientMessage::create(draft)).await? {
                ServerMessage::Card { card } => Ok(card),
                other => Err(failure(other, None)),
            }
        })
    }

    fn update(&self, id: CardId, patch: CardPatch) -> StoreFuture<'_, Card> {
        Box::pin(async move {
            match self.request(ClientMessage::update(id, patch)).await? {
                ServerMessage::Card { card } => Ok(card),
                other => Err(failure(other, Some(id))),
            }
        })
    }

    fn delete(&self, id: CardId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            match self.request(ClientMessage::delete(id)).await? {
                ServerMessage::Deleted { .. } => Ok(()),
                other => Err(failure(other, Some(id))),
            }
        })
    }

    fn subscribe<'a>(&'a self, scope: &'a str) -> StoreFuture<'a, mpsc::Receiver<ChangeEvent>> {
        Box::pin(async move {
            let mut ws = connect(&self.url).await?;
            let ack = tokio::time::timeout(
                self.request_timeout,
                exchange(&mut ws, &ClientMessage::subscribe(scope)),
            )
            .await
            .map_err(|_| Error::Store("subscribe timed out".to_string()))??;

            match ack {
                ServerMessage::Subscribed { .. } => {}
                other => return Err(failure(other, None)),
            }

            let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
            tokio::spawn(forward_changes(ws, tx));
            debug!(scope, "subscribed to change feed");
            Ok(rx)
        })
    }
}

#[cfg(test)]
#[path = "websocket_tests.rs"]
mod tests;
