// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Every connection is request/response. A connection that sends
//! `subscribe` additionally receives the change events of that table.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use tb_core::protocol::{ClientMessage, ErrorKind, ServerMessage};
use tb_core::ChangeEvent;

use crate::state::ServerState;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Change feed of one subscribed connection.
struct Subscription {
    table: String,
    rx: broadcast::Receiver<ChangeEvent>,
}

/// Next event for the subscribed table; pending forever when not subscribed.
async fn next_change(subscription: &mut Option<Subscription>) -> Result<ChangeEvent, RecvError> {
    let Some(sub) = subscription else {
        return std::future::pending().await;
    };
    loop {
        let event = sub.rx.recv().await?;
        if event.table == sub.table {
            return Ok(event);
        }
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();
    let mut subscription: Option<Subscription> = None;

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_client_message(&text, &state).await;
                        if let ServerMessage::Subscribed { table } = &response {
                            debug!("Client {} subscribed to {}", peer_addr, table);
                            subscription = Some(Subscription {
                                table: table.clone(),
                                rx: state.subscribe(),
                            });
                        }
                        ws_sink.send(Message::Text(response.to_json()?.into())).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer_addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types (Binary, Pong, Frame)
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} stream ended", peer_addr);
                        break;
                    }
                }
            }

            change = next_change(&mut subscription) => {
                match change {
                    Ok(event) => {
                        let json = ServerMessage::change(event).to_json()?;
                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            warn!("Failed to send change to {}: {}", peer_addr, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        // Events carry no data, so a skipped one is covered by the next.
                        warn!("Client {} lagged by {} changes", peer_addr, n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process a client message and return the response.
pub(crate) async fn handle_client_message(text: &str, state: &ServerState) -> ServerMessage {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::error(ErrorKind::Validation, format!("malformed request: {e}"))
        }
    };
    debug!("Received message: {:?}", msg);

    let result = match msg {
        ClientMessage::List { parent_keys } => state.list(&parent_keys).await.map(|cards| {
            debug!("List response: {} cards", cards.len());
            ServerMessage::cards(cards)
        }),
        ClientMessage::Create { draft } => state.create(draft).await.map(ServerMessage::card),
        ClientMessage::Update { id, patch } => {
            state.update(id, patch).await.map(ServerMessage::card)
        }
        ClientMessage::Delete { id } => state.delete(id).await.map(|()| ServerMessage::deleted(id)),
        ClientMessage::Subscribe { table } => Ok(ServerMessage::subscribed(table)),
        ClientMessage::Ping { id } => Ok(ServerMessage::pong(id)),
    };
    result.unwrap_or_else(|e| ServerMessage::error(error_kind(&e), e.to_string()))
}

fn error_kind(err: &tb_core::Error) -> ErrorKind {
    match err {
        tb_core::Error::CardNotFound(_) => ErrorKind::NotFound,
        tb_core::Error::Validation(_) => ErrorKind::Validation,
        _ => ErrorKind::Store,
    }
}
