// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test server utilities and server tests.
//!
//! Provides a TestServer that runs on a random port over an in-memory
//! card database.

#![cfg(test)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::server;
use crate::state::ServerState;

/// A test server that runs on a random port and can be controlled.
pub struct TestServer {
    shutdown_tx: oneshot::Sender<()>,
    state: ServerState,
    addr: SocketAddr,
}

impl TestServer {
    /// Start a new test server on a random available port.
    pub async fn start() -> Self {
        let state = ServerState::in_memory().unwrap();

        // Bind to port 0 to get a random available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = accept_loop(listener, state_clone) => {
                    if let Err(e) = result {
                        eprintln!("Test server error: {}", e);
                    }
                }
                _ = shutdown_rx => {}
            }
        });

        TestServer {
            shutdown_tx,
            state,
            addr,
        }
    }

    /// Get the WebSocket URL for connecting to this server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get access to the server state for verification.
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Accept loop that uses the actual server::handle_connection.
async fn accept_loop(
    listener: TcpListener,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            let _ = server::handle_connection(stream, peer_addr, state).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    use tb_core::protocol::{ClientMessage, ErrorKind, ServerMessage, CARDS_TABLE};
    use tb_core::{CardDraft, CardId, CardPatch, CardStatus, ChangeEvent, Operation};

    type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn connect(server: &TestServer) -> Ws {
        connect_async(server.ws_url()).await.unwrap().0
    }

    async fn send(ws: &mut Ws, msg: ClientMessage) {
        ws.send(Message::Text(msg.to_json().unwrap().into()))
            .await
            .unwrap();
    }

    async fn receive(ws: &mut Ws) -> ServerMessage {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("no reply within 5s");
        match frame {
            Some(Ok(Message::Text(text))) => ServerMessage::from_json(&text).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    async fn request(ws: &mut Ws, msg: ClientMessage) -> ServerMessage {
        send(ws, msg).await;
        receive(ws).await
    }

    async fn handle(state: &ServerState, msg: ClientMessage) -> ServerMessage {
        server::handle_client_message(&msg.to_json().unwrap(), state).await
    }

    fn draft(parent: &str, summary: &str) -> CardDraft {
        CardDraft::new(parent, "AC1", summary)
    }

    #[tokio::test]
    async fn create_then_list_by_parent() {
        let state = ServerState::in_memory().unwrap();

        handle(&state, ClientMessage::create(draft("X-1", "first"))).await;
        handle(&state, ClientMessage::create(draft("X-2", "other"))).await;
        handle(&state, ClientMessage::create(draft("X-1", "second"))).await;

        match handle(&state, ClientMessage::list(vec!["X-1".into()])).await {
            ServerMessage::Cards { cards } => {
                let summaries: Vec<_> = cards.iter().map(|c| c.summary.as_str()).collect();
                assert_eq!(summaries, vec!["first", "second"]);
            }
            other => panic!("expected cards, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_returns_stored_card() {
        let state = ServerState::in_memory().unwrap();
        let id = match handle(&state, ClientMessage::create(draft("X-1", "crash"))).await {
            ServerMessage::Card { card } => card.id,
            other => panic!("expected card, got {other:?}"),
        };

        let reply = handle(
            &state,
            ClientMessage::update(id, CardPatch::status(CardStatus::Closed)),
        )
        .await;

        assert!(
            matches!(reply, ServerMessage::Card { ref card } if card.status == CardStatus::Closed)
        );
    }

    #[tokio::test]
    async fn missing_card_is_not_found() {
        let state = ServerState::in_memory().unwrap();

        let update = handle(
            &state,
            ClientMessage::update(CardId::new(42), CardPatch::status(CardStatus::Closed)),
        )
        .await;
        let delete = handle(&state, ClientMessage::delete(CardId::new(42))).await;

        for reply in [update, delete] {
            assert!(matches!(
                reply,
                ServerMessage::Error {
                    kind: ErrorKind::NotFound,
                    ..
                }
            ));
        }
    }

    #[tokio::test]
    async fn blank_summary_is_a_validation_error() {
        let state = ServerState::in_memory().unwrap();

        let reply = handle(&state, ClientMessage::create(draft("X-1", "  "))).await;

        assert!(matches!(
            reply,
            ServerMessage::Error {
                kind: ErrorKind::Validation,
                ..
            }
        ));
        assert!(state.list(&["X-1".to_string()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_request_is_a_validation_error() {
        let state = ServerState::in_memory().unwrap();

        let reply = server::handle_client_message(r#"{"type":"explode"}"#, &state).await;

        assert!(
            matches!(reply, ServerMessage::Error { kind: ErrorKind::Validation, ref message } if message.starts_with("malformed request"))
        );
    }

    #[tokio::test]
    async fn every_mutation_publishes_one_change() {
        let state = ServerState::in_memory().unwrap();
        let mut changes = state.subscribe();

        let card = state.create(draft("X-1", "crash")).await.unwrap();
        state
            .update(card.id, CardPatch::status(CardStatus::Pending))
            .await
            .unwrap();
        state.delete(card.id).await.unwrap();
        let _ = state.delete(card.id).await;

        let mut seen = Vec::new();
        while let Ok(event) = changes.try_recv() {
            seen.push(event.operation);
        }
        assert_eq!(
            seen,
            vec![Operation::Insert, Operation::Update, Operation::Delete]
        );
    }

    #[tokio::test]
    async fn subscriber_is_told_about_other_clients_changes() {
        let server = TestServer::start().await;
        let mut feed = connect(&server).await;
        let mut client = connect(&server).await;

        let ack = request(&mut feed, ClientMessage::subscribe(CARDS_TABLE)).await;
        assert_eq!(ack, ServerMessage::subscribed(CARDS_TABLE));

        request(&mut client, ClientMessage::create(draft("X-1", "crash"))).await;

        assert_eq!(
            receive(&mut feed).await,
            ServerMessage::change(ChangeEvent::new(Operation::Insert, CARDS_TABLE))
        );
        server.shutdown();
    }

    #[tokio::test]
    async fn unsubscribed_connection_only_gets_replies() {
        let server = TestServer::start().await;
        let mut client = connect(&server).await;

        let created = request(&mut client, ClientMessage::create(draft("X-1", "one"))).await;
        assert!(matches!(created, ServerMessage::Card { .. }));

        // A change event queued ahead of the reply would show up here.
        let pong = request(&mut client, ClientMessage::ping(7)).await;
        assert_eq!(pong, ServerMessage::pong(7));
        server.shutdown();
    }

    #[tokio::test]
    async fn subscription_to_another_table_stays_quiet() {
        let server = TestServer::start().await;
        let mut feed = connect(&server).await;
        request(&mut feed, ClientMessage::subscribe("other_table")).await;

        server
            .state()
            .create(draft("X-1", "crash"))
            .await
            .unwrap();

        let next = tokio::time::timeout(Duration::from_millis(200), feed.next()).await;
        assert!(next.is_err(), "unexpected frame: {next:?}");
        server.shutdown();
    }

    #[tokio::test]
    async fn websocket_ping_is_answered() {
        let server = TestServer::start().await;
        let mut client = connect(&server).await;

        client
            .send(Message::Ping(vec![1, 2, 3].into()))
            .await
            .unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap();
        assert!(matches!(frame, Some(Ok(Message::Pong(ref data))) if data.as_ref() == [1, 2, 3]));
        server.shutdown();
    }
}
