// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use tb_core::protocol::{ClientMessage, ErrorKind, ServerMessage};
use tb_core::{Card, CardId};

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A `tb` command isolated from the user's config and environment.
pub struct Sandbox {
    pub dir: TempDir,
    config: PathBuf,
}

impl Sandbox {
    /// Sandbox whose config points at `store_url`. The tracker URL points at
    /// a closed port.
    pub fn new(store_url: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "store_url = \"{store_url}\"\n\
                 tracker_url = \"http://127.0.0.1:9\"\n\
                 tester = \"marta\"\n\
                 images_dir = \"{}\"\n",
                dir.path().join("images").display()
            ),
        )
        .unwrap();
        Sandbox { dir, config }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config
    }

    pub fn tb(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("tb");
        cmd.env("TESTBOARD_CONFIG", &self.config)
            .env_remove("TESTBOARD_STORE_URL")
            .env_remove("TESTBOARD_TRACKER_URL")
            .env_remove("TESTBOARD_USER")
            .env_remove("TESTBOARD_IMAGES_DIR")
            .env("RUST_LOG", "off")
            .current_dir(self.dir.path());
        cmd
    }
}

/// Store URL nothing listens on.
pub const DEAD_STORE: &str = "ws://127.0.0.1:9";

/// In-process card store speaking the store protocol.
pub struct FakeStore {
    pub addr: SocketAddr,
    pub cards: Arc<Mutex<Vec<Card>>>,
}

impl FakeStore {
    pub async fn start(cards: Vec<Card>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cards = Arc::new(Mutex::new(cards));
        let shared = Arc::clone(&cards);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let cards = Arc::clone(&shared);
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    while let Some(Ok(Message::Text(text))) = ws.next().await {
                        let reply = answer(&text, &cards);
                        let json = reply.to_json().unwrap();
                        if ws.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        FakeStore { addr, cards }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn cards(&self) -> Vec<Card> {
        self.cards.lock().unwrap().clone()
    }
}

fn answer(text: &str, cards: &Mutex<Vec<Card>>) -> ServerMessage {
    let mut cards = cards.lock().unwrap();
    match ClientMessage::from_json(text).unwrap() {
        ClientMessage::List { parent_keys } => ServerMessage::cards(
            cards
                .iter()
                .filter(|c| parent_keys.contains(&c.parent_key))
                .cloned()
                .collect(),
        ),
        ClientMessage::Create { draft } => {
            let id = CardId::new(cards.len() as i64 + 1);
            let card = Card::from_draft(id, draft, Utc::now());
            cards.push(card.clone());
            ServerMessage::card(card)
        }
        ClientMessage::Update { id, patch } => match cards.iter_mut().find(|c| c.id == id) {
            Some(card) => {
                patch.apply(card, Utc::now());
                ServerMessage::card(card.clone())
            }
            None => ServerMessage::error(ErrorKind::NotFound, format!("card not found: {id}")),
        },
        ClientMessage::Delete { id } => {
            let before = cards.len();
            cards.retain(|c| c.id != id);
            if cards.len() == before {
                ServerMessage::error(ErrorKind::NotFound, format!("card not found: {id}"))
            } else {
                ServerMessage::deleted(id)
            }
        }
        ClientMessage::Subscribe { table } => ServerMessage::subscribed(table),
        ClientMessage::Ping { id } => ServerMessage::pong(id),
    }
}
