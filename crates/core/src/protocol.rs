// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between board clients and the card store.
//!
//! The protocol is simple:
//! - Client sends list/create/update/delete requests, each answered in order
//! - A connection that sends `subscribe` additionally receives every
//!   change notification the store broadcasts

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::card::{Card, CardDraft, CardId, CardPatch};

/// Table the store reports card changes under.
pub const CARDS_TABLE: &str = "test_cards";

/// Kind of mutation a change notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// A push notification from the store's change feed.
///
/// Carries no row data: receivers re-read whatever they track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub operation: Operation,
    pub table: String,
}

impl ChangeEvent {
    pub fn new(operation: Operation, table: impl Into<String>) -> Self {
        ChangeEvent {
            operation,
            table: table.into(),
        }
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// All cards whose parent key is in `parent_keys`, oldest first.
    List { parent_keys: Vec<String> },

    Create { draft: CardDraft },

    Update { id: CardId, patch: CardPatch },

    Delete { id: CardId },

    /// Start receiving change notifications on this connection.
    Subscribe { table: String },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed mutation payload.
    Validation,
    /// The referenced card does not exist.
    NotFound,
    /// Anything else on the store side.
    Store,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Response to a List request.
    Cards { cards: Vec<Card> },

    /// Response to Create and Update.
    Card { card: Card },

    /// Response to Delete.
    Deleted { id: CardId },

    /// Acknowledges a Subscribe request.
    Subscribed { table: String },

    /// A change notification, only sent to subscribed connections.
    Change(ChangeEvent),

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error message.
    Error {
        kind: ErrorKind,
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    pub fn list(parent_keys: Vec<String>) -> Self {
        ClientMessage::List { parent_keys }
    }

    pub fn create(draft: CardDraft) -> Self {
        ClientMessage::Create { draft }
    }

    pub fn update(id: CardId, patch: CardPatch) -> Self {
        ClientMessage::Update { id, patch }
    }

    pub fn delete(id: CardId) -> Self {
        ClientMessage::Delete { id }
    }

    pub fn subscribe(table: impl Into<String>) -> Self {
        ClientMessage::Subscribe {
            table: table.into(),
        }
    }

    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn cards(cards: Vec<Card>) -> Self {
        ServerMessage::Cards { cards }
    }

    pub fn card(card: Card) -> Self {
        ServerMessage::Card { card }
    }

    pub fn deleted(id: CardId) -> Self {
        ServerMessage::Deleted { id }
    }

    pub fn subscribed(table: impl Into<String>) -> Self {
        ServerMessage::Subscribed {
            table: table.into(),
        }
    }

    pub fn change(event: ChangeEvent) -> Self {
        ServerMessage::Change(event)
    }

    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind,
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
