// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tb-core: Shared library for the test board
//!
//! This crate provides the card data model, the card lifecycle rules, the
//! report serializer, the wire protocol and the SQLite card store used by
//! both the `tb` client and the `tb-remote` store server.

pub mod card;
pub mod db;
pub mod error;
pub mod export;
pub mod issue;
pub mod lifecycle;
pub mod protocol;

pub use card::{Card, CardDraft, CardId, CardKind, CardPatch, CardStatus};
pub use db::CardDb;
pub use error::{Error, Result};
pub use issue::ParentIssue;
pub use lifecycle::{Confirmed, EditForm, IssueStats};
pub use protocol::{ChangeEvent, Operation};
