// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed card storage.
//!
//! [`CardDb`] is the authoritative store behind the relay server: it assigns
//! ids and timestamps and answers the list/create/update/delete requests of
//! the wire protocol.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::card::{Card, CardDraft, CardId, CardPatch};
use crate::error::{Error, Result};

/// SQL schema for the card store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS test_cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_key TEXT NOT NULL,
    ref TEXT NOT NULL,
    kind TEXT NOT NULL,
    summary TEXT NOT NULL,
    detail TEXT,
    status TEXT NOT NULL,
    tester TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cards_parent ON test_cards(parent_key, created_at);
"#;

const CARD_COLUMNS: &str = "id, parent_key, ref, kind, summary, detail, status, tester,
     developer_reply, images, created_at, updated_at";

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| corrupted(column, value))
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupted(column, value))
}

fn corrupted(column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(format!(
            "invalid value '{value}' in column '{column}'"
        ))),
    )
}

/// Fixed-width timestamps so text order matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_card(row: &Row<'_>) -> std::result::Result<Card, rusqlite::Error> {
    let kind: String = row.get(3)?;
    let status: String = row.get(6)?;
    let images: String = row.get(9)?;
    let created: String = row.get(10)?;
    let updated: String = row.get(11)?;

    Ok(Card {
        id: CardId::new(row.get(0)?),
        parent_key: row.get(1)?,
        reference: row.get(2)?,
        kind: parse_db(&kind, "kind")?,
        summary: row.get(4)?,
        detail: row.get(5)?,
        status: parse_db(&status, "status")?,
        tester: row.get(7)?,
        developer_reply: row.get(8)?,
        images: serde_json::from_str(&images).map_err(|_| corrupted("images", &images))?,
        created_at: parse_timestamp(&created, "created_at")?,
        updated_at: parse_timestamp(&updated, "updated_at")?,
    })
}

/// Run schema creation and all migrations on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_reply_and_images(conn)?;
    Ok(())
}

/// Migration: stores created before replies and images existed lack the columns.
fn migrate_add_reply_and_images(conn: &Connection) -> Result<()> {
    let columns = [
        ("developer_reply", "TEXT"),
        ("images", "TEXT NOT NULL DEFAULT '[]'"),
    ];

    for (column, decl) in columns {
        let has_column: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('test_cards') WHERE name = ?1",
                [column],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_column {
            let sql = format!("ALTER TABLE test_cards ADD COLUMN {column} {decl}");
            conn.execute(&sql, [])?;
        }
    }
    Ok(())
}

/// SQLite connection with card store operations.
pub struct CardDb {
    conn: Connection,
}

impl CardDb {
    /// Open a database at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        run_migrations(&conn)?;
        Ok(CardDb { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(CardDb { conn })
    }

    /// Cards belonging to any of `parent_keys`, in creation order.
    pub fn list(&self, parent_keys: &[String]) -> Result<Vec<Card>> {
        if parent_keys.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=parent_keys.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM test_cards
             WHERE parent_key IN ({placeholders})
             ORDER BY created_at ASC, id ASC"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params_from_iter(parent_keys.iter()), row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Get a card by id.
    pub fn get(&self, id: CardId) -> Result<Card> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM test_cards WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id.get()], row_to_card)
            .optional()?
            .ok_or(Error::CardNotFound(id))
    }

    /// Insert a new card, assigning its id and timestamps.
    pub fn create(&self, draft: CardDraft) -> Result<Card> {
        draft.validate()?;
        let now = Utc::now();
        let stamp = format_timestamp(&now);
        let images = serde_json::to_string(&draft.images)?;

        self.conn.execute(
            "INSERT INTO test_cards (parent_key, ref, kind, summary, detail, status, tester,
             developer_reply, images, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                draft.parent_key,
                draft.reference,
                draft.kind.as_str(),
                draft.summary,
                draft.detail,
                draft.status.as_str(),
                draft.tester,
                draft.developer_reply,
                images,
                stamp,
            ],
        )?;

        let id = CardId::new(self.conn.last_insert_rowid());
        self.get(id)
    }

    /// Apply a partial update and return the stored result.
    pub fn update(&self, id: CardId, patch: &CardPatch) -> Result<Card> {
        patch.validate()?;
        let mut card = self.get(id)?;
        patch.apply(&mut card, Utc::now());
        let images = serde_json::to_string(&card.images)?;

        self.conn.execute(
            "UPDATE test_cards SET ref = ?2, kind = ?3, summary = ?4, detail = ?5,
             status = ?6, tester = ?7, developer_reply = ?8, images = ?9, updated_at = ?10
             WHERE id = ?1",
            params![
                id.get(),
                card.reference,
                card.kind.as_str(),
                card.summary,
                card.detail,
                card.status.as_str(),
                card.tester,
                card.developer_reply,
                images,
                format_timestamp(&card.updated_at),
            ],
        )?;

        self.get(id)
    }

    /// Permanently remove a card.
    pub fn delete(&self, id: CardId) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM test_cards WHERE id = ?1", params![id.get()])?;
        if removed == 0 {
            return Err(Error::CardNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
