// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core card types for the test board.
//!
//! A [`Card`] is one finding filed by a tester against a parent issue. Cards
//! are created from a [`CardDraft`] and modified through a [`CardPatch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Store-assigned card identifier. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(i64);

impl CardId {
    pub fn new(raw: i64) -> Self {
        CardId(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(CardId)
            .map_err(|_| Error::InvalidCardId(s.to_string()))
    }
}

/// Nature of the finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Something is broken.
    Error,
    /// The tester needs clarification.
    Question,
    /// Suggested improvement.
    Proposal,
    /// Usability or presentation problem.
    Ux,
}

impl CardKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Error => "error",
            CardKind::Question => "question",
            CardKind::Proposal => "proposal",
            CardKind::Ux => "ux",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CardKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(CardKind::Error),
            "question" => Ok(CardKind::Question),
            "proposal" => Ok(CardKind::Proposal),
            "ux" => Ok(CardKind::Ux),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Board column a card sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Fixed by the developer, waiting for the tester to validate.
    Pending,
    /// Confirmed problem, still open.
    OpenError,
    /// Validated as fixed.
    Closed,
    /// Turned out not to be a problem.
    Discarded,
}

impl CardStatus {
    /// Column layout order on the board.
    pub const BOARD_ORDER: [CardStatus; 4] = [
        CardStatus::Pending,
        CardStatus::OpenError,
        CardStatus::Closed,
        CardStatus::Discarded,
    ];

    /// Section order in exported reports.
    pub const EXPORT_ORDER: [CardStatus; 4] = [
        CardStatus::OpenError,
        CardStatus::Pending,
        CardStatus::Closed,
        CardStatus::Discarded,
    ];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Pending => "pending",
            CardStatus::OpenError => "open_error",
            CardStatus::Closed => "closed",
            CardStatus::Discarded => "discarded",
        }
    }

    /// Status-specific marker used on column headers and in reports.
    pub fn marker(&self) -> &'static str {
        match self {
            CardStatus::Pending => "⏳",
            CardStatus::OpenError => "🔴",
            CardStatus::Closed => "✅",
            CardStatus::Discarded => "❌",
        }
    }

    /// Human-readable column title.
    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::Pending => "Pending validation",
            CardStatus::OpenError => "Errors",
            CardStatus::Closed => "Closed",
            CardStatus::Discarded => "Discarded",
        }
    }

    /// Closed and discarded cards both count as resolved in summaries.
    pub fn is_resolved(&self) -> bool {
        matches!(self, CardStatus::Closed | CardStatus::Discarded)
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CardStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CardStatus::Pending),
            "open_error" | "open-error" => Ok(CardStatus::OpenError),
            "closed" => Ok(CardStatus::Closed),
            "discarded" => Ok(CardStatus::Discarded),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A unit of test feedback attached to one parent issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Key of the owning issue in the external tracker.
    pub parent_key: String,
    /// Short label such as an acceptance-criterion tag.
    #[serde(rename = "ref")]
    pub reference: String,
    pub kind: CardKind,
    pub summary: String,
    pub detail: Option<String>,
    pub status: CardStatus,
    pub tester: Option<String>,
    /// Only meaningful while the card is an open error.
    #[serde(default)]
    pub developer_reply: Option<String>,
    /// Image URLs in upload order.
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Materializes a draft with a store-assigned id and timestamp.
    pub fn from_draft(id: CardId, draft: CardDraft, now: DateTime<Utc>) -> Self {
        Card {
            id,
            parent_key: draft.parent_key,
            reference: draft.reference,
            kind: draft.kind,
            summary: draft.summary,
            detail: draft.detail,
            status: draft.status,
            tester: draft.tester,
            developer_reply: draft.developer_reply,
            images: draft.images,
            created_at: now,
            updated_at: now,
        }
    }

    /// Image list with `url` appended, unless it is already present.
    pub fn images_with(&self, url: &str) -> Vec<String> {
        let mut images = self.images.clone();
        if !images.iter().any(|existing| existing == url) {
            images.push(url.to_string());
        }
        images
    }

    /// Image list with every occurrence of `url` removed and no repeated
    /// URLs left; the first occurrence of each keeps its place.
    pub fn images_without(&self, url: &str) -> Vec<String> {
        let mut images: Vec<String> = Vec::with_capacity(self.images.len());
        for existing in &self.images {
            if existing != url && !images.contains(existing) {
                images.push(existing.clone());
            }
        }
        images
    }
}

/// Fields supplied when filing a new card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    pub parent_key: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub kind: CardKind,
    pub summary: String,
    #[serde(default)]
    pub detail: Option<String>,
    pub status: CardStatus,
    #[serde(default)]
    pub tester: Option<String>,
    #[serde(default)]
    pub developer_reply: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CardDraft {
    /// Creates a draft with the edit form's defaults (an open error).
    pub fn new(
        parent_key: impl Into<String>,
        reference: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        CardDraft {
            parent_key: parent_key.into(),
            reference: reference.into(),
            kind: CardKind::Error,
            summary: summary.into(),
            detail: None,
            status: CardStatus::OpenError,
            tester: None,
            developer_reply: None,
            images: Vec::new(),
        }
    }

    /// Rejects drafts missing a parent key, ref or summary, or listing an
    /// image twice.
    pub fn validate(&self) -> Result<()> {
        require_text("parent key", &self.parent_key)?;
        require_text("ref", &self.reference)?;
        require_text("summary", &self.summary)?;
        require_distinct_images(&self.images)
    }
}

/// Partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CardKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub detail: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CardStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub tester: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub developer_reply: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl CardPatch {
    /// A patch that only moves the card to another column.
    pub fn status(status: CardStatus) -> Self {
        CardPatch {
            status: Some(status),
            ..CardPatch::default()
        }
    }

    /// A patch that only replaces the image list.
    pub fn images(images: Vec<String>) -> Self {
        CardPatch {
            images: Some(images),
            ..CardPatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CardPatch::default()
    }

    /// Rejects patches that would blank a required field or list an image
    /// twice.
    pub fn validate(&self) -> Result<()> {
        if let Some(reference) = &self.reference {
            require_text("ref", reference)?;
        }
        if let Some(summary) = &self.summary {
            require_text("summary", summary)?;
        }
        if let Some(images) = &self.images {
            require_distinct_images(images)?;
        }
        Ok(())
    }

    /// Applies the patch in place and bumps `updated_at`.
    pub fn apply(&self, card: &mut Card, now: DateTime<Utc>) {
        if let Some(reference) = &self.reference {
            card.reference = reference.clone();
        }
        if let Some(kind) = self.kind {
            card.kind = kind;
        }
        if let Some(summary) = &self.summary {
            card.summary = summary.clone();
        }
        if let Some(detail) = &self.detail {
            card.detail = detail.clone();
        }
        if let Some(status) = self.status {
            card.status = card.status.transition_to(status);
        }
        if let Some(tester) = &self.tester {
            card.tester = tester.clone();
        }
        if let Some(reply) = &self.developer_reply {
            card.developer_reply = reply.clone();
        }
        if let Some(images) = &self.images {
            card.images = images.clone();
        }
        card.updated_at = now;
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_distinct_images(images: &[String]) -> Result<()> {
    for (i, url) in images.iter().enumerate() {
        if images[..i].contains(url) {
            return Err(Error::Validation(format!("image listed twice: {url}")));
        }
    }
    Ok(())
}

/// Distinguishes an explicit `null` from an absent field.
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "card_tests.rs"]
mod tests;
