// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use tb_core::{CardDraft, CardKind, CardStatus};

use crate::config::Config;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::store::RemoteStore;

use super::{open_board, stdout};

/// Values of `tb new`.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub key: String,
    pub reference: String,
    pub kind: CardKind,
    pub summary: String,
    pub detail: Option<String>,
    pub status: CardStatus,
}

impl NewCard {
    /// Draft recorded under `tester`. A blank detail is dropped.
    pub fn into_draft(self, tester: Option<String>) -> CardDraft {
        let mut draft = CardDraft::new(self.key, self.reference, self.summary);
        draft.kind = self.kind;
        draft.status = self.status;
        draft.detail = self.detail.filter(|d| !d.trim().is_empty());
        draft.tester = tester;
        draft
    }
}

pub async fn run(config: &Config, card: NewCard) -> Result<()> {
    let board = open_board(config)?;
    run_impl(board.engine(), card.into_draft(config.tester.clone()), &mut stdout()).await
}

pub(crate) async fn run_impl<S: RemoteStore>(
    engine: &SyncEngine<S>,
    draft: CardDraft,
    out: &mut impl Write,
) -> Result<()> {
    let card = engine.create(draft).await?;
    writeln!(
        out,
        "Created #{} on {} ({})",
        card.id, card.parent_key, card.status
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "new_tests.rs"]
mod tests;
