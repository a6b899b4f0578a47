// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use tb_core::{CardId, CardPatch};

use crate::cli::EditFields;
use crate::config::Config;
use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::store::RemoteStore;

use super::{open_board, stdout};

pub async fn run(config: &Config, id: CardId, fields: EditFields) -> Result<()> {
    let board = open_board(config)?;
    run_impl(board.engine(), id, fields, &mut stdout()).await
}

pub(crate) async fn run_impl<S: RemoteStore>(
    engine: &SyncEngine<S>,
    id: CardId,
    fields: EditFields,
    out: &mut impl Write,
) -> Result<()> {
    let patch = to_patch(fields);
    if patch.is_empty() {
        return Err(Error::Validation(
            "nothing to change\n  hint: pass at least one field, e.g. --summary".to_string(),
        ));
    }
    let card = engine.update(id, patch).await?;
    writeln!(out, "Updated #{} ({})", card.id, card.status)?;
    Ok(())
}

/// Only the given fields change. An empty detail, tester or reply clears it.
pub(crate) fn to_patch(fields: EditFields) -> CardPatch {
    CardPatch {
        reference: fields.reference,
        kind: fields.kind,
        summary: fields.summary,
        detail: fields.detail.map(non_blank),
        status: fields.status,
        tester: fields.tester.map(non_blank),
        developer_reply: fields.reply.map(non_blank),
        images: None,
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
#[path = "edit_tests.rs"]
mod tests;
