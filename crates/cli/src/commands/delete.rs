// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use tb_core::{CardId, Confirmed};

use crate::config::Config;
use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::store::RemoteStore;

use super::{open_board, prompt, stdout};

pub async fn run(config: &Config, id: CardId, yes: bool) -> Result<()> {
    let board = open_board(config)?;
    let confirm = |id: &CardId| yes || prompt(&format!("Delete card #{id}?"));
    run_impl(board.engine(), id, confirm, &mut stdout()).await
}

/// Deletes `id` once `confirm` agrees; declining is [`Error::Cancelled`].
pub(crate) async fn run_impl<S, F>(
    engine: &SyncEngine<S>,
    id: CardId,
    confirm: F,
    out: &mut impl Write,
) -> Result<()>
where
    S: RemoteStore,
    F: FnOnce(&CardId) -> bool,
{
    let id = Confirmed::ask(id, confirm).ok_or(Error::Cancelled)?;
    let shown = *id.get();
    engine.delete(id).await?;
    writeln!(out, "Deleted #{shown}")?;
    Ok(())
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
