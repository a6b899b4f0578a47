// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use tb_core::CardStatus;

use crate::config::Config;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::store::RemoteStore;

use super::{open_board, stdout};

pub async fn run(config: &Config, payload: &str, target: CardStatus) -> Result<()> {
    let board = open_board(config)?;
    run_impl(board.engine(), payload, target, &mut stdout()).await
}

/// Moves the card named by `payload`. A payload without a card id is a no-op.
pub(crate) async fn run_impl<S: RemoteStore>(
    engine: &SyncEngine<S>,
    payload: &str,
    target: CardStatus,
    out: &mut impl Write,
) -> Result<()> {
    match engine.move_card(payload, target).await? {
        Some(card) => writeln!(out, "Moved #{} to {}", card.id, card.status.label())?,
        None => writeln!(out, "Nothing to move: '{payload}' is not a card id")?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
