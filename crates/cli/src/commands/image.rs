// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tb attach` and `tb detach`.
//!
//! Both work from the board cache, so the card's issue is loaded first:
//! the one named with `--issue`, or every issue under test.

use std::io::Write;
use std::path::Path;

use tb_core::CardId;

use crate::board::Board;
use crate::config::Config;
use crate::error::Result;
use crate::images::extension_of;
use crate::store::RemoteStore;

use super::{load, open_board, stdout};

pub async fn attach(config: &Config, id: CardId, file: &Path, issue: Option<&str>) -> Result<()> {
    let blob = tokio::fs::read(file).await?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let board = open_board(config)?;
    let result = attach_impl(&board, issue, id, blob, &extension_of(&name), &mut stdout()).await;
    board.engine().untrack().await;
    result
}

pub(crate) async fn attach_impl<S: RemoteStore>(
    board: &Board<S>,
    issue: Option<&str>,
    id: CardId,
    blob: Vec<u8>,
    extension: &str,
    out: &mut impl Write,
) -> Result<()> {
    load(board, issue).await?;
    let card = board.attach_image(id, blob, extension).await?;
    if let Some(url) = card.images.last() {
        writeln!(out, "Attached {url} to #{id}")?;
    }
    Ok(())
}

pub async fn detach(config: &Config, id: CardId, url: &str, issue: Option<&str>) -> Result<()> {
    let board = open_board(config)?;
    let result = detach_impl(&board, issue, id, url, &mut stdout()).await;
    board.engine().untrack().await;
    result
}

pub(crate) async fn detach_impl<S: RemoteStore>(
    board: &Board<S>,
    issue: Option<&str>,
    id: CardId,
    url: &str,
    out: &mut impl Write,
) -> Result<()> {
    load(board, issue).await?;
    let card = board.detach_image(id, url).await?;
    writeln!(
        out,
        "Detached {url} from #{id} ({} image(s) left)",
        card.images.len()
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
