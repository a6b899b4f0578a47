// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tb_core::CardStatus;

use super::*;
use crate::commands::testing::TestContext;
use crate::test_helpers::make_card;

fn after(millis: u64) -> impl Future<Output = ()> {
    tokio::time::sleep(Duration::from_millis(millis))
}

#[tokio::test(start_paused = true)]
async fn test_watch_prints_loaded_board() {
    let mut ctx = TestContext::new(&["X-1"], vec![make_card(1, "X-1", CardStatus::OpenError)]);
    let mut out = ctx.out();

    run_impl(&mut ctx.board, None, after(100), &mut out)
        .await
        .unwrap();

    let output = ctx.output();
    assert!(output.contains("X-1 issue X-1 (0/1 resolved, 1 open, 0 pending)"));
    assert!(output.contains("#1 [error] AC1: finding 1"));
}

#[tokio::test(start_paused = true)]
async fn test_watch_applies_tester_filter() {
    let mut mine = make_card(1, "X-1", CardStatus::OpenError);
    mine.tester = Some("marta".to_string());
    let mut ctx = TestContext::new(
        &["X-1"],
        vec![mine, make_card(2, "X-1", CardStatus::OpenError)],
    );
    let mut out = ctx.out();

    run_impl(&mut ctx.board, Some("marta"), after(100), &mut out)
        .await
        .unwrap();

    let output = ctx.output();
    assert!(output.contains("#1 "));
    assert!(!output.contains("#2 "));
}

#[tokio::test(start_paused = true)]
async fn test_watch_reports_sync_error_once() {
    let mut ctx = TestContext::new(&["X-1"], vec![]);
    ctx.store.fail(true);
    let mut out = ctx.out();

    run_impl(&mut ctx.board, None, after(100), &mut out)
        .await
        .unwrap();

    let output = ctx.output();
    assert_eq!(output.matches("sync error:").count(), 1);
    assert!(output.contains("store unreachable"));
}

#[tokio::test(start_paused = true)]
async fn test_watch_without_issues_prints_nothing() {
    let mut ctx = TestContext::new(&[], vec![]);
    let mut out = ctx.out();

    run_impl(&mut ctx.board, None, after(100), &mut out)
        .await
        .unwrap();

    assert!(ctx.output().is_empty());
}
