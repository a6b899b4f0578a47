// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use tb_core::{CardKind, CardStatus};

use super::*;
use crate::commands::testing::TestContext;
use crate::test_helpers::make_card;

#[test]
fn test_to_patch_leaves_absent_fields_alone() {
    let patch = to_patch(EditFields {
        summary: Some("Crash on save".to_string()),
        ..EditFields::default()
    });

    assert_eq!(patch.summary.as_deref(), Some("Crash on save"));
    assert_eq!(patch.detail, None);
    assert_eq!(patch.developer_reply, None);
}

#[test]
fn test_to_patch_empty_value_clears() {
    let patch = to_patch(EditFields {
        detail: Some(String::new()),
        reply: Some("Fixed in 2.3".to_string()),
        ..EditFields::default()
    });

    assert_eq!(patch.detail, Some(None));
    assert_eq!(patch.developer_reply, Some(Some("Fixed in 2.3".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_edit_updates_only_given_fields() {
    let mut card = make_card(4, "X-1", CardStatus::OpenError);
    card.detail = Some("steps".to_string());
    let ctx = TestContext::new(&["X-1"], vec![card]);

    let fields = EditFields {
        kind: Some(CardKind::Question),
        status: Some(CardStatus::Pending),
        ..EditFields::default()
    };
    run_impl(ctx.board.engine(), CardId::new(4), fields, &mut ctx.out())
        .await
        .unwrap();

    let stored = &ctx.store.stored()[0];
    assert_eq!(stored.kind, CardKind::Question);
    assert_eq!(stored.status, CardStatus::Pending);
    assert_eq!(stored.detail.as_deref(), Some("steps"));
    assert_eq!(ctx.output(), "Updated #4 (pending)\n");
}

#[tokio::test(start_paused = true)]
async fn test_edit_without_fields_is_rejected() {
    let ctx = TestContext::new(&["X-1"], vec![make_card(4, "X-1", CardStatus::OpenError)]);

    let err = run_impl(
        ctx.board.engine(),
        CardId::new(4),
        EditFields::default(),
        &mut ctx.out(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(ctx.store.update_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_edit_of_deleted_card_is_not_found() {
    let ctx = TestContext::new(&["X-1"], vec![]);
    let fields = EditFields {
        summary: Some("x".to_string()),
        ..EditFields::default()
    };

    let err = run_impl(ctx.board.engine(), CardId::new(9), fields, &mut ctx.out())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(id) if id == CardId::new(9)));
}
