// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text rendering of cards and boards for the terminal.

use tb_core::lifecycle::filter_column;
use tb_core::{Card, CardStatus, IssueStats, ParentIssue};

use crate::cache::Snapshot;

/// One-line summary of a card.
///
/// ```text
/// #12 [error] AC3: Login button does nothing (marta)
/// ```
pub fn format_card_line(card: &Card) -> String {
    let mut line = format!(
        "#{} [{}] {}: {}",
        card.id, card.kind, card.reference, card.summary
    );
    if let Some(tester) = &card.tester {
        line.push_str(&format!(" ({tester})"));
    }
    line
}

/// Card line followed by its detail, developer reply and images, indented.
pub fn format_card(card: &Card) -> Vec<String> {
    let mut lines = vec![format_card_line(card)];
    if let Some(detail) = &card.detail {
        lines.extend(detail.lines().map(|l| format!("    {l}")));
    }
    if let Some(reply) = card.visible_reply() {
        lines.push(format!("    reply: {reply}"));
    }
    for url in &card.images {
        lines.push(format!("    image: {url}"));
    }
    lines
}

pub fn format_issue_header(key: &str, issue: Option<&ParentIssue>, stats: &IssueStats) -> String {
    let title = match issue {
        Some(issue) if !issue.summary.is_empty() => format!("{key} {}", issue.summary),
        _ => key.to_string(),
    };
    format!(
        "{title} ({}/{} resolved, {} open, {} pending)",
        stats.resolved, stats.total, stats.open_errors, stats.pending
    )
}

/// Column heading, e.g. `🔴 Errors (2)`.
pub fn format_column_heading(status: CardStatus, count: usize) -> String {
    format!("{} {} ({count})", status.marker(), status.label())
}

/// Renders every tracked issue of the snapshot with its columns.
///
/// Issues follow the order of `issues` where known; keys missing from it
/// come last in key order. `tester` narrows each column to one tester.
pub fn format_board(snapshot: &Snapshot, issues: &[ParentIssue], tester: Option<&str>) -> String {
    let mut keys: Vec<&str> = issues
        .iter()
        .map(|issue| issue.key.as_str())
        .filter(|key| snapshot.keys().any(|k| k == key))
        .collect();
    for key in snapshot.keys() {
        if !keys.contains(&key.as_str()) {
            keys.push(key.as_str());
        }
    }

    let mut sections = Vec::new();
    for key in keys {
        let cards = snapshot.cards_for(key);
        let issue = issues.iter().find(|issue| issue.key == key);
        let mut lines = vec![format_issue_header(
            key,
            issue,
            &IssueStats::from_cards(cards),
        )];
        for status in CardStatus::BOARD_ORDER {
            let column = filter_column(cards, status, tester);
            lines.push(format!("  {}", format_column_heading(status, column.len())));
            for card in column {
                lines.extend(format_card(card).into_iter().map(|l| format!("    {l}")));
            }
        }
        sections.push(lines.join("\n"));
    }
    sections.join("\n\n")
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
