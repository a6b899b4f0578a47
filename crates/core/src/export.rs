// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test report rendering for posting back to the issue tracker.
//!
//! [`render`] is pure: the same card sequence always produces the same text.

use crate::card::{Card, CardStatus};
use crate::lifecycle::closed_count;

/// Report posted when an issue has no findings at all.
pub const VALIDATED_MESSAGE: &str = "✅ VALIDATED\n\nNo issues were found during testing.";

const REPORT_HEADER: &str = "🧪 TEST RESULTS\n\n";

fn section_title(status: CardStatus) -> &'static str {
    match status {
        CardStatus::OpenError => "OPEN ERRORS",
        CardStatus::Pending => "PENDING VALIDATION",
        CardStatus::Closed => "CLOSED",
        CardStatus::Discarded => "DISCARDED",
    }
}

/// Renders the cards of one parent issue as a report.
///
/// Sections follow [`CardStatus::EXPORT_ORDER`]; empty sections are omitted
/// and cards keep their input order within a section.
pub fn render(cards: &[Card]) -> String {
    if cards.is_empty() {
        return VALIDATED_MESSAGE.to_string();
    }

    let mut out = String::from(REPORT_HEADER);
    let mut first = true;

    for status in CardStatus::EXPORT_ORDER {
        let bucket: Vec<&Card> = cards.iter().filter(|c| c.status == status).collect();
        if bucket.is_empty() {
            continue;
        }
        if !first {
            out.push('\n');
        }
        first = false;

        out.push_str(&format!(
            "{} {} ({})\n\n",
            status.marker(),
            section_title(status),
            bucket.len()
        ));
        for card in bucket {
            render_card(&mut out, card);
        }
    }

    out.push_str(&format!(
        "\n---\nSummary: {}/{} resolved",
        closed_count(cards),
        cards.len()
    ));
    out
}

fn render_card(out: &mut String, card: &Card) {
    out.push_str(&format!(
        "**Status:** {} [ {} ]\n",
        card.status.marker(),
        card.status.as_str().to_uppercase()
    ));
    out.push_str(&format!(
        "**REF:** [ {} ] {}\n",
        card.kind.as_str().to_uppercase(),
        card.reference
    ));
    out.push_str(&format!("**Summary**: {}\n", card.summary));
    if let Some(detail) = card.detail.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("**Detail**: {detail}\n"));
    }
    if let Some(tester) = card.tester.as_deref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("**Tester**: {tester}\n"));
    }
    out.push_str("\n---\n\n");
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
