// Terminal presentation of run results and bookmarks

use crate::models::{CleaningSummary, RunStatus, clamp_preview_count};
use crate::state::StateChange;

/// Shown in place of a preview when nothing survived filtering.
pub const EMPTY_RESULT_MESSAGE: &str = "No valid emails found after filtering.";

/// Labelled summary block, one count per line.
pub fn render_summary(raw_count: usize, summary: &CleaningSummary) -> String {
    let rows = [
        ("Found (raw)", raw_count),
        ("Original", summary.original),
        ("Kept", summary.kept),
        ("Removed blank", summary.removed_blank),
        ("Removed invalid", summary.removed_invalid),
        ("Removed single char", summary.removed_single_char),
        ("Removed numeric start", summary.removed_numeric_start),
        ("Removed duplicates", summary.removed_duplicates),
        ("Removed by keywords", summary.removed_keywords),
    ];

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, count)| format!("{:<width$} : {}", label, count, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `count` emails (clamped to 1..=10000), then a note for the remainder.
pub fn render_preview(emails: &[String], count: usize) -> String {
    if emails.is_empty() {
        return EMPTY_RESULT_MESSAGE.to_string();
    }

    let max_rows = clamp_preview_count(count);
    let mut preview = emails
        .iter()
        .take(max_rows)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    if emails.len() > max_rows {
        preview.push_str(&format!("\n… ({} more)", emails.len() - max_rows));
    }

    preview
}

/// Status line for a state change, if it is one the user should see.
pub fn render_status(change: &StateChange) -> Option<String> {
    match change {
        StateChange::StatusChanged { status, text } if !text.is_empty() => match status {
            // The summary itself is printed separately
            RunStatus::Ready => Some("Done.".to_string()),
            _ => Some(text.clone()),
        },
        _ => None,
    }
}

/// Numbered bookmark list as used by `bookmarks list`.
pub fn render_bookmarks(bookmarks: &[String]) -> String {
    if bookmarks.is_empty() {
        return "No saved keywords".to_string();
    }

    bookmarks
        .iter()
        .enumerate()
        .map(|(i, keywords)| format!("[{}] {}", i, keywords))
        .collect::<Vec<_>>()
        .join("\n")
}
