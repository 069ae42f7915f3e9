//! Plain-text rendering of conductor state for the terminal

use chrono::{DateTime, Local, Utc};
use doi_conductor::{HistoryStore, ResultView};

/// Render the result/error area
pub fn render_view(view: &ResultView<'_>) -> String {
    match view {
        ResultView::Empty => String::new(),
        ResultView::Loading { query } => format!("Searching for: {}", truncate(query, 60)),
        ResultView::Error(message) => format!("Error: {message}"),
        ResultView::Result(result) => {
            let mut out = String::new();
            match (&result.doi, result.doi_url()) {
                (Some(doi), Some(url)) => {
                    out.push_str(&format!("DOI:    {doi}\n"));
                    out.push_str(&format!("Link:   {url}\n"));
                }
                _ => out.push_str("No DOI found for this citation.\n"),
            }
            if let Some(title) = &result.title {
                out.push_str(&format!("Title:  {title}\n"));
            }
            if !result.sources.is_empty() {
                out.push_str("Sources:\n");
                for source in &result.sources {
                    out.push_str(&format!("  - {} <{}>\n", source.title, source.uri));
                }
            }
            out.trim_end().to_string()
        }
    }
}

/// Render the history list, newest first, numbered from 1
pub fn render_history(history: &HistoryStore) -> String {
    if history.is_empty() {
        return "No searches yet.".to_string();
    }

    history
        .entries()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>3}. [{}] {}  {}  ({})",
                i + 1,
                format_timestamp(entry.timestamp),
                entry.doi.as_deref().unwrap_or("no DOI"),
                truncate(&entry.reference, 50),
                entry.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Local date and time for a millisecond Unix timestamp
pub fn format_timestamp(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

/// Shorten to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
