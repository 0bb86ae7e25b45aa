//! Plain-text rendering of store contents for the terminal.
//!
//! Pure functions from state to `String`. Columns are aligned by display width so
//! accented and CJK names line up.

use crate::config::{LabelCategory, Labels};
use crate::files::Directory;
use crate::model::{Notification, ResultDoc};
use crate::state::{BlindsearchCount, SearchState};
use unicode_width::UnicodeWidthStr;

const COLUMN_GAP: &str = "  ";

/// Marker shown next to a result carrying a known label.
pub fn label_marker(category: Option<LabelCategory>) -> char {
    match category {
        Some(LabelCategory::Important) => '!',
        Some(LabelCategory::Check) => '?',
        Some(LabelCategory::Seen) => '-',
        None => ' ',
    }
}

/// Most significant label category among `tags`.
pub fn strongest_label(labels: &Labels, tags: &[&str]) -> Option<LabelCategory> {
    let categories: Vec<LabelCategory> =
        tags.iter().filter_map(|tag| labels.category_of(tag)).collect();
    [LabelCategory::Important, LabelCategory::Check, LabelCategory::Seen]
        .into_iter()
        .find(|category| categories.contains(category))
}

/// The current page of a search, numbered from its absolute position.
pub fn render_results(state: &SearchState, labels: &Labels) -> String {
    let results = state.results();
    if results.is_empty() {
        return format!("No results ({} total)", state.total_hits());
    }

    let first = state.offset() + 1;
    let last = state.offset() + results.len();
    let mut lines = vec![format!(
        "Results {first}-{last} of {}",
        state.total_hits()
    )];
    for (idx, doc) in results.iter().enumerate() {
        lines.push(result_line(idx, doc, labels));
        for fragments in doc.highlight.values() {
            for fragment in fragments {
                lines.push(format!("   ...{fragment}..."));
            }
        }
    }
    lines.join("\n")
}

fn result_line(idx: usize, doc: &ResultDoc, labels: &Labels) -> String {
    let tags = doc.tags();
    let marker = label_marker(strongest_label(labels, &tags));
    let location = doc
        .field_str("path")
        .or_else(|| doc.field_str("filename"))
        .unwrap_or("");
    let mut line = format!("{idx}. [{marker}] {} {location}", doc.id());
    if !tags.is_empty() {
        line.push_str(&format!(" ({})", tags.join(", ")));
    }
    line.trim_end().to_string()
}

/// Metadata records as a table: position, then the requested source fields.
pub fn render_records(records: &[ResultDoc], columns: &[&str]) -> String {
    let mut header = vec!["#".to_string()];
    header.extend(columns.iter().map(|c| (*c).to_string()));

    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let mut row = vec![idx.to_string()];
            row.extend(columns.iter().map(|column| field_text(record, column)));
            row
        })
        .collect();

    render_table(&header, &rows)
}

/// Blindsearch statistics as a two-column table.
pub fn render_stats(stats: &[BlindsearchCount]) -> String {
    if stats.is_empty() {
        return "No statistics available".to_string();
    }
    let header = vec!["blindsearch".to_string(), "documents".to_string()];
    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|row| vec![row.key.clone(), row.count.to_string()])
        .collect();
    render_table(&header, &rows)
}

/// A directory listing, directories suffixed with `/`.
pub fn render_directory(directory: &Directory) -> String {
    let mut lines = vec![format!("/{}", directory.dirname.trim_start_matches('/'))];
    lines.extend(directory.items.iter().map(|entry| {
        if entry.is_directory() {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        }
    }));
    lines.join("\n")
}

/// One line per notification.
pub fn render_notifications(notifications: &[Notification]) -> String {
    notifications
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_text(record: &ResultDoc, field: &str) -> String {
    match record.source().get(field) {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            std::iter::once(header)
                .chain(rows.iter().map(Vec::as_slice))
                .filter_map(|row| row.get(col))
                .map(|cell| cell.width())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    std::iter::once(header)
        .chain(std::iter::once(rule.as_slice()))
        .chain(rows.iter().map(Vec::as_slice))
        .map(|row| table_line(row, &widths))
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_line(row: &[String], widths: &[usize]) -> String {
    let last = row.len().saturating_sub(1);
    let mut line = String::new();
    for (col, cell) in row.iter().enumerate() {
        line.push_str(cell);
        if col < last {
            let width = widths.get(col).copied().unwrap_or(0);
            line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
            line.push_str(COLUMN_GAP);
        }
    }
    line
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
