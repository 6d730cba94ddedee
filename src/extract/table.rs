//! Markdown pipe-table extraction

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One data row keyed by column header
pub type TableRow = BTreeMap<String, String>;

/// First valid table found in a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownTable {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Data rows skipped because their cell count differed from the header
    pub dropped: usize,
}

impl MarkdownTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Find the first `header / separator / rows` block in `text`.
///
/// Leading and trailing pipes are optional and prose around the table is
/// ignored. A header without a separator line directly beneath it is not a
/// table, and neither is a header row that is blank or repeats a column name.
/// Rows whose cell count differs from the header are dropped. When no table
/// is found the result is empty.
pub fn extract_table(text: &str) -> MarkdownTable {
    let lines: Vec<&str> = text.lines().collect();

    for start in 0..lines.len().saturating_sub(1) {
        let Some(headers) = split_row(lines[start]) else {
            continue;
        };
        let Some(separator) = split_row(lines[start + 1]) else {
            continue;
        };
        if separator.len() != headers.len() || !separator.iter().all(|c| is_separator_cell(c)) {
            continue;
        }
        if !usable_headers(&headers) {
            warn!("Skipping table with blank or repeated headers: {:?}", headers);
            continue;
        }

        let mut table = MarkdownTable {
            headers,
            ..Default::default()
        };

        for (offset, line) in lines[start + 2..].iter().enumerate() {
            let Some(cells) = split_row(line) else {
                break;
            };
            if cells.len() != table.headers.len() {
                warn!(
                    "Dropping table row {}: {} cells, expected {}",
                    offset + 1,
                    cells.len(),
                    table.headers.len()
                );
                table.dropped += 1;
                continue;
            }
            table
                .rows
                .push(table.headers.iter().cloned().zip(cells).collect());
        }

        debug!(
            "Extracted table with {} columns, {} rows ({} dropped)",
            table.headers.len(),
            table.rows.len(),
            table.dropped
        );
        return table;
    }

    MarkdownTable::default()
}

/// Split a table line into trimmed cells; `None` if the line has no pipe.
/// `\|` is kept as a literal pipe inside a cell.
fn split_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.contains('|') {
        return None;
    }

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);

    if trimmed.starts_with('|') {
        cells.remove(0);
    }
    if trimmed.ends_with('|') && !trimmed.ends_with("\\|") && !cells.is_empty() {
        cells.pop();
    }

    Some(cells.into_iter().map(|c| c.trim().to_string()).collect())
}

/// At least one named column and no name used twice
fn usable_headers(headers: &[String]) -> bool {
    let mut seen = BTreeSet::new();
    headers.iter().any(|h| !h.is_empty()) && headers.iter().all(|h| seen.insert(h.as_str()))
}

fn is_separator_cell(cell: &str) -> bool {
    let inner = cell.trim_start_matches(':').trim_end_matches(':');
    !inner.is_empty() && inner.chars().all(|c| c == '-')
}
