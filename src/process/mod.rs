// src/process/mod.rs
pub mod aggregate;
pub mod columns;
pub mod rank;
pub mod utils;

use crate::error::LoadResult;
use crate::fetch::Fetcher;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names from the first line: unquoted, trimmed and lowercased.
    pub headers: Vec<String>,
    /// Data rows, each padded with empty cells up to the header width.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Cell at `col` in `row`, or `""` when the column is absent or the row is short.
    pub fn cell<'a>(&self, row: &'a [String], col: Option<usize>) -> &'a str {
        col.and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Parse CSV text into a `RawTable`.
///
/// A leading byte-order mark is dropped, blank lines are skipped, the first
/// remaining line is the header row, and commas inside double quotes never
/// split a cell.
pub fn parse_csv(text: &str) -> RawTable {
    let mut lines = text
        .strip_prefix('\u{feff}')
        .unwrap_or(text)
        .trim()
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.is_empty());

    let headers: Vec<String> = match lines.next() {
        Some(line) => utils::split_line(line)
            .into_iter()
            .map(|h| utils::clean_str(h).to_lowercase())
            .collect(),
        None => return RawTable::default(),
    };

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        let mut row: Vec<String> = utils::split_line(line)
            .into_iter()
            .map(utils::clean_str)
            .collect();
        if row.len() < headers.len() {
            debug!(
                row = idx + 1,
                cells = row.len(),
                expected = headers.len(),
                "short row padded with empty cells"
            );
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }

    RawTable { headers, rows }
}

/// Fetch `path` through `fetcher` and parse it as CSV.
#[instrument(level = "debug", skip(fetcher))]
pub async fn load_csv(fetcher: &Fetcher, path: &str) -> LoadResult<RawTable> {
    let text = fetcher.fetch_text(path).await?;
    let table = parse_csv(&text);
    debug!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "parsed csv"
    );
    Ok(table)
}
