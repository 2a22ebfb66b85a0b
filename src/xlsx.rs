//! Spreadsheet payload parsing.
//!
//! A spreadsheet binding is consumed as a rectangular grid of strings: the
//! first row of the first worksheet becomes the column names, every
//! following row becomes a data row, and every cell is stringified.

use std::io::Cursor;

use calamine::{Reader, Xlsx};

use crate::error::{FillError, Result};

/// A spreadsheet flattened to strings: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Parses the first worksheet of an `.xlsx` payload into a [`SheetTable`].
pub(crate) fn read_sheet_table(bytes: &[u8]) -> Result<SheetTable> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| FillError::Package(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FillError::Package("workbook has no worksheets".to_string()))?
        .map_err(|e| FillError::Package(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|cell| cell.to_string()).collect(),
        None => Vec::new(),
    };
    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    Ok(SheetTable { headers, rows })
}

/// Renders a grid as a pipe-delimited text table, for targets that can only
/// hold flat text (slide-deck text frames).
pub(crate) fn render_text_table(grid: &SheetTable) -> String {
    let mut out = String::new();
    push_row(&mut out, &grid.headers);
    let separator: Vec<String> = grid.headers.iter().map(|_| "---".to_string()).collect();
    push_row(&mut out, &separator);
    for row in &grid.rows {
        push_row(&mut out, row);
    }
    // Drop the trailing newline so the table slots into surrounding text.
    out.pop();
    out
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(cell);
        out.push_str(" |");
    }
    out.push('\n');
}
