//! Workbook access.
//!
//! The engine reads spreadsheets only through [`WorkbookSource`], so tests can
//! hand it synthetic [`MemoryWorkbook`] grids while production reads files
//! through [`XlsxWorkbook`].

mod memory;
mod xlsx;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryWorkbook;
pub use xlsx::XlsxWorkbook;

/// Which of the two input workbooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkbookKind {
    Baseline,
    Live,
}

impl WorkbookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Live => "live",
        }
    }
}

impl Display for WorkbookKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures while opening or reading a workbook.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("workbook not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to open workbook {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("sheet '{sheet}' does not exist")]
    SheetMissing { sheet: String },

    #[error("failed to read sheet '{sheet}': {message}")]
    Read { sheet: String, message: String },
}

/// A readable spreadsheet.
pub trait WorkbookSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Result<Vec<String>, WorkbookError>;

    /// Load one sheet as a grid of cell text.
    fn sheet(&mut self, name: &str) -> Result<SheetGrid, WorkbookError>;
}

/// An immutable sheet rendered as trimmed-on-read cell text.
///
/// Cell coordinates are absolute: row `0` column `0` is the sheet's `A1` even
/// when the stored range starts further in. Every row is padded to the sheet's
/// width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetGrid {
    name: String,
    rows: Vec<Vec<String>>,
    width: usize,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self {
            name: name.into(),
            rows,
            width,
        }
    }

    /// Build a grid from string slices.
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, index: usize) -> &[String] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Trimmed cell text; out-of-range cells read as blank.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.row(row)
            .get(column)
            .map(|cell| cell.trim())
            .unwrap_or("")
    }

    pub fn is_blank_row(&self, index: usize) -> bool {
        self.row(index).iter().all(|cell| cell.trim().is_empty())
    }

    /// The row's non-blank trimmed cells joined by single spaces.
    pub fn line_text(&self, index: usize) -> String {
        self.row(index)
            .iter()
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_rows_to_sheet_width() {
        let grid = SheetGrid::from_rows("s", vec![vec!["a"], vec!["b", "c", "d"]]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.row(0).len(), 3);
        assert_eq!(grid.cell(0, 2), "");
        assert_eq!(grid.cell(9, 9), "");
    }

    #[test]
    fn renders_line_text_without_blanks() {
        let grid = SheetGrid::from_rows("s", vec![vec![" OPT ", "", "ACME  ", " "]]);
        assert_eq!(grid.line_text(0), "OPT ACME");
        assert!(!grid.is_blank_row(0));
    }
}
