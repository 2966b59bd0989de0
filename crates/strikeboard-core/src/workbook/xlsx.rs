use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};

use crate::workbook::{SheetGrid, WorkbookError, WorkbookSource};

/// Spreadsheet file read through `calamine`.
///
/// The whole file is read into memory on open. The format is sniffed from the
/// content, so an `.xls` upload stored under an `.xlsx` name still opens.
pub struct XlsxWorkbook {
    path: PathBuf,
    workbook: Sheets<Cursor<Vec<u8>>>,
}

impl XlsxWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WorkbookError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(WorkbookError::NotFound { path });
        }

        let bytes = fs::read(&path).map_err(|error| WorkbookError::Open {
            path: path.clone(),
            message: error.to_string(),
        })?;
        let workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|error| {
            WorkbookError::Open {
                path: path.clone(),
                message: error.to_string(),
            }
        })?;

        Ok(Self { path, workbook })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkbookSource for XlsxWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>, WorkbookError> {
        Ok(self.workbook.sheet_names())
    }

    fn sheet(&mut self, name: &str) -> Result<SheetGrid, WorkbookError> {
        if !self.workbook.sheet_names().iter().any(|sheet| sheet == name) {
            return Err(WorkbookError::SheetMissing {
                sheet: name.to_owned(),
            });
        }

        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|error| WorkbookError::Read {
                sheet: name.to_owned(),
                message: error.to_string(),
            })?;

        let (start_row, start_column) = range
            .start()
            .map(|(row, column)| (row as usize, column as usize))
            .unwrap_or((0, 0));

        let mut rows = vec![Vec::new(); start_row];
        for cells in range.rows() {
            let mut row = vec![String::new(); start_column];
            row.extend(cells.iter().map(cell_text));
            rows.push(row);
        }

        Ok(SheetGrid::new(name, rows))
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{value:.0}")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_reported() {
        let temp = tempdir().expect("tempdir");
        let error = XlsxWorkbook::open(temp.path().join("Historical.xlsx"))
            .err()
            .expect("must fail");
        assert!(matches!(error, WorkbookError::NotFound { .. }));
    }

    #[test]
    fn non_spreadsheet_content_fails_to_open() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("Live.xlsx");
        std::fs::write(&path, b"not a workbook").expect("write");

        let error = XlsxWorkbook::open(&path).err().expect("must fail");
        assert!(matches!(error, WorkbookError::Open { .. }));
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(cell_text(&Data::Float(3000.0)), "3000");
        assert_eq!(cell_text(&Data::Float(1102.5)), "1102.5");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
