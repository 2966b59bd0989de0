use crate::workbook::{SheetGrid, WorkbookError, WorkbookSource};

/// In-memory workbook of synthetic grids.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<SheetGrid>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(mut self, grid: SheetGrid) -> Self {
        self.sheets.push(grid);
        self
    }

    pub fn with_sheet<R, C>(self, name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.with_grid(SheetGrid::from_rows(name, rows))
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>, WorkbookError> {
        Ok(self
            .sheets
            .iter()
            .map(|sheet| sheet.name().to_owned())
            .collect())
    }

    fn sheet(&mut self, name: &str) -> Result<SheetGrid, WorkbookError> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name() == name)
            .cloned()
            .ok_or_else(|| WorkbookError::SheetMissing {
                sheet: name.to_owned(),
            })
    }
}
