//! Extraction of per-symbol rows from the structured baseline table.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    normalize_additional_strike, parse_number, BaselineRow, RowSkip, Section, SkipReason,
    StrikeKey, Symbol,
};
use crate::workbook::SheetGrid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("baseline sheet has no stock/symbol/name column (headers: {headers:?})")]
    SchemaMismatch { headers: Vec<String> },

    #[error("invalid live block marker pattern: {message}")]
    InvalidMarker { message: String },
}

/// Rows found for one symbol plus the rows that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaselineExtraction {
    pub rows: Vec<BaselineRow>,
    pub skipped: Vec<RowSkip>,
}

/// Column positions resolved from the baseline header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineSchema {
    header_row: usize,
    symbol: usize,
    category: Option<usize>,
    strike: Option<usize>,
    previous_oi: Option<usize>,
    latest_oi: Option<usize>,
    call_oi_delta: Option<usize>,
    put_oi_delta: Option<usize>,
    last_traded_price: Option<usize>,
    additional_strike: Option<usize>,
}

impl BaselineSchema {
    /// Resolve columns from the first non-blank row of `grid`.
    pub fn detect(grid: &SheetGrid) -> Result<Self, ExtractError> {
        let Some(header_row) = (0..grid.len()).find(|index| !grid.is_blank_row(*index)) else {
            return Err(ExtractError::SchemaMismatch {
                headers: Vec::new(),
            });
        };

        let headers: Vec<&str> = (0..grid.width())
            .map(|column| grid.cell(header_row, column))
            .collect();

        let symbol = headers.iter().position(|header| {
            let lowered = header.to_lowercase();
            ["stock", "symbol", "name"]
                .iter()
                .any(|keyword| lowered.contains(keyword))
        });
        let Some(symbol) = symbol else {
            return Err(ExtractError::SchemaMismatch {
                headers: headers
                    .iter()
                    .filter(|header| !header.is_empty())
                    .map(|header| (*header).to_owned())
                    .collect(),
            });
        };

        let normalized: Vec<String> = headers
            .iter()
            .map(|header| normalize_header(header))
            .collect();
        let column = |name: &str| normalized.iter().position(|header| header == name);

        Ok(Self {
            header_row,
            symbol,
            category: column("category"),
            strike: column("strike"),
            previous_oi: column("prevoi"),
            latest_oi: column("latestoi"),
            call_oi_delta: column("calloidifference"),
            put_oi_delta: column("putoidifference"),
            last_traded_price: column("ltp"),
            additional_strike: column("additionalstrike"),
        })
    }

    pub fn header_row(&self) -> usize {
        self.header_row
    }

    /// Every row below the header whose symbol cell names `symbol`.
    pub fn extract(&self, grid: &SheetGrid, symbol: &Symbol) -> BaselineExtraction {
        let mut extraction = BaselineExtraction::default();

        for row in self.header_row + 1..grid.len() {
            if !symbol.matches_cell(grid.cell(row, self.symbol)) {
                continue;
            }
            match self.read_row(grid, row, symbol) {
                Ok(parsed) => extraction.rows.push(parsed),
                Err(skip) => {
                    debug!(
                        symbol = %symbol,
                        row = skip.row,
                        reason = ?skip.reason,
                        "skipped baseline row"
                    );
                    extraction.skipped.push(skip);
                }
            }
        }

        extraction
    }

    fn read_row(
        &self,
        grid: &SheetGrid,
        row: usize,
        symbol: &Symbol,
    ) -> Result<BaselineRow, RowSkip> {
        let text = |column: Option<usize>| {
            column
                .map(|column| grid.cell(row, column))
                .unwrap_or("")
        };
        let number = |field: &'static str, column: Option<usize>| {
            parse_number(text(column)).map_err(|error| {
                RowSkip::new(
                    row,
                    SkipReason::InvalidNumber {
                        field,
                        value: error.value,
                    },
                )
            })
        };

        let strike = text(self.strike);
        if strike.is_empty() {
            return Err(RowSkip::new(row, SkipReason::MissingStrike));
        }

        let category = text(self.category);
        let additional_strike = normalize_additional_strike(text(self.additional_strike));

        Ok(BaselineRow {
            symbol: symbol.clone(),
            category: category.to_owned(),
            section: Section::from_category(category),
            strike: strike.to_owned(),
            strike_key: StrikeKey::normalize(strike),
            previous_oi: number("previous_oi", self.previous_oi)?,
            latest_oi: number("latest_oi", self.latest_oi)?,
            call_oi_delta: number("call_oi_delta", self.call_oi_delta)?,
            put_oi_delta: number("put_oi_delta", self.put_oi_delta)?,
            last_traded_price: number("last_traded_price", self.last_traded_price)?,
            is_additional_strike: additional_strike.as_deref() == Some("Yes"),
            additional_strike,
        })
    }
}

/// Extract every baseline row of `symbol` from `grid`.
///
/// A symbol with no rows yields an empty extraction, not an error.
pub fn extract_baseline(
    grid: &SheetGrid,
    symbol: &Symbol,
) -> Result<BaselineExtraction, ExtractError> {
    Ok(BaselineSchema::detect(grid)?.extract(grid, symbol))
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}
