//! Extraction of a symbol's block from the free-form live sheet.
//!
//! The live sheet has no header. Each symbol owns a block that starts at a
//! marker line such as `OPT_ACME` and runs until the next marker. Inside the
//! block, the phrases "Call Resistance", "Call Support", "Put Resistance" and
//! "Put Support" introduce sections whose rows are read positionally: call
//! sections on the left of the sheet, put sections on the right.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::baseline::ExtractError;
use crate::domain::{parse_number, LiveRow, RowSkip, Section, SkipReason, StrikeKey, Symbol};
use crate::reconcile::StrikeMaps;
use crate::workbook::SheetGrid;

/// Positions of the three cells read from a section row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOffsets {
    pub label: usize,
    pub previous_oi: usize,
    pub strike: usize,
}

impl ColumnOffsets {
    pub fn columns(self) -> [usize; 3] {
        [self.label, self.previous_oi, self.strike]
    }
}

/// Positional layout of the live sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveLayout {
    /// Text that opens every block marker, matched case-insensitively.
    pub marker_prefix: String,
    pub call: ColumnOffsets,
    pub put: ColumnOffsets,
    /// Rows narrower than this are skipped.
    pub min_row_width: usize,
}

impl Default for LiveLayout {
    fn default() -> Self {
        Self {
            marker_prefix: String::from("OPT"),
            call: ColumnOffsets {
                label: 0,
                previous_oi: 1,
                strike: 2,
            },
            put: ColumnOffsets {
                label: 6,
                previous_oi: 7,
                strike: 8,
            },
            min_row_width: 10,
        }
    }
}

impl LiveLayout {
    pub fn offsets(&self, section: Section) -> ColumnOffsets {
        if section.is_call() {
            self.call
        } else {
            self.put
        }
    }
}

/// Annotated rows of one live block plus the rows that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveExtraction {
    pub rows: Vec<LiveRow>,
    pub skipped: Vec<RowSkip>,
    /// Whether a block marker for the symbol was found at all.
    pub block_found: bool,
}

/// A live sheet with its rendered line texts.
#[derive(Debug, Clone)]
pub struct LiveSheet {
    grid: SheetGrid,
    lines: Vec<String>,
}

impl LiveSheet {
    pub fn new(grid: SheetGrid) -> Self {
        let lines = (0..grid.len()).map(|row| grid.line_text(row)).collect();
        Self { grid, lines }
    }

    pub fn grid(&self) -> &SheetGrid {
        &self.grid
    }

    pub fn name(&self) -> &str {
        self.grid.name()
    }
}

/// Block scanner for one [`LiveLayout`].
#[derive(Debug, Clone)]
pub struct LiveScanner {
    layout: LiveLayout,
    block_end: Regex,
}

impl LiveScanner {
    pub fn new(layout: LiveLayout) -> Result<Self, ExtractError> {
        let pattern = format!(
            r"(?i)^\s*{}[_\-\s]?[A-Za-z0-9]+",
            regex::escape(&layout.marker_prefix)
        );
        let block_end = compile(&pattern)?;
        Ok(Self { layout, block_end })
    }

    pub fn layout(&self) -> &LiveLayout {
        &self.layout
    }

    /// Extract and annotate the block of `symbol`.
    ///
    /// A sheet without a marker for the symbol yields an empty extraction.
    pub fn extract(
        &self,
        sheet: &LiveSheet,
        symbol: &Symbol,
        maps: &StrikeMaps,
    ) -> Result<LiveExtraction, ExtractError> {
        let start_pattern = format!(
            r"(?i)^\s*{}[_\-\s]*{}(?:$|[^A-Za-z0-9])",
            regex::escape(&self.layout.marker_prefix),
            regex::escape(symbol.as_str())
        );
        let block_start = compile(&start_pattern)?;

        let Some(start) = sheet.lines.iter().position(|line| block_start.is_match(line)) else {
            return Ok(LiveExtraction::default());
        };
        let end = (start + 1..sheet.lines.len())
            .find(|row| self.block_end.is_match(&sheet.lines[*row]))
            .unwrap_or(sheet.lines.len());

        // A repeated phrase moves the section to its last occurrence in the block.
        let mut markers: BTreeMap<Section, usize> = BTreeMap::new();
        for row in start..end {
            for section in Section::phrases_in(&sheet.lines[row]) {
                markers.insert(section, row);
            }
        }

        let mut extraction = LiveExtraction {
            block_found: true,
            ..LiveExtraction::default()
        };
        // BTreeMap iterates in `Section` declaration order, which is the output order.
        for (section, marker) in markers {
            for row in marker + 1..end {
                if sheet.grid.is_blank_row(row)
                    || Section::phrases_in(&sheet.lines[row]).next().is_some()
                {
                    break;
                }
                match self.read_row(sheet, row, section, symbol, maps) {
                    Ok(live_row) => extraction.rows.push(live_row),
                    Err(skip) => {
                        if !skip.is_silent() {
                            debug!(
                                symbol = %symbol,
                                row = skip.row,
                                reason = ?skip.reason,
                                "skipped live row"
                            );
                        }
                        extraction.skipped.push(skip);
                    }
                }
            }
        }

        Ok(extraction)
    }

    fn read_row(
        &self,
        sheet: &LiveSheet,
        row: usize,
        section: Section,
        symbol: &Symbol,
        maps: &StrikeMaps,
    ) -> Result<LiveRow, RowSkip> {
        let width = sheet.grid.row(row).len();
        if width < self.layout.min_row_width {
            return Err(RowSkip::new(
                row,
                SkipReason::TooNarrow {
                    width,
                    required: self.layout.min_row_width,
                },
            ));
        }

        let offsets = self.layout.offsets(section);
        let label = sheet.grid.cell(row, offsets.label);
        let previous_oi = sheet.grid.cell(row, offsets.previous_oi);
        let strike = sheet.grid.cell(row, offsets.strike);

        if label.is_empty() && previous_oi.is_empty() && strike.is_empty() {
            return Err(RowSkip::new(row, SkipReason::BlankRegion));
        }
        if strike.is_empty() {
            return Err(RowSkip::new(row, SkipReason::MissingStrike));
        }

        let previous_oi = parse_number(previous_oi).map_err(|error| {
            RowSkip::new(
                row,
                SkipReason::InvalidNumber {
                    field: "previous_oi",
                    value: error.value,
                },
            )
        })?;

        let strike_key = StrikeKey::normalize(strike);
        let (oi_difference, is_new_strike) = match maps.baseline_oi(section, &strike_key) {
            Some(baseline_oi) => (previous_oi.map(|previous| previous - baseline_oi), false),
            None => (None, true),
        };

        Ok(LiveRow {
            symbol: symbol.clone(),
            section,
            label: label.to_owned(),
            previous_oi,
            strike: strike.to_owned(),
            additional_strike: maps.additional_strike(&strike_key).map(str::to_owned),
            strike_key,
            oi_difference,
            is_new_strike,
        })
    }
}

/// Extract the block of `symbol` from `sheet` with a one-off scanner.
pub fn extract_live(
    sheet: &LiveSheet,
    symbol: &Symbol,
    maps: &StrikeMaps,
    layout: &LiveLayout,
) -> Result<LiveExtraction, ExtractError> {
    LiveScanner::new(layout.clone())?.extract(sheet, symbol, maps)
}

fn compile(pattern: &str) -> Result<Regex, ExtractError> {
    Regex::new(pattern).map_err(|error| ExtractError::InvalidMarker {
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BaselineRow;

    fn symbol(text: &str) -> Symbol {
        Symbol::parse(text).expect("symbol")
    }

    fn row(cells: [&str; 10]) -> Vec<&str> {
        cells.to_vec()
    }

    fn sheet(rows: Vec<Vec<&str>>) -> LiveSheet {
        LiveSheet::new(SheetGrid::from_rows("20.02.2026", rows))
    }

    fn baseline(category: &str, strike: &str, latest_oi: f64) -> BaselineRow {
        BaselineRow {
            symbol: symbol("ACME"),
            category: category.to_owned(),
            section: Section::from_category(category),
            strike: strike.to_owned(),
            strike_key: StrikeKey::normalize(strike),
            previous_oi: None,
            latest_oi: Some(latest_oi),
            call_oi_delta: None,
            put_oi_delta: None,
            last_traded_price: None,
            additional_strike: None,
            is_additional_strike: false,
        }
    }

    fn acme_block() -> Vec<Vec<&'static str>> {
        vec![
            row(["OPT_ACME", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "Put Resistance", "", "", ""]),
            row(["R1", "135000", "3000", "", "", "", "R1", "80000", "2800", ""]),
            row(["R2", "50000", "3100", "", "", "", "", "", "", ""]),
            row(["", "", "", "", "", "", "", "", "", ""]),
            row(["Call Support", "", "", "", "", "", "Put Support", "", "", ""]),
            row(["S1", "70,000", "2,900", "", "", "", "S1", "-", "2700", ""]),
            row(["OPT_ACMEX", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "", "", "", ""]),
            row(["R1", "1", "9999", "", "", "", "", "", "", ""]),
        ]
    }

    #[test]
    fn annotates_known_and_new_strikes() {
        let maps = StrikeMaps::from_baseline(&[
            baseline("Call Resistance", "3000", 120_000.0),
            baseline("Put Resistance", "2800", 90_000.0),
        ]);
        let extraction = extract_live(&sheet(acme_block()), &symbol("ACME"), &maps, &LiveLayout::default())
            .expect("extract");

        assert!(extraction.block_found);
        let summary: Vec<(Section, &str, Option<f64>, bool)> = extraction
            .rows
            .iter()
            .map(|row| (row.section, row.strike.as_str(), row.oi_difference, row.is_new_strike))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Section::CallResistance, "3000", Some(15_000.0), false),
                (Section::CallResistance, "3100", None, true),
                (Section::CallSupport, "2,900", None, true),
                (Section::PutResistance, "2800", Some(-10_000.0), false),
                (Section::PutSupport, "2700", None, true),
            ]
        );
    }

    #[test]
    fn block_stops_at_next_marker() {
        let maps = StrikeMaps::default();
        let extraction = extract_live(&sheet(acme_block()), &symbol("ACME"), &maps, &LiveLayout::default())
            .expect("extract");
        assert!(extraction.rows.iter().all(|row| row.strike != "9999"));
    }

    #[test]
    fn marker_requires_whole_symbol() {
        let rows = vec![
            row(["OPT LTF", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "", "", "", ""]),
            row(["R1", "10", "150", "", "", "", "", "", "", ""]),
        ];
        let extraction = extract_live(&sheet(rows), &symbol("LT"), &StrikeMaps::default(), &LiveLayout::default())
            .expect("extract");
        assert_eq!(extraction, LiveExtraction::default());
    }

    #[test]
    fn marker_with_suffix_opens_block() {
        let rows = vec![
            row(["OPT_ACME_FUT", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "", "", "", ""]),
            row(["R1", "10", "3000", "", "", "", "", "", "", ""]),
        ];
        let extraction = extract_live(&sheet(rows), &symbol("ACME"), &StrikeMaps::default(), &LiveLayout::default())
            .expect("extract");
        assert!(extraction.block_found);
        assert_eq!(extraction.rows.len(), 1);
        assert_eq!(extraction.rows[0].strike, "3000");
    }

    #[test]
    fn suffixed_marker_of_longer_symbol_is_ignored() {
        let rows = vec![
            row(["OPT_ACMEX_FUT", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "", "", "", ""]),
            row(["R1", "10", "3000", "", "", "", "", "", "", ""]),
        ];
        let extraction = extract_live(&sheet(rows), &symbol("ACME"), &StrikeMaps::default(), &LiveLayout::default())
            .expect("extract");
        assert!(!extraction.block_found);
    }

    #[test]
    fn repeated_section_phrase_reads_under_last_occurrence() {
        let rows = vec![
            row(["OPT ACME", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "", "", "", ""]),
            row(["", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "", "", "", ""]),
            row(["R1", "135000", "3000", "", "", "", "", "", "", ""]),
        ];
        let extraction = extract_live(&sheet(rows), &symbol("ACME"), &StrikeMaps::default(), &LiveLayout::default())
            .expect("extract");
        assert_eq!(extraction.rows.len(), 1);
        assert_eq!(extraction.rows[0].section, Section::CallResistance);
        assert_eq!(extraction.rows[0].strike, "3000");
    }

    #[test]
    fn section_body_ends_at_blank_line_inside_block() {
        let rows = vec![
            row(["OPT ACME", "", "", "", "", "", "", "", "", ""]),
            row(["Call Resistance", "", "", "", "", "", "", "", "", ""]),
            row(["R1", "135000", "3000", "", "", "", "", "", "", ""]),
            row(["", "", "", "", "", "", "", "", "", ""]),
            row(["R2", "50000", "3100", "", "", "", "", "", "", ""]),
            row(["Call Support", "", "", "", "", "", "", "", "", ""]),
            row(["S1", "70000", "2900", "", "", "", "", "", "", ""]),
        ];
        let extraction = extract_live(&sheet(rows), &symbol("ACME"), &StrikeMaps::default(), &LiveLayout::default())
            .expect("extract");
        let strikes: Vec<(Section, &str)> = extraction
            .rows
            .iter()
            .map(|row| (row.section, row.strike.as_str()))
            .collect();
        assert_eq!(
            strikes,
            vec![(Section::CallResistance, "3000"), (Section::CallSupport, "2900")]
        );
    }

    #[test]
    fn missing_block_is_empty_not_error() {
        let extraction = extract_live(
            &sheet(acme_block()),
            &symbol("ZZZZ"),
            &StrikeMaps::default(),
            &LiveLayout::default(),
        )
        .expect("extract");
        assert!(!extraction.block_found);
        assert!(extraction.rows.is_empty());
    }

    #[test]
    fn narrow_sheet_rows_are_skipped() {
        let rows = vec![
            vec!["OPT-ACME"],
            vec!["Call Resistance"],
            vec!["R1", "10", "3000"],
        ];
        let extraction = extract_live(&sheet(rows), &symbol("ACME"), &StrikeMaps::default(), &LiveLayout::default())
            .expect("extract");
        assert!(extraction.rows.is_empty());
        assert_eq!(
            extraction.skipped,
            vec![RowSkip::new(
                2,
                SkipReason::TooNarrow {
                    width: 3,
                    required: 10
                }
            )]
        );
    }

    #[test]
    fn blank_put_region_beside_call_row_is_silent() {
        let extraction = extract_live(
            &sheet(acme_block()),
            &symbol("ACME"),
            &StrikeMaps::default(),
            &LiveLayout::default(),
        )
        .expect("extract");
        assert_eq!(
            extraction.skipped,
            vec![RowSkip::new(3, SkipReason::BlankRegion)]
        );
    }

    #[test]
    fn additional_strike_is_carried_from_baseline() {
        let mut flagged = baseline("Call Resistance", "3,000", 120_000.0);
        flagged.additional_strike = Some(String::from("Yes"));
        let maps = StrikeMaps::from_baseline(&[flagged]);

        let extraction = extract_live(&sheet(acme_block()), &symbol("ACME"), &maps, &LiveLayout::default())
            .expect("extract");
        assert_eq!(extraction.rows[0].additional_strike.as_deref(), Some("Yes"));
        assert_eq!(extraction.rows[1].additional_strike, None);
    }

    #[test]
    fn custom_layout_moves_put_columns() {
        let layout = LiveLayout {
            put: ColumnOffsets {
                label: 3,
                previous_oi: 4,
                strike: 5,
            },
            min_row_width: 6,
            ..LiveLayout::default()
        };
        let rows = vec![
            vec!["OPT ACME", "", "", "", "", ""],
            vec!["", "", "", "Put Support", "", ""],
            vec!["", "", "", "S1", "500", "2500"],
        ];
        let extraction = extract_live(&sheet(rows), &symbol("ACME"), &StrikeMaps::default(), &layout)
            .expect("extract");
        assert_eq!(extraction.rows.len(), 1);
        assert_eq!(extraction.rows[0].section, Section::PutSupport);
        assert_eq!(extraction.rows[0].label, "S1");
    }
}
