use serde::Serialize;

use crate::domain::{Section, StrikeKey, Symbol};

/// One row of the historical baseline table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineRow {
    pub symbol: Symbol,
    /// Category text as found in the sheet.
    pub category: String,
    pub section: Option<Section>,
    /// Strike text as found in the sheet.
    pub strike: String,
    pub strike_key: StrikeKey,
    pub previous_oi: Option<f64>,
    pub latest_oi: Option<f64>,
    pub call_oi_delta: Option<f64>,
    pub put_oi_delta: Option<f64>,
    pub last_traded_price: Option<f64>,
    pub additional_strike: Option<String>,
    pub is_additional_strike: bool,
}

/// One strike/level row of a live block, annotated against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveRow {
    pub symbol: Symbol,
    pub section: Section,
    pub label: String,
    pub previous_oi: Option<f64>,
    pub strike: String,
    pub strike_key: StrikeKey,
    /// `previous_oi - baseline latest OI`, absent for new strikes.
    pub oi_difference: Option<f64>,
    pub is_new_strike: bool,
    pub additional_strike: Option<String>,
}

/// Why a sheet row produced no output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingStrike,
    InvalidNumber { field: &'static str, value: String },
    BlankRegion,
    TooNarrow { width: usize, required: usize },
}

/// A skipped sheet row and the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowSkip {
    /// Zero-based sheet row index.
    pub row: usize,
    pub reason: SkipReason,
}

impl RowSkip {
    pub fn new(row: usize, reason: SkipReason) -> Self {
        Self { row, reason }
    }

    /// Blank regions are layout filler rather than data problems.
    pub fn is_silent(&self) -> bool {
        matches!(self.reason, SkipReason::BlankRegion)
    }
}

/// Normalize an additional-strike marker: affirmative spellings become `"Yes"`,
/// other non-blank text is kept verbatim.
pub fn normalize_additional_strike(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "yes" | "y" | "1" | "true" => Some(String::from("Yes")),
        _ => Some(trimmed.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_affirmative_markers() {
        assert_eq!(normalize_additional_strike(" y "), Some(String::from("Yes")));
        assert_eq!(normalize_additional_strike("TRUE"), Some(String::from("Yes")));
        assert_eq!(
            normalize_additional_strike("Hedge"),
            Some(String::from("Hedge"))
        );
        assert_eq!(normalize_additional_strike(""), None);
    }
}
