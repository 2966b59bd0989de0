//! Database views for dashboard queries.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use ::duckdb::Connection;

/// A dashboard view that can be read back through [`crate::Warehouse::read_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    NewStrikes,
    SymbolCoverage,
    PassHistory,
}

impl DashboardView {
    pub const ALL: [Self; 3] = [Self::NewStrikes, Self::SymbolCoverage, Self::PassHistory];

    pub fn view_name(self) -> &'static str {
        match self {
            Self::NewStrikes => "v_new_strikes",
            Self::SymbolCoverage => "v_symbol_coverage",
            Self::PassHistory => "v_pass_history",
        }
    }

    /// Whether rows of this view can be narrowed to one symbol.
    pub fn has_symbol_column(self) -> bool {
        !matches!(self, Self::PassHistory)
    }

    pub(crate) fn order_by(self) -> &'static str {
        match self {
            Self::NewStrikes => "symbol, section, strike",
            Self::SymbolCoverage => "symbol",
            Self::PassHistory => "started_at DESC",
        }
    }
}

impl Display for DashboardView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.view_name())
    }
}

impl FromStr for DashboardView {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|view| view.view_name() == wanted || view.view_name()[2..] == wanted)
            .ok_or_else(|| format!("unknown dashboard view '{input}'"))
    }
}

/// Create database views over the reconciled rows and audit trail.
///
/// Creates the following views:
/// - `v_new_strikes`: live rows whose strike has no baseline counterpart
/// - `v_symbol_coverage`: baseline/live row counts per symbol
/// - `v_pass_history`: passes newest first with their error counts
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW v_new_strikes AS
SELECT
    symbol,
    section,
    label,
    strike,
    previous_oi,
    additional_strike
FROM live_rows
WHERE is_new_strike;

CREATE OR REPLACE VIEW v_symbol_coverage AS
WITH baseline AS (
    SELECT symbol, COUNT(*) AS baseline_rows FROM baseline_rows GROUP BY symbol
),
live AS (
    SELECT
        symbol,
        COUNT(*) AS live_rows,
        COUNT(*) FILTER (WHERE is_new_strike) AS new_strikes
    FROM live_rows
    GROUP BY symbol
)
SELECT
    COALESCE(baseline.symbol, live.symbol) AS symbol,
    COALESCE(baseline.baseline_rows, 0) AS baseline_rows,
    COALESCE(live.live_rows, 0) AS live_rows,
    COALESCE(live.new_strikes, 0) AS new_strikes
FROM baseline
FULL OUTER JOIN live ON baseline.symbol = live.symbol;

CREATE OR REPLACE VIEW v_pass_history AS
SELECT
    run_id,
    trigger,
    status,
    started_at,
    finished_at,
    symbols_requested,
    symbols_with_data,
    error_count,
    message
FROM pass_log
ORDER BY started_at DESC;
",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_parse_with_or_without_prefix() {
        assert_eq!("v_new_strikes".parse::<DashboardView>(), Ok(DashboardView::NewStrikes));
        assert_eq!("symbol_coverage".parse::<DashboardView>(), Ok(DashboardView::SymbolCoverage));
        assert_eq!("PASS_HISTORY".parse::<DashboardView>(), Ok(DashboardView::PassHistory));
        assert!("baseline_rows".parse::<DashboardView>().is_err());
    }
}
