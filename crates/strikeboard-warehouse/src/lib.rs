//! # Strikeboard Warehouse
//!
//! DuckDB-based store for reconciled open-interest rows.
//!
//! ## Overview
//!
//! The reconciliation engine hands every pass's output to this crate: the
//! baseline rows and annotated live rows of each symbol are replaced wholesale
//! in one transaction, and each pass leaves an audit record behind. Dashboards
//! and the CLI read the rows back per symbol or through the dashboard views.
//!
//! ### Features
//!
//! - **Replace-all writes**: a symbol's stored rows are superseded atomically
//! - **Parameterized SQL**: row values never reach the SQL text
//! - **Dashboard views**: fixed queries with a symbol filter and a row cap
//! - **Audit trail**: passes, per-symbol pass errors and file uploads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strikeboard_warehouse::{DashboardView, Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::new("strikeboard.duckdb"))?;
//!
//!     let result = warehouse.read_view(DashboardView::NewStrikes, Some("INFY"), 100)?;
//!
//!     println!("Found {} new strikes", result.row_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `baseline_rows` | Historical baseline rows per symbol |
//! | `live_rows` | Live rows annotated with OI difference and new-strike flag |
//! | `pass_log` | One record per reconciliation pass |
//! | `pass_errors` | Per-symbol errors of a pass |
//! | `upload_log` | Workbook replacements |
//!
//! ## Views
//!
//! | View | Description |
//! |------|-------------|
//! | `v_new_strikes` | Live rows flagged as new strikes |
//! | `v_symbol_coverage` | Row counts per symbol |
//! | `v_pass_history` | Passes, newest first |

pub mod duckdb;
pub mod migrations;
pub mod views;

use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::types::Value as DuckValue;
use ::duckdb::{params, Connection, ToSql};
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;

pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use views::DashboardView;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A view read asked for something the view cannot answer.
    #[error("invalid view request for {view}: {reason}")]
    InvalidViewRequest {
        view: DashboardView,
        reason: &'static str,
    },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            max_pool_size: 4,
        }
    }
}

/// Column metadata for query results.
#[derive(Debug, Clone, Serialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Rows read from a dashboard view.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    /// Whether more rows matched than `max_rows`.
    pub truncated: bool,
}

/// A stored baseline row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineRecord {
    pub symbol: String,
    pub category: String,
    /// Normalized section label, when the category text names one.
    pub section: Option<String>,
    pub strike: String,
    pub strike_key: String,
    pub previous_oi: Option<f64>,
    pub latest_oi: Option<f64>,
    pub call_oi_delta: Option<f64>,
    pub put_oi_delta: Option<f64>,
    pub last_traded_price: Option<f64>,
    pub additional_strike: Option<String>,
    pub is_additional_strike: bool,
}

/// A stored live row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveRecord {
    pub symbol: String,
    pub section: String,
    pub label: String,
    pub strike: String,
    pub strike_key: String,
    pub previous_oi: Option<f64>,
    pub oi_difference: Option<f64>,
    pub is_new_strike: bool,
    pub additional_strike: Option<String>,
}

/// Error entry attached to a pass record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassErrorRecord {
    pub symbol: Option<String>,
    pub message: String,
}

/// Audit record of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassRecord {
    pub run_id: String,
    pub trigger: String,
    pub status: String,
    /// RFC3339 UTC timestamp.
    pub started_at: String,
    /// RFC3339 UTC timestamp.
    pub finished_at: String,
    pub baseline_sheet: Option<String>,
    pub live_sheet: Option<String>,
    pub symbols_requested: u64,
    pub symbols_with_data: u64,
    pub message: Option<String>,
    pub errors: Vec<PassErrorRecord>,
}

/// Audit record of a workbook replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
    /// Which workbook was replaced (`baseline` or `live`).
    pub kind: String,
    /// File name as supplied by the uploader.
    pub file_name: String,
    /// Path the file was stored under.
    pub stored_as: String,
    pub size_bytes: u64,
    /// RFC3339 UTC timestamp.
    pub uploaded_at: String,
}

/// Counts removed by [`Warehouse::clear_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub baseline_rows: usize,
    pub live_rows: usize,
}

/// The store for reconciled rows and pass history.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = DuckDbConnectionManager::open(config.db_path, config.max_pool_size)?;
        let warehouse = Self { manager };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Initialize database schema and views.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Read up to `max_rows` rows of a dashboard view, optionally for one symbol.
    ///
    /// # Errors
    /// Returns [`WarehouseError::InvalidViewRequest`] when `max_rows` is zero or
    /// a symbol filter is given for a view without a symbol column.
    pub fn read_view(
        &self,
        view: DashboardView,
        symbol: Option<&str>,
        max_rows: usize,
    ) -> Result<QueryResult, WarehouseError> {
        if max_rows == 0 {
            return Err(WarehouseError::InvalidViewRequest {
                view,
                reason: "max rows must be greater than zero",
            });
        }
        if symbol.is_some() && !view.has_symbol_column() {
            return Err(WarehouseError::InvalidViewRequest {
                view,
                reason: "view has no symbol column",
            });
        }

        let filter = if symbol.is_some() { " WHERE symbol = ?" } else { "" };
        let sql = format!(
            "SELECT * FROM {}{filter} ORDER BY {} LIMIT {}",
            view.view_name(),
            view.order_by(),
            max_rows.saturating_add(1)
        );
        let bind: Vec<&dyn ToSql> = symbol.iter().map(|symbol| symbol as &dyn ToSql).collect();

        let connection = self.manager.acquire()?;
        read_limited(&connection, &sql, bind.as_slice(), max_rows)
    }

    /// Replace every stored row of `symbol` with the given rows.
    ///
    /// Deletion and insertion share one transaction, so readers see either the
    /// previous pass's rows or this pass's rows, never a mix.
    pub fn replace_symbol_rows(
        &self,
        symbol: &str,
        run_id: &str,
        baseline: &[BaselineRecord],
        live: &[LiveRecord],
    ) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            connection.execute("DELETE FROM baseline_rows WHERE symbol = ?", params![symbol])?;
            connection.execute("DELETE FROM live_rows WHERE symbol = ?", params![symbol])?;

            for (seq, row) in baseline.iter().enumerate() {
                let seq = seq as i64;
                let params: [&dyn ToSql; 14] = [
                    &symbol,
                    &seq,
                    &row.category,
                    &row.section,
                    &row.strike,
                    &row.strike_key,
                    &row.previous_oi,
                    &row.latest_oi,
                    &row.call_oi_delta,
                    &row.put_oi_delta,
                    &row.last_traded_price,
                    &row.additional_strike,
                    &row.is_additional_strike,
                    &run_id,
                ];
                connection.execute(
                    "INSERT INTO baseline_rows \
                     (symbol, seq, category, section, strike, strike_key, previous_oi, latest_oi, \
                      call_oi_delta, put_oi_delta, last_traded_price, additional_strike, \
                      is_additional_strike, run_id, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }

            for (seq, row) in live.iter().enumerate() {
                let seq = seq as i64;
                let params: [&dyn ToSql; 11] = [
                    &symbol,
                    &seq,
                    &row.section,
                    &row.label,
                    &row.strike,
                    &row.strike_key,
                    &row.previous_oi,
                    &row.oi_difference,
                    &row.is_new_strike,
                    &row.additional_strike,
                    &run_id,
                ];
                connection.execute(
                    "INSERT INTO live_rows \
                     (symbol, seq, section, label, strike, strike_key, previous_oi, oi_difference, \
                      is_new_strike, additional_strike, run_id, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }

            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Delete stored rows for one symbol, or for every symbol when `None`.
    pub fn clear_rows(&self, symbol: Option<&str>) -> Result<ClearReport, WarehouseError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<ClearReport, WarehouseError> {
            let (baseline_rows, live_rows) = match symbol {
                Some(symbol) => (
                    connection
                        .execute("DELETE FROM baseline_rows WHERE symbol = ?", params![symbol])?,
                    connection.execute("DELETE FROM live_rows WHERE symbol = ?", params![symbol])?,
                ),
                None => (
                    connection.execute("DELETE FROM baseline_rows", [])?,
                    connection.execute("DELETE FROM live_rows", [])?,
                ),
            };
            Ok(ClearReport {
                baseline_rows,
                live_rows,
            })
        })();

        finalize_transaction(&connection, result)
    }

    /// Append a pass record and its errors to the audit trail.
    pub fn record_pass(&self, record: &PassRecord) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            let symbols_requested = record.symbols_requested as i64;
            let symbols_with_data = record.symbols_with_data as i64;
            let error_count = record.errors.len() as i64;
            let params: [&dyn ToSql; 11] = [
                &record.run_id,
                &record.trigger,
                &record.status,
                &record.started_at,
                &record.finished_at,
                &record.baseline_sheet,
                &record.live_sheet,
                &symbols_requested,
                &symbols_with_data,
                &error_count,
                &record.message,
            ];
            connection.execute(
                "INSERT INTO pass_log \
                 (run_id, trigger, status, started_at, finished_at, baseline_sheet, live_sheet, \
                  symbols_requested, symbols_with_data, error_count, message, recorded_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                params.as_slice(),
            )?;

            for error in &record.errors {
                let params: [&dyn ToSql; 3] = [&record.run_id, &error.symbol, &error.message];
                connection.execute(
                    "INSERT INTO pass_errors (run_id, symbol, message) VALUES (?, ?, ?)",
                    params.as_slice(),
                )?;
            }

            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Append a workbook replacement to the audit trail.
    pub fn record_upload(&self, record: &UploadRecord) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        let size_bytes = record.size_bytes as i64;
        let params: [&dyn ToSql; 5] = [
            &record.kind,
            &record.file_name,
            &record.stored_as,
            &size_bytes,
            &record.uploaded_at,
        ];
        connection.execute(
            "INSERT INTO upload_log (kind, file_name, stored_as, size_bytes, uploaded_at) \
             VALUES (?, ?, ?, ?, ?)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// Symbols with at least one stored row, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol FROM baseline_rows \
             UNION \
             SELECT symbol FROM live_rows \
             ORDER BY symbol",
        )?;
        let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
        let mut symbols = Vec::new();
        for symbol in rows {
            symbols.push(symbol?);
        }
        Ok(symbols)
    }

    /// Stored baseline rows of `symbol` in extraction order.
    pub fn baseline_rows(&self, symbol: &str) -> Result<Vec<BaselineRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol, category, section, strike, strike_key, previous_oi, latest_oi, \
                    call_oi_delta, put_oi_delta, last_traded_price, additional_strike, \
                    is_additional_strike \
             FROM baseline_rows WHERE symbol = ? ORDER BY seq",
        )?;
        let rows = statement.query_map(params![symbol], |row| {
            Ok(BaselineRecord {
                symbol: row.get(0)?,
                category: row.get(1)?,
                section: row.get(2)?,
                strike: row.get(3)?,
                strike_key: row.get(4)?,
                previous_oi: row.get(5)?,
                latest_oi: row.get(6)?,
                call_oi_delta: row.get(7)?,
                put_oi_delta: row.get(8)?,
                last_traded_price: row.get(9)?,
                additional_strike: row.get(10)?,
                is_additional_strike: row.get(11)?,
            })
        })?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Stored live rows of `symbol` in extraction order.
    pub fn live_rows(&self, symbol: &str) -> Result<Vec<LiveRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol, section, label, strike, strike_key, previous_oi, oi_difference, \
                    is_new_strike, additional_strike \
             FROM live_rows WHERE symbol = ? ORDER BY seq",
        )?;
        let rows = statement.query_map(params![symbol], |row| {
            Ok(LiveRecord {
                symbol: row.get(0)?,
                section: row.get(1)?,
                label: row.get(2)?,
                strike: row.get(3)?,
                strike_key: row.get(4)?,
                previous_oi: row.get(5)?,
                oi_difference: row.get(6)?,
                is_new_strike: row.get(7)?,
                additional_strike: row.get(8)?,
            })
        })?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// The most recently started pass, with its errors.
    pub fn last_pass(&self) -> Result<Option<PassRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT run_id, trigger, status, started_at, finished_at, baseline_sheet, live_sheet, \
                    symbols_requested, symbols_with_data, message \
             FROM pass_log ORDER BY started_at DESC, recorded_at DESC LIMIT 1",
        )?;
        let mut rows = statement.query_map([], |row| {
            let symbols_requested: i64 = row.get(7)?;
            let symbols_with_data: i64 = row.get(8)?;
            Ok(PassRecord {
                run_id: row.get(0)?,
                trigger: row.get(1)?,
                status: row.get(2)?,
                started_at: row.get(3)?,
                finished_at: row.get(4)?,
                baseline_sheet: row.get(5)?,
                live_sheet: row.get(6)?,
                symbols_requested: symbols_requested.max(0) as u64,
                symbols_with_data: symbols_with_data.max(0) as u64,
                message: row.get(9)?,
                errors: Vec::new(),
            })
        })?;

        let Some(record) = rows.next() else {
            return Ok(None);
        };
        let mut record = record?;
        record.errors = pass_errors(&connection, record.run_id.as_str())?;
        Ok(Some(record))
    }

    /// The latest `limit` uploads, newest first.
    pub fn recent_uploads(&self, limit: usize) -> Result<Vec<UploadRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let limit = limit.min(i64::MAX as usize) as i64;
        let mut statement = connection.prepare(
            "SELECT kind, file_name, stored_as, size_bytes, uploaded_at \
             FROM upload_log ORDER BY uploaded_at DESC LIMIT ?",
        )?;
        let rows = statement.query_map(params![limit], |row| {
            let size_bytes: i64 = row.get(3)?;
            Ok(UploadRecord {
                kind: row.get(0)?,
                file_name: row.get(1)?,
                stored_as: row.get(2)?,
                size_bytes: size_bytes.max(0) as u64,
                uploaded_at: row.get(4)?,
            })
        })?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

fn pass_errors(
    connection: &Connection,
    run_id: &str,
) -> Result<Vec<PassErrorRecord>, WarehouseError> {
    let mut statement =
        connection.prepare("SELECT symbol, message FROM pass_errors WHERE run_id = ?")?;
    let rows = statement.query_map(params![run_id], |row| {
        Ok(PassErrorRecord {
            symbol: row.get(0)?,
            message: row.get(1)?,
        })
    })?;
    let mut errors = Vec::new();
    for error in rows {
        errors.push(error?);
    }
    Ok(errors)
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn read_limited(
    connection: &Connection,
    sql: &str,
    bind: &[&dyn ToSql],
    max_rows: usize,
) -> Result<QueryResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    let _ = statement.query(bind)?;

    // Column metadata is only available once the statement has executed.
    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement
            .column_name(index)
            .map(|name| name.to_string())
            .unwrap_or_else(|_| format!("column_{index}"));
        columns.push(SqlColumn {
            name,
            r#type: statement.column_type(index).to_string(),
        });
    }

    let mut cursor = statement.query(bind)?;
    let mut rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = cursor.next()? {
        if rows.len() == max_rows {
            truncated = true;
            break;
        }
        rows.push(read_row(row, column_count)?);
    }

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

fn read_row(row: &::duckdb::Row<'_>, column_count: usize) -> Result<Vec<Value>, ::duckdb::Error> {
    let mut output = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value: DuckValue = row.get(index)?;
        output.push(to_json_value(value));
    }
    Ok(output)
}

fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(value as f64),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Text(value) => Value::String(value),
        DuckValue::Blob(value) => Value::String(hex::encode(value)),
        other => Value::String(format!("{other:?}")),
    }
}

fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_warehouse(temp: &tempfile::TempDir) -> Warehouse {
        Warehouse::open(WarehouseConfig {
            db_path: temp.path().join("store").join("strikeboard.duckdb"),
            max_pool_size: 2,
        })
        .expect("warehouse open")
    }

    fn baseline(symbol: &str, strike: &str, latest_oi: f64) -> BaselineRecord {
        BaselineRecord {
            symbol: symbol.to_string(),
            category: "Call Resistance".to_string(),
            section: Some("Call Resistance".to_string()),
            strike: strike.to_string(),
            strike_key: strike.to_string(),
            previous_oi: Some(100_000.0),
            latest_oi: Some(latest_oi),
            call_oi_delta: None,
            put_oi_delta: None,
            last_traded_price: Some(2950.5),
            additional_strike: None,
            is_additional_strike: false,
        }
    }

    fn live(symbol: &str, strike: &str, is_new_strike: bool) -> LiveRecord {
        LiveRecord {
            symbol: symbol.to_string(),
            section: "Call Resistance".to_string(),
            label: "R1".to_string(),
            strike: strike.to_string(),
            strike_key: strike.to_string(),
            previous_oi: Some(135_000.0),
            oi_difference: if is_new_strike { None } else { Some(15_000.0) },
            is_new_strike,
            additional_strike: None,
        }
    }

    #[test]
    fn initializes_every_dashboard_view() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);

        for view in DashboardView::ALL {
            let result = warehouse.read_view(view, None, 10).expect("view");
            assert_eq!(result.row_count, 0, "{view} starts empty");
            assert!(!result.columns.is_empty());
        }
    }

    #[test]
    fn view_read_rejects_zero_rows_and_unsupported_symbol_filter() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);

        let error = warehouse
            .read_view(DashboardView::NewStrikes, None, 0)
            .expect_err("zero rows");
        assert!(matches!(error, WarehouseError::InvalidViewRequest { .. }));

        let error = warehouse
            .read_view(DashboardView::PassHistory, Some("ACME"), 10)
            .expect_err("no symbol column");
        assert!(matches!(
            error,
            WarehouseError::InvalidViewRequest {
                view: DashboardView::PassHistory,
                ..
            }
        ));
    }

    #[test]
    fn replace_supersedes_previous_rows_of_the_same_symbol_only() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);

        warehouse
            .replace_symbol_rows(
                "ACME",
                "run-1",
                &[baseline("ACME", "3000", 120_000.0), baseline("ACME", "3100", 90_000.0)],
                &[live("ACME", "3000", false)],
            )
            .expect("first replace");
        warehouse
            .replace_symbol_rows("INFY", "run-1", &[baseline("INFY", "1500", 10.0)], &[])
            .expect("other symbol");
        warehouse
            .replace_symbol_rows(
                "ACME",
                "run-2",
                &[baseline("ACME", "3200", 80_000.0)],
                &[live("ACME", "3300", true)],
            )
            .expect("second replace");

        let acme = warehouse.baseline_rows("ACME").expect("acme rows");
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].strike, "3200");

        let acme_live = warehouse.live_rows("ACME").expect("acme live");
        assert_eq!(acme_live.len(), 1);
        assert!(acme_live[0].is_new_strike);
        assert_eq!(acme_live[0].oi_difference, None);

        assert_eq!(warehouse.baseline_rows("INFY").expect("infy").len(), 1);
        assert_eq!(
            warehouse.list_symbols().expect("symbols"),
            vec!["ACME".to_string(), "INFY".to_string()]
        );
    }

    #[test]
    fn rows_read_back_in_extraction_order() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);

        let rows: Vec<BaselineRecord> = ["3300", "3000", "3100"]
            .iter()
            .map(|strike| baseline("ACME", strike, 1.0))
            .collect();
        warehouse
            .replace_symbol_rows("ACME", "run-1", &rows, &[])
            .expect("replace");

        let strikes: Vec<String> = warehouse
            .baseline_rows("ACME")
            .expect("rows")
            .into_iter()
            .map(|row| row.strike)
            .collect();
        assert_eq!(strikes, vec!["3300", "3000", "3100"]);
    }

    #[test]
    fn symbol_values_are_bound_as_parameters() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);

        let dangerous_symbol = r#"ACME'; DROP TABLE live_rows; --"#;
        warehouse
            .replace_symbol_rows(dangerous_symbol, "run-1", &[], &[live(dangerous_symbol, "3000", true)])
            .expect("replace should succeed with parameterized queries");

        let stored = warehouse.live_rows(dangerous_symbol).expect("live rows");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].symbol, dangerous_symbol);
    }

    #[test]
    fn clear_rows_for_one_symbol_keeps_others() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        warehouse
            .replace_symbol_rows("ACME", "run-1", &[baseline("ACME", "3000", 1.0)], &[live("ACME", "3000", false)])
            .expect("acme");
        warehouse
            .replace_symbol_rows("INFY", "run-1", &[baseline("INFY", "1500", 1.0)], &[])
            .expect("infy");

        let report = warehouse.clear_rows(Some("ACME")).expect("clear");
        assert_eq!(report, ClearReport { baseline_rows: 1, live_rows: 1 });
        assert_eq!(warehouse.list_symbols().expect("symbols"), vec!["INFY".to_string()]);

        warehouse.clear_rows(None).expect("clear all");
        assert!(warehouse.list_symbols().expect("symbols").is_empty());
    }

    #[test]
    fn last_pass_returns_newest_record_with_errors() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        assert!(warehouse.last_pass().expect("empty").is_none());

        let mut record = PassRecord {
            run_id: "run-1".to_string(),
            trigger: "manual".to_string(),
            status: "completed".to_string(),
            started_at: "2026-02-20T09:15:00Z".to_string(),
            finished_at: "2026-02-20T09:15:02Z".to_string(),
            baseline_sheet: Some("19.02.2026".to_string()),
            live_sheet: Some("20.02.2026".to_string()),
            symbols_requested: 3,
            symbols_with_data: 2,
            message: None,
            errors: Vec::new(),
        };
        warehouse.record_pass(&record).expect("first pass");

        record.run_id = "run-2".to_string();
        record.started_at = "2026-02-20T09:16:00Z".to_string();
        record.errors = vec![PassErrorRecord {
            symbol: Some("BAD$".to_string()),
            message: "invalid symbol".to_string(),
        }];
        warehouse.record_pass(&record).expect("second pass");

        let last = warehouse.last_pass().expect("query").expect("some pass");
        assert_eq!(last.run_id, "run-2");
        assert_eq!(last.errors.len(), 1);
        assert_eq!(last.errors[0].symbol.as_deref(), Some("BAD$"));
    }

    #[test]
    fn recent_uploads_are_newest_first() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);

        for (kind, uploaded_at) in [("baseline", "2026-02-20T08:00:00Z"), ("live", "2026-02-20T09:00:00Z")] {
            warehouse
                .record_upload(&UploadRecord {
                    kind: kind.to_string(),
                    file_name: format!("{kind}.xlsx"),
                    stored_as: format!("/data/{kind}.xlsx"),
                    size_bytes: 2048,
                    uploaded_at: uploaded_at.to_string(),
                })
                .expect("record upload");
        }

        let uploads = warehouse.recent_uploads(1).expect("uploads");
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].kind, "live");
    }

    #[test]
    fn coverage_view_counts_new_strikes() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        warehouse
            .replace_symbol_rows(
                "ACME",
                "run-1",
                &[baseline("ACME", "3000", 1.0)],
                &[live("ACME", "3000", false), live("ACME", "3100", true)],
            )
            .expect("replace");

        let result = warehouse
            .read_view(DashboardView::SymbolCoverage, Some("ACME"), 10)
            .expect("coverage");
        let names: Vec<&str> = result.columns.iter().map(|column| column.name.as_str()).collect();
        assert_eq!(names, vec!["symbol", "baseline_rows", "live_rows", "new_strikes"]);
        assert_eq!(
            result.rows[0],
            vec![
                Value::String(String::from("ACME")),
                Value::Number(Number::from(1)),
                Value::Number(Number::from(2)),
                Value::Number(Number::from(1)),
            ]
        );
    }
}
