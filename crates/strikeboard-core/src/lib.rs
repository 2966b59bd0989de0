//! Core of strikeboard: open-interest reconciliation between a historical
//! baseline workbook and a live snapshot workbook.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Workbook access and date-based sheet selection
//! - Baseline and live-block extraction, and the per-symbol reconciler
//! - The pass engine with its persistence seam and audit record
//! - Configuration, watch scheduling, uploads and the response envelope

pub mod baseline;
pub mod config;
pub mod domain;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod favorites;
pub mod live;
pub mod reconcile;
pub mod run;
pub mod schedule;
pub mod sheet_selector;
pub mod sink;
pub mod upload;
pub mod workbook;

pub use baseline::{extract_baseline, BaselineExtraction, BaselineSchema, ExtractError};
pub use config::{ConfigError, StrikeboardConfig};
pub use domain::{
    format_oi, parse_number, BaselineRow, LiveRow, RowSkip, Section, SkipReason, StrikeKey,
    Symbol, UtcDateTime,
};
pub use engine::{
    PassError, PassOptions, PassReport, PassSnapshot, ReconciliationEngine, WorkbookPaths,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::ValidationError;
pub use favorites::{read_favorites, Favorites};
pub use live::{extract_live, ColumnOffsets, LiveExtraction, LiveLayout, LiveScanner, LiveSheet};
pub use reconcile::{reconcile, Reconciler, Reconciliation, StrikeMaps};
pub use run::{ReconciliationRun, RunError, RunStatus, SymbolOutcome, SymbolStatus, Trigger};
pub use schedule::{WatchSchedule, WatchSettings};
pub use sheet_selector::{parse_sheet_date, select_sheet, SelectError};
pub use sink::{PersistenceSink, RecordingSink, SinkError};
pub use strikeboard_warehouse::{
    BaselineRecord, ClearReport, DashboardView, LiveRecord, PassErrorRecord, PassRecord,
    QueryResult, SqlColumn, UploadRecord, Warehouse, WarehouseConfig, WarehouseError,
};
pub use upload::{store_workbook, StoredUpload, UploadError};
pub use workbook::{
    MemoryWorkbook, SheetGrid, WorkbookError, WorkbookKind, WorkbookSource, XlsxWorkbook,
};
