//! Audit record of a reconciliation pass.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::UtcDateTime;
use crate::reconcile::Reconciliation;
use crate::ValidationError;

/// What started a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Full pass requested by an operator.
    Manual,
    /// Pass following a workbook upload.
    Upload,
    /// Scheduled pass from the watch loop.
    Watch,
    /// Pass over explicitly named symbols.
    Single,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Upload => "upload",
            Self::Watch => "watch",
            Self::Single => "single",
        }
    }
}

impl Display for Trigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "upload" => Ok(Self::Upload),
            "watch" => Ok(Self::Watch),
            "single" => Ok(Self::Single),
            _ => Err(ValidationError::InvalidTrigger {
                value: value.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolStatus {
    Reconciled,
    NotFound,
    Failed,
}

/// Per-symbol result counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolOutcome {
    /// Normalized symbol, or the requested text when it did not parse.
    pub symbol: String,
    pub status: SymbolStatus,
    pub baseline_rows: usize,
    pub live_rows: usize,
    pub new_strikes: usize,
    pub skipped_rows: usize,
}

impl SymbolOutcome {
    pub fn from_reconciliation(reconciliation: &Reconciliation) -> Self {
        Self {
            symbol: reconciliation.symbol.to_string(),
            status: if reconciliation.has_data() {
                SymbolStatus::Reconciled
            } else {
                SymbolStatus::NotFound
            },
            baseline_rows: reconciliation.baseline.len(),
            live_rows: reconciliation.live.len(),
            new_strikes: reconciliation.new_strike_count(),
            skipped_rows: reconciliation
                .skipped
                .iter()
                .filter(|skip| !skip.is_silent())
                .count(),
        }
    }

    pub fn failed(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            status: SymbolStatus::Failed,
            baseline_rows: 0,
            live_rows: 0,
            new_strikes: 0,
            skipped_rows: 0,
        }
    }
}

/// An error attached to a pass; symbol-less errors concern the whole pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub message: String,
}

impl RunError {
    pub fn for_symbol(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            message: message.into(),
        }
    }

    pub fn for_pass(message: impl Into<String>) -> Self {
        Self {
            symbol: None,
            message: message.into(),
        }
    }
}

/// One reconciliation pass as recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRun {
    pub run_id: String,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub started_at: UtcDateTime,
    pub finished_at: UtcDateTime,
    pub baseline_sheet: Option<String>,
    pub live_sheet: Option<String>,
    pub symbols_requested: usize,
    pub symbols_with_data: usize,
    pub outcomes: Vec<SymbolOutcome>,
    pub errors: Vec<RunError>,
    /// Reason a failed pass was abandoned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReconciliationRun {
    pub fn start(trigger: Trigger, symbols_requested: usize) -> Self {
        let now = UtcDateTime::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            trigger,
            status: RunStatus::Completed,
            started_at: now,
            finished_at: now,
            baseline_sheet: None,
            live_sheet: None,
            symbols_requested,
            symbols_with_data: 0,
            outcomes: Vec::new(),
            errors: Vec::new(),
            message: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = UtcDateTime::now();
        self.symbols_with_data = self
            .outcomes
            .iter()
            .filter(|outcome| outcome.status == SymbolStatus::Reconciled)
            .count();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.message = Some(message.into());
        self.finish();
    }

    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = self.finished_at.into_inner() - self.started_at.into_inner();
        elapsed.whole_milliseconds().clamp(0, i128::from(u64::MAX)) as u64
    }
}
