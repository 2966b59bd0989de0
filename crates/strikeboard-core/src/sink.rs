//! Where reconciled rows and pass records go.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use strikeboard_warehouse::{
    BaselineRecord, LiveRecord, PassErrorRecord, PassRecord, Warehouse, WarehouseError,
};
use thiserror::Error;

use crate::domain::{BaselineRow, LiveRow, Symbol};
use crate::run::ReconciliationRun;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error("sink rejected write: {message}")]
    Rejected { message: String },
}

/// Persistence for reconciled rows and the pass audit trail.
pub trait PersistenceSink {
    /// Replace every stored row of `symbol` in one transaction.
    fn replace_symbol(
        &self,
        symbol: &Symbol,
        run_id: &str,
        baseline: &[BaselineRow],
        live: &[LiveRow],
    ) -> Result<(), SinkError>;

    /// Remove stored rows for `symbol`, or for all symbols.
    fn clear(&self, symbol: Option<&Symbol>) -> Result<(), SinkError>;

    fn record_run(&self, run: &ReconciliationRun) -> Result<(), SinkError>;
}

impl<S: PersistenceSink + ?Sized> PersistenceSink for &S {
    fn replace_symbol(
        &self,
        symbol: &Symbol,
        run_id: &str,
        baseline: &[BaselineRow],
        live: &[LiveRow],
    ) -> Result<(), SinkError> {
        (**self).replace_symbol(symbol, run_id, baseline, live)
    }

    fn clear(&self, symbol: Option<&Symbol>) -> Result<(), SinkError> {
        (**self).clear(symbol)
    }

    fn record_run(&self, run: &ReconciliationRun) -> Result<(), SinkError> {
        (**self).record_run(run)
    }
}

impl PersistenceSink for Warehouse {
    fn replace_symbol(
        &self,
        symbol: &Symbol,
        run_id: &str,
        baseline: &[BaselineRow],
        live: &[LiveRow],
    ) -> Result<(), SinkError> {
        let baseline: Vec<BaselineRecord> = baseline.iter().map(baseline_record).collect();
        let live: Vec<LiveRecord> = live.iter().map(live_record).collect();
        self.replace_symbol_rows(symbol.as_str(), run_id, &baseline, &live)?;
        Ok(())
    }

    fn clear(&self, symbol: Option<&Symbol>) -> Result<(), SinkError> {
        self.clear_rows(symbol.map(Symbol::as_str))?;
        Ok(())
    }

    fn record_run(&self, run: &ReconciliationRun) -> Result<(), SinkError> {
        self.record_pass(&pass_record(run))?;
        Ok(())
    }
}

pub fn baseline_record(row: &BaselineRow) -> BaselineRecord {
    BaselineRecord {
        symbol: row.symbol.to_string(),
        category: row.category.clone(),
        section: row.section.map(|section| section.label().to_owned()),
        strike: row.strike.clone(),
        strike_key: row.strike_key.to_string(),
        previous_oi: row.previous_oi,
        latest_oi: row.latest_oi,
        call_oi_delta: row.call_oi_delta,
        put_oi_delta: row.put_oi_delta,
        last_traded_price: row.last_traded_price,
        additional_strike: row.additional_strike.clone(),
        is_additional_strike: row.is_additional_strike,
    }
}

pub fn live_record(row: &LiveRow) -> LiveRecord {
    LiveRecord {
        symbol: row.symbol.to_string(),
        section: row.section.label().to_owned(),
        label: row.label.clone(),
        strike: row.strike.clone(),
        strike_key: row.strike_key.to_string(),
        previous_oi: row.previous_oi,
        oi_difference: row.oi_difference,
        is_new_strike: row.is_new_strike,
        additional_strike: row.additional_strike.clone(),
    }
}

pub fn pass_record(run: &ReconciliationRun) -> PassRecord {
    PassRecord {
        run_id: run.run_id.clone(),
        trigger: run.trigger.as_str().to_owned(),
        status: run.status.as_str().to_owned(),
        started_at: run.started_at.format_rfc3339(),
        finished_at: run.finished_at.format_rfc3339(),
        baseline_sheet: run.baseline_sheet.clone(),
        live_sheet: run.live_sheet.clone(),
        symbols_requested: run.symbols_requested as u64,
        symbols_with_data: run.symbols_with_data as u64,
        message: run.message.clone(),
        errors: run
            .errors
            .iter()
            .map(|error| PassErrorRecord {
                symbol: error.symbol.clone(),
                message: error.message.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    rows: BTreeMap<Symbol, (Vec<BaselineRow>, Vec<LiveRow>)>,
    runs: Vec<ReconciliationRun>,
    clears: usize,
}

/// In-memory sink that keeps what it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    state: Mutex<RecordingState>,
    failing: HashSet<Symbol>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes for `symbol`.
    pub fn failing_on(mut self, symbol: Symbol) -> Self {
        self.failing.insert(symbol);
        self
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn stored(&self, symbol: &Symbol) -> Option<(Vec<BaselineRow>, Vec<LiveRow>)> {
        self.state().rows.get(symbol).cloned()
    }

    pub fn stored_symbols(&self) -> Vec<Symbol> {
        self.state().rows.keys().cloned().collect()
    }

    pub fn runs(&self) -> Vec<ReconciliationRun> {
        self.state().runs.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.state().clears
    }
}

impl PersistenceSink for RecordingSink {
    fn replace_symbol(
        &self,
        symbol: &Symbol,
        _run_id: &str,
        baseline: &[BaselineRow],
        live: &[LiveRow],
    ) -> Result<(), SinkError> {
        if self.failing.contains(symbol) {
            return Err(SinkError::Rejected {
                message: format!("writes for {symbol} are disabled"),
            });
        }
        let mut state = self.state();
        if baseline.is_empty() && live.is_empty() {
            state.rows.remove(symbol);
        } else {
            state
                .rows
                .insert(symbol.clone(), (baseline.to_vec(), live.to_vec()));
        }
        Ok(())
    }

    fn clear(&self, symbol: Option<&Symbol>) -> Result<(), SinkError> {
        let mut state = self.state();
        match symbol {
            Some(symbol) => {
                state.rows.remove(symbol);
            }
            None => state.rows.clear(),
        }
        state.clears += 1;
        Ok(())
    }

    fn record_run(&self, run: &ReconciliationRun) -> Result<(), SinkError> {
        self.state().runs.push(run.clone());
        Ok(())
    }
}
