//! The reconciliation pass.
//!
//! A pass loads the selected sheet of both workbooks once into an immutable
//! [`PassSnapshot`], reconciles every requested symbol on a bounded worker
//! pool, then persists the results sequentially, one replace-all write per
//! symbol. Nothing is written until every symbol has been reconciled.

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use time::Date;
use tracing::{debug, info, warn};

use crate::baseline::{BaselineSchema, ExtractError};
use crate::domain::Symbol;
use crate::live::{LiveLayout, LiveSheet};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::run::{ReconciliationRun, RunError, SymbolOutcome, SymbolStatus, Trigger};
use crate::sheet_selector::{select_sheet, SelectError};
use crate::sink::PersistenceSink;
use crate::workbook::{SheetGrid, WorkbookError, WorkbookKind, WorkbookSource, XlsxWorkbook};

/// Failures that abort a whole pass.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("{workbook} workbook: {source}")]
    Workbook {
        workbook: WorkbookKind,
        source: WorkbookError,
    },

    #[error("{workbook} workbook: {source}")]
    Select {
        workbook: WorkbookKind,
        source: SelectError,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Per-pass knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOptions {
    /// Pick the sheets closest to this date instead of the latest ones.
    pub target_date: Option<Date>,
    /// Drop every stored row before writing this pass's rows.
    pub clear_existing: bool,
}

/// Locations of the two workbook files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookPaths {
    pub baseline: PathBuf,
    pub live: PathBuf,
}

/// The selected sheets of both workbooks, shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct PassSnapshot {
    baseline: SheetGrid,
    schema: BaselineSchema,
    live: LiveSheet,
}

impl PassSnapshot {
    pub fn load(
        baseline: &mut dyn WorkbookSource,
        live: &mut dyn WorkbookSource,
        target_date: Option<Date>,
    ) -> Result<Self, PassError> {
        let baseline = load_sheet(baseline, WorkbookKind::Baseline, target_date)?;
        let live = load_sheet(live, WorkbookKind::Live, target_date)?;
        Self::from_grids(baseline, live)
    }

    /// Validate the baseline header once for the whole pass.
    pub fn from_grids(baseline: SheetGrid, live: SheetGrid) -> Result<Self, PassError> {
        let schema = BaselineSchema::detect(&baseline)?;
        Ok(Self {
            baseline,
            schema,
            live: LiveSheet::new(live),
        })
    }

    pub fn baseline_sheet(&self) -> &str {
        self.baseline.name()
    }

    pub fn live_sheet(&self) -> &str {
        self.live.name()
    }
}

fn load_sheet(
    workbook: &mut dyn WorkbookSource,
    kind: WorkbookKind,
    target_date: Option<Date>,
) -> Result<SheetGrid, PassError> {
    let names = workbook
        .sheet_names()
        .map_err(|source| PassError::Workbook {
            workbook: kind,
            source,
        })?;
    let name = select_sheet(&names, target_date).map_err(|source| PassError::Select {
        workbook: kind,
        source,
    })?;
    debug!(workbook = %kind, sheet = %name, "selected sheet");
    workbook.sheet(&name).map_err(|source| PassError::Workbook {
        workbook: kind,
        source,
    })
}

/// Outcome of a completed pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub run: ReconciliationRun,
    pub reconciliations: Vec<Reconciliation>,
}

impl PassReport {
    pub fn symbols_processed(&self) -> usize {
        self.run.symbols_with_data
    }

    pub fn symbols_total(&self) -> usize {
        self.run.symbols_requested
    }

    pub fn errors(&self) -> &[RunError] {
        &self.run.errors
    }
}

/// Runs reconciliation passes and hands their output to a sink.
pub struct ReconciliationEngine<S> {
    sink: S,
    reconciler: Reconciler,
    pool: rayon::ThreadPool,
}

impl<S: PersistenceSink> ReconciliationEngine<S> {
    pub fn new(sink: S, layout: LiveLayout, workers: usize) -> Result<Self, PassError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|index| format!("strikeboard-worker-{index}"))
            .build()?;
        Ok(Self {
            sink,
            reconciler: Reconciler::new(layout)?,
            pool,
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run a pass over the workbook files at `paths`.
    pub fn run_files<T>(
        &self,
        paths: &WorkbookPaths,
        symbols: &[T],
        trigger: Trigger,
        options: &PassOptions,
    ) -> Result<PassReport, PassError>
    where
        T: AsRef<str> + Sync,
    {
        self.execute(symbols, trigger, options, || {
            let mut baseline =
                XlsxWorkbook::open(&paths.baseline).map_err(|source| PassError::Workbook {
                    workbook: WorkbookKind::Baseline,
                    source,
                })?;
            let mut live = XlsxWorkbook::open(&paths.live).map_err(|source| PassError::Workbook {
                workbook: WorkbookKind::Live,
                source,
            })?;
            PassSnapshot::load(&mut baseline, &mut live, options.target_date)
        })
    }

    /// Run a pass over already opened workbooks.
    pub fn run_pass<T>(
        &self,
        baseline: &mut dyn WorkbookSource,
        live: &mut dyn WorkbookSource,
        symbols: &[T],
        trigger: Trigger,
        options: &PassOptions,
    ) -> Result<PassReport, PassError>
    where
        T: AsRef<str> + Sync,
    {
        self.execute(symbols, trigger, options, || {
            PassSnapshot::load(baseline, live, options.target_date)
        })
    }

    fn execute<T, F>(
        &self,
        symbols: &[T],
        trigger: Trigger,
        options: &PassOptions,
        load: F,
    ) -> Result<PassReport, PassError>
    where
        T: AsRef<str> + Sync,
        F: FnOnce() -> Result<PassSnapshot, PassError>,
    {
        let mut run = ReconciliationRun::start(trigger, symbols.len());
        info!(
            run_id = %run.run_id,
            trigger = %trigger,
            symbols = symbols.len(),
            "reconciliation pass started"
        );

        let snapshot = match load() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(run_id = %run.run_id, error = %error, "reconciliation pass aborted");
                run.fail(error.to_string());
                self.record(&run);
                return Err(error);
            }
        };

        Ok(self.reconcile_snapshot(run, &snapshot, symbols, options))
    }

    /// Reconcile and persist every symbol against a loaded snapshot.
    pub fn run_snapshot<T>(
        &self,
        snapshot: &PassSnapshot,
        symbols: &[T],
        trigger: Trigger,
        options: &PassOptions,
    ) -> PassReport
    where
        T: AsRef<str> + Sync,
    {
        let run = ReconciliationRun::start(trigger, symbols.len());
        self.reconcile_snapshot(run, snapshot, symbols, options)
    }

    fn reconcile_snapshot<T>(
        &self,
        mut run: ReconciliationRun,
        snapshot: &PassSnapshot,
        symbols: &[T],
        options: &PassOptions,
    ) -> PassReport
    where
        T: AsRef<str> + Sync,
    {
        let started = Instant::now();
        run.baseline_sheet = Some(snapshot.baseline_sheet().to_owned());
        run.live_sheet = Some(snapshot.live_sheet().to_owned());
        debug!(
            run_id = %run.run_id,
            baseline_sheet = snapshot.baseline_sheet(),
            live_sheet = snapshot.live_sheet(),
            "snapshot loaded"
        );

        let reconciler = &self.reconciler;
        let results: Vec<Result<Reconciliation, RunError>> = self.pool.install(|| {
            symbols
                .par_iter()
                .map(|requested| reconcile_symbol(reconciler, snapshot, requested.as_ref()))
                .collect()
        });

        if options.clear_existing {
            if let Err(error) = self.sink.clear(None) {
                warn!(run_id = %run.run_id, error = %error, "failed to clear stored rows");
                run.errors
                    .push(RunError::for_pass(format!("failed to clear stored rows: {error}")));
            }
        }

        let mut reconciliations = Vec::with_capacity(results.len());
        for (requested, result) in symbols.iter().zip(results) {
            match result {
                Ok(reconciliation) => {
                    let mut outcome = SymbolOutcome::from_reconciliation(&reconciliation);
                    if let Err(error) = self.sink.replace_symbol(
                        &reconciliation.symbol,
                        &run.run_id,
                        &reconciliation.baseline,
                        &reconciliation.live,
                    ) {
                        warn!(
                            run_id = %run.run_id,
                            symbol = %reconciliation.symbol,
                            error = %error,
                            "failed to persist symbol"
                        );
                        run.errors.push(RunError::for_symbol(
                            reconciliation.symbol.as_str(),
                            format!("failed to persist rows: {error}"),
                        ));
                        outcome.status = SymbolStatus::Failed;
                    }
                    debug!(
                        symbol = %outcome.symbol,
                        status = ?outcome.status,
                        baseline_rows = outcome.baseline_rows,
                        live_rows = outcome.live_rows,
                        new_strikes = outcome.new_strikes,
                        skipped_rows = outcome.skipped_rows,
                        "symbol reconciled"
                    );
                    run.outcomes.push(outcome);
                    reconciliations.push(reconciliation);
                }
                Err(error) => {
                    debug!(symbol = requested.as_ref(), error = %error.message, "symbol failed");
                    run.outcomes.push(SymbolOutcome::failed(requested.as_ref().trim()));
                    run.errors.push(error);
                }
            }
        }

        run.finish();
        info!(
            run_id = %run.run_id,
            symbols_with_data = run.symbols_with_data,
            symbols_total = run.symbols_requested,
            errors = run.errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reconciliation pass finished"
        );
        self.record(&run);

        PassReport {
            run,
            reconciliations,
        }
    }

    fn record(&self, run: &ReconciliationRun) {
        if let Err(error) = self.sink.record_run(run) {
            warn!(run_id = %run.run_id, error = %error, "failed to record pass");
        }
    }
}

fn reconcile_symbol(
    reconciler: &Reconciler,
    snapshot: &PassSnapshot,
    requested: &str,
) -> Result<Reconciliation, RunError> {
    let symbol = Symbol::parse(requested)
        .map_err(|error| RunError::for_symbol(requested.trim(), error.to_string()))?;
    let baseline = snapshot.schema.extract(&snapshot.baseline, &symbol);
    reconciler
        .reconcile(&symbol, baseline, &snapshot.live)
        .map_err(|error| RunError::for_symbol(symbol.as_str(), error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunStatus;
    use crate::sink::RecordingSink;
    use crate::workbook::MemoryWorkbook;

    fn baseline_workbook() -> MemoryWorkbook {
        MemoryWorkbook::new()
            .with_sheet(
                "19.02.2026",
                vec![
                    vec!["Stock", "Category", "Strike", "Latest_OI"],
                    vec!["ACME", "Call Resistance", "3000", "1"],
                ],
            )
            .with_sheet(
                "20.02.2026",
                vec![
                    vec!["Stock", "Category", "Strike", "Latest_OI"],
                    vec!["ACME", "Call Resistance", "3000", "120000"],
                ],
            )
    }

    fn live_workbook() -> MemoryWorkbook {
        let mut rows = vec![vec![""; 10]; 3];
        rows[0][0] = "OPT_ACME";
        rows[1][0] = "Call Resistance";
        rows[2][0] = "R1";
        rows[2][1] = "135000";
        rows[2][2] = "3000";
        MemoryWorkbook::new().with_sheet("20-Feb-2026", rows)
    }

    #[test]
    fn pass_uses_latest_sheets_and_persists() {
        let engine = ReconciliationEngine::new(RecordingSink::new(), LiveLayout::default(), 2)
            .expect("engine");
        let report = engine
            .run_pass(
                &mut baseline_workbook(),
                &mut live_workbook(),
                &["ACME"],
                Trigger::Manual,
                &PassOptions::default(),
            )
            .expect("pass");

        assert_eq!(report.run.baseline_sheet.as_deref(), Some("20.02.2026"));
        assert_eq!(report.symbols_processed(), 1);
        assert_eq!(report.reconciliations[0].live[0].oi_difference, Some(15_000.0));

        let symbol = Symbol::parse("ACME").expect("symbol");
        let (baseline, live) = engine.sink().stored(&symbol).expect("stored");
        assert_eq!(baseline.len(), 1);
        assert_eq!(live.len(), 1);
        assert_eq!(engine.sink().runs().len(), 1);
    }

    #[test]
    fn target_date_selects_older_baseline() {
        let engine = ReconciliationEngine::new(RecordingSink::new(), LiveLayout::default(), 1)
            .expect("engine");
        let options = PassOptions {
            target_date: Some(time::macros::date!(2026 - 02 - 19)),
            clear_existing: false,
        };
        let report = engine
            .run_pass(
                &mut baseline_workbook(),
                &mut live_workbook(),
                &["ACME"],
                Trigger::Manual,
                &options,
            )
            .expect("pass");

        assert_eq!(report.run.baseline_sheet.as_deref(), Some("19.02.2026"));
        assert_eq!(report.reconciliations[0].live[0].oi_difference, Some(134_999.0));
    }

    #[test]
    fn undated_workbook_fails_pass_and_is_recorded() {
        let engine = ReconciliationEngine::new(RecordingSink::new(), LiveLayout::default(), 1)
            .expect("engine");
        let mut live = MemoryWorkbook::new().with_sheet("Sheet1", vec![vec!["OPT_ACME"]]);

        let error = engine
            .run_pass(
                &mut baseline_workbook(),
                &mut live,
                &["ACME"],
                Trigger::Watch,
                &PassOptions::default(),
            )
            .expect_err("must fail");
        assert!(matches!(
            error,
            PassError::Select {
                workbook: WorkbookKind::Live,
                ..
            }
        ));

        let runs = engine.sink().runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert!(engine.sink().stored_symbols().is_empty());
    }

    #[test]
    fn invalid_symbols_are_reported_without_stopping_others() {
        let engine = ReconciliationEngine::new(RecordingSink::new(), LiveLayout::default(), 2)
            .expect("engine");
        let report = engine
            .run_pass(
                &mut baseline_workbook(),
                &mut live_workbook(),
                &["BAD$", "ACME"],
                Trigger::Single,
                &PassOptions::default(),
            )
            .expect("pass");

        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].symbol.as_deref(), Some("BAD$"));
        assert_eq!(report.run.outcomes[0].status, SymbolStatus::Failed);
        assert_eq!(report.run.outcomes[1].status, SymbolStatus::Reconciled);
    }

    #[test]
    fn missing_workbook_file_is_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ReconciliationEngine::new(RecordingSink::new(), LiveLayout::default(), 1)
            .expect("engine");
        let paths = WorkbookPaths {
            baseline: temp.path().join("Historical.xlsx"),
            live: temp.path().join("Live.xlsx"),
        };

        let error = engine
            .run_files(&paths, &["ACME"], Trigger::Manual, &PassOptions::default())
            .expect_err("must fail");
        assert!(matches!(
            error,
            PassError::Workbook {
                workbook: WorkbookKind::Baseline,
                source: WorkbookError::NotFound { .. },
            }
        ));
        assert_eq!(engine.sink().runs()[0].status, RunStatus::Failed);
    }
}
