use serde::Serialize;
use strikeboard_core::{
    EnvelopeError, PassOptions, PassReport, ReconciliationEngine, RunError, RunStatus,
    StrikeboardConfig, SymbolOutcome, SymbolStatus, Trigger, Warehouse,
};

use crate::cli::ProcessArgs;
use crate::error::CliError;

use super::{open_warehouse, parse_as_of, CommandResult};

/// User-facing view of a finished pass.
#[derive(Debug, Serialize)]
pub struct PassSummary {
    pub run_id: String,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub baseline_sheet: Option<String>,
    pub live_sheet: Option<String>,
    pub symbols_processed: usize,
    pub symbols_total: usize,
    pub new_strikes: usize,
    pub skipped_rows: usize,
    pub cleared_existing: bool,
    pub errors: Vec<RunError>,
    pub symbols: Vec<SymbolOutcome>,
}

impl PassSummary {
    pub fn new(report: &PassReport, cleared_existing: bool) -> Self {
        let run = &report.run;
        Self {
            run_id: run.run_id.clone(),
            trigger: run.trigger,
            status: run.status,
            baseline_sheet: run.baseline_sheet.clone(),
            live_sheet: run.live_sheet.clone(),
            symbols_processed: report.symbols_processed(),
            symbols_total: report.symbols_total(),
            new_strikes: run.outcomes.iter().map(|outcome| outcome.new_strikes).sum(),
            skipped_rows: run.outcomes.iter().map(|outcome| outcome.skipped_rows).sum(),
            cleared_existing,
            errors: run.errors.clone(),
            symbols: run
                .outcomes
                .iter()
                .filter(|outcome| outcome.status != SymbolStatus::NotFound)
                .cloned()
                .collect(),
        }
    }
}

pub async fn run(
    args: &ProcessArgs,
    config: &StrikeboardConfig,
) -> Result<CommandResult, CliError> {
    let target_date = parse_as_of(args.as_of.as_deref())?;
    let (symbols, trigger, clear_existing) = if args.symbols.is_empty() {
        (universe(config), Trigger::Manual, !args.keep_existing)
    } else {
        (args.symbols.clone(), Trigger::Single, false)
    };
    let options = PassOptions {
        target_date,
        clear_existing,
    };

    let engine = build_engine(config)?;
    let paths = config.workbook_paths();
    let report = tokio::task::spawn_blocking(move || {
        engine.run_files(&paths, &symbols, trigger, &options)
    })
    .await??;

    pass_result(&report, clear_existing)
}

pub fn build_engine(
    config: &StrikeboardConfig,
) -> Result<ReconciliationEngine<Warehouse>, CliError> {
    let warehouse = open_warehouse(config)?;
    Ok(ReconciliationEngine::new(
        warehouse,
        config.layout.clone(),
        config.workers,
    )?)
}

pub fn universe(config: &StrikeboardConfig) -> Vec<String> {
    config
        .symbols
        .iter()
        .map(|symbol| symbol.as_str().to_owned())
        .collect()
}

pub fn pass_result(report: &PassReport, cleared_existing: bool) -> Result<CommandResult, CliError> {
    let summary = PassSummary::new(report, cleared_existing);
    let errors = envelope_errors(report.errors())?;
    let mut result = CommandResult::ok(serde_json::to_value(&summary)?)
        .with_errors(errors)
        .with_latency(report.run.elapsed_ms());
    if summary.symbols_processed == 0 {
        result = result.with_warning("no requested symbol has rows in either workbook");
    }
    Ok(result)
}

fn envelope_errors(errors: &[RunError]) -> Result<Vec<EnvelopeError>, CliError> {
    errors
        .iter()
        .map(|error| {
            let envelope_error = match &error.symbol {
                Some(symbol) => EnvelopeError::new("symbol_failed", error.message.as_str())?
                    .with_symbol(symbol.as_str()),
                None => EnvelopeError::new("pass_error", error.message.as_str())?,
            };
            Ok(envelope_error)
        })
        .collect()
}
