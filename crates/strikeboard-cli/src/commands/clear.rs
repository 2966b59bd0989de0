use serde::Serialize;
use strikeboard_core::{ClearReport, StrikeboardConfig, Symbol};

use crate::cli::ClearArgs;
use crate::error::CliError;

use super::{open_warehouse, CommandResult};

#[derive(Debug, Serialize)]
struct ClearData {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<Symbol>,
    removed: ClearReport,
}

pub fn run(args: &ClearArgs, config: &StrikeboardConfig) -> Result<CommandResult, CliError> {
    let symbol = args.symbol.as_deref().map(Symbol::parse).transpose()?;
    let warehouse = open_warehouse(config)?;
    let removed = warehouse.clear_rows(symbol.as_ref().map(Symbol::as_str))?;
    tracing::info!(
        symbol = symbol.as_ref().map(Symbol::as_str),
        baseline_rows = removed.baseline_rows,
        live_rows = removed.live_rows,
        "stored rows cleared"
    );

    Ok(CommandResult::ok(serde_json::to_value(ClearData { symbol, removed })?))
}
