use serde::Serialize;
use strikeboard_core::StrikeboardConfig;

use crate::error::CliError;

use super::process::universe;
use super::{open_warehouse, CommandResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum SymbolSource {
    Store,
    Config,
}

#[derive(Debug, Serialize)]
struct StocksData {
    source: SymbolSource,
    count: usize,
    symbols: Vec<String>,
}

pub fn run(config: &StrikeboardConfig) -> Result<CommandResult, CliError> {
    let warehouse = open_warehouse(config)?;
    let stored = warehouse.list_symbols()?;

    if stored.is_empty() {
        let symbols = universe(config);
        let data = StocksData {
            source: SymbolSource::Config,
            count: symbols.len(),
            symbols,
        };
        return Ok(CommandResult::ok(serde_json::to_value(data)?)
            .with_warning("store is empty; listing the configured symbol universe"));
    }

    let data = StocksData {
        source: SymbolSource::Store,
        count: stored.len(),
        symbols: stored,
    };
    Ok(CommandResult::ok(serde_json::to_value(data)?))
}
