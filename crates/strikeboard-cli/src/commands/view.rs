use strikeboard_core::{DashboardView, StrikeboardConfig, Symbol};

use crate::cli::{ViewArgs, ViewName};
use crate::error::CliError;

use super::{open_warehouse, CommandResult};

pub fn run(args: &ViewArgs, config: &StrikeboardConfig) -> Result<CommandResult, CliError> {
    let symbol = args.symbol.as_deref().map(Symbol::parse).transpose()?;
    let warehouse = open_warehouse(config)?;
    let result = warehouse.read_view(
        dashboard_view(args.view),
        symbol.as_ref().map(Symbol::as_str),
        args.max_rows,
    )?;

    let truncated = result.truncated;
    let row_count = result.row_count;
    let mut command_result = CommandResult::ok(serde_json::to_value(result)?);
    if truncated {
        command_result = command_result.with_warning(format!(
            "result truncated at {row_count} rows (use --max-rows to increase limit)"
        ));
    }

    Ok(command_result)
}

fn dashboard_view(name: ViewName) -> DashboardView {
    match name {
        ViewName::NewStrikes => DashboardView::NewStrikes,
        ViewName::Coverage => DashboardView::SymbolCoverage,
        ViewName::Passes => DashboardView::PassHistory,
    }
}
