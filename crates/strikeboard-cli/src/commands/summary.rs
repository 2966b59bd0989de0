use serde::Serialize;
use serde_json::Value;
use strikeboard_core::{format_oi, BaselineRecord, LiveRecord, StrikeboardConfig, Symbol};

use crate::cli::{OutputFormat, SummaryArgs};
use crate::error::CliError;

use super::{open_warehouse, CommandResult};

const OI_FIELDS: &[&str] = &[
    "previous_oi",
    "latest_oi",
    "call_oi_delta",
    "put_oi_delta",
    "oi_difference",
];

#[derive(Debug, Serialize)]
struct SummaryData {
    symbol: Symbol,
    baseline_count: usize,
    live_count: usize,
    new_strikes: usize,
    baseline: Vec<BaselineRecord>,
    live: Vec<LiveRecord>,
}

pub fn run(
    args: &SummaryArgs,
    config: &StrikeboardConfig,
    format: OutputFormat,
) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let warehouse = open_warehouse(config)?;
    let baseline = warehouse.baseline_rows(symbol.as_str())?;
    let live = warehouse.live_rows(symbol.as_str())?;

    let data = SummaryData {
        baseline_count: baseline.len(),
        live_count: live.len(),
        new_strikes: live.iter().filter(|row| row.is_new_strike).count(),
        symbol,
        baseline,
        live,
    };
    let is_empty = data.baseline_count == 0 && data.live_count == 0;
    let warning = format!("no stored rows for {}", data.symbol);

    let mut value = serde_json::to_value(&data)?;
    if format == OutputFormat::Table {
        for section in ["baseline", "live"] {
            if let Some(Value::Array(rows)) = value.get_mut(section) {
                rows.iter_mut().for_each(format_oi_fields);
            }
        }
    }

    let mut result = CommandResult::ok(value);
    if is_empty {
        result = result.with_warning(warning);
    }
    Ok(result)
}

/// Replace numeric OI figures with thousands-separated text.
fn format_oi_fields(row: &mut Value) {
    let Value::Object(fields) = row else {
        return;
    };
    for name in OI_FIELDS {
        if let Some(field) = fields.get_mut(*name) {
            if let Some(number) = field.as_f64() {
                *field = Value::String(format_oi(number));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn oi_fields_are_formatted_in_place() {
        let mut row = json!({
            "strike": "3000",
            "previous_oi": 135000.0,
            "oi_difference": -15000.0,
            "latest_oi": null
        });
        format_oi_fields(&mut row);

        assert_eq!(row["previous_oi"], format_oi(135_000.0));
        assert_eq!(row["oi_difference"], format_oi(-15_000.0));
        assert_eq!(row["latest_oi"], Value::Null);
        assert_eq!(row["strike"], "3000");
    }
}
