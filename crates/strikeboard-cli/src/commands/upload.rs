use serde::Serialize;
use serde_json::Value;
use strikeboard_core::{
    store_workbook, PassOptions, StoredUpload, StrikeboardConfig, Trigger, WorkbookKind,
};

use crate::cli::UploadArgs;
use crate::error::CliError;

use super::process::{build_engine, pass_result, universe};
use super::{open_warehouse, CommandResult};

#[derive(Debug, Serialize)]
struct UploadData {
    uploads: Vec<StoredUpload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass: Option<Value>,
}

pub async fn run(args: &UploadArgs, config: &StrikeboardConfig) -> Result<CommandResult, CliError> {
    let requested = [
        (WorkbookKind::Baseline, args.baseline.as_deref(), &config.baseline_file),
        (WorkbookKind::Live, args.live.as_deref(), &config.live_file),
    ];

    let warehouse = open_warehouse(config)?;
    let mut uploads = Vec::new();
    for (kind, source, target_name) in requested {
        let Some(source) = source else {
            continue;
        };
        let stored = store_workbook(kind, source, &config.data_dir, target_name)?;
        warehouse.record_upload(&stored.to_record())?;
        uploads.push(stored);
    }

    if args.no_process {
        let data = UploadData {
            uploads,
            pass: None,
        };
        return Ok(CommandResult::ok(serde_json::to_value(data)?));
    }

    let engine = build_engine(config)?;
    let paths = config.workbook_paths();
    let symbols = universe(config);
    let options = PassOptions {
        target_date: None,
        clear_existing: true,
    };
    let report = tokio::task::spawn_blocking(move || {
        engine.run_files(&paths, &symbols, Trigger::Upload, &options)
    })
    .await??;

    let pass = pass_result(&report, true)?;
    let data = UploadData {
        uploads,
        pass: Some(pass.data),
    };
    Ok(CommandResult::ok(serde_json::to_value(data)?)
        .with_warnings(pass.warnings)
        .with_errors(pass.errors))
}
