use std::fs;
use std::path::Path;

use serde::Serialize;
use strikeboard_core::{PassRecord, StrikeboardConfig, UploadRecord};

use crate::error::CliError;

use super::{open_warehouse, CommandResult};

const RECENT_UPLOADS: usize = 5;

#[derive(Debug, Serialize)]
struct WorkbookFile {
    path: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
}

impl WorkbookFile {
    fn probe(path: &Path) -> Self {
        let size_bytes = fs::metadata(path)
            .ok()
            .filter(|metadata| metadata.is_file())
            .map(|metadata| metadata.len());
        Self {
            path: path.display().to_string(),
            exists: size_bytes.is_some(),
            size_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusData {
    db_path: String,
    stored_symbols: usize,
    baseline_workbook: WorkbookFile,
    live_workbook: WorkbookFile,
    last_pass: Option<PassRecord>,
    recent_uploads: Vec<UploadRecord>,
}

pub fn run(config: &StrikeboardConfig) -> Result<CommandResult, CliError> {
    let warehouse = open_warehouse(config)?;
    let paths = config.workbook_paths();
    let data = StatusData {
        db_path: warehouse.db_path().display().to_string(),
        stored_symbols: warehouse.list_symbols()?.len(),
        baseline_workbook: WorkbookFile::probe(&paths.baseline),
        live_workbook: WorkbookFile::probe(&paths.live),
        last_pass: warehouse.last_pass()?,
        recent_uploads: warehouse.recent_uploads(RECENT_UPLOADS)?,
    };

    let mut warnings = Vec::new();
    for workbook in [&data.baseline_workbook, &data.live_workbook] {
        if !workbook.exists {
            warnings.push(format!("workbook {} is missing", workbook.path));
        }
    }
    if let Some(pass) = &data.last_pass {
        if pass.status == "failed" {
            warnings.push(format!(
                "last pass {} failed: {}",
                pass.run_id,
                pass.message.as_deref().unwrap_or("no message recorded")
            ));
        }
    }

    Ok(CommandResult::ok(serde_json::to_value(data)?).with_warnings(warnings))
}
