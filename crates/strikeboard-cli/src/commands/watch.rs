use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use strikeboard_core::{PassOptions, StrikeboardConfig, Trigger};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::cli::WatchArgs;
use crate::error::CliError;

use super::process::{build_engine, universe};
use super::CommandResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum StopReason {
    Interrupted,
    MaxPasses,
}

#[derive(Debug, Default, Serialize)]
struct WatchData {
    passes: u64,
    failed_passes: u64,
    symbol_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_run_id: Option<String>,
    stopped: Option<StopReason>,
}

pub async fn run(args: &WatchArgs, config: &StrikeboardConfig) -> Result<CommandResult, CliError> {
    let schedule = config.watch_schedule()?;
    let engine = Arc::new(build_engine(config)?);
    let paths = Arc::new(config.workbook_paths());
    let symbols = Arc::new(universe(config));
    let options = PassOptions {
        target_date: None,
        clear_existing: true,
    };

    info!(
        symbols = symbols.len(),
        interval_secs = schedule.interval().as_secs(),
        "watch loop started"
    );

    let mut data = WatchData::default();
    let mut warnings = Vec::new();
    loop {
        let now = OffsetDateTime::now_utc();
        let delay = if schedule.is_open(now) {
            let started = Instant::now();
            let engine = Arc::clone(&engine);
            let paths = Arc::clone(&paths);
            let symbols = Arc::clone(&symbols);
            let options = options.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                engine.run_files(&paths, symbols.as_slice(), Trigger::Watch, &options)
            })
            .await?;

            data.passes += 1;
            match outcome {
                Ok(report) => {
                    data.symbol_errors += report.errors().len();
                    data.last_run_id = Some(report.run.run_id);
                    schedule.next_delay(OffsetDateTime::now_utc(), started.elapsed())
                }
                Err(error) => {
                    data.failed_passes += 1;
                    warn!(error = %error, "scheduled pass failed");
                    warnings.push(format!("pass {} failed: {error}", data.passes));
                    schedule.error_delay()
                }
            }
        } else {
            schedule.next_delay(now, Duration::ZERO)
        };

        if args.max_passes.is_some_and(|max| data.passes >= max) {
            data.stopped = Some(StopReason::MaxPasses);
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            signal = tokio::signal::ctrl_c() => {
                signal?;
                data.stopped = Some(StopReason::Interrupted);
                break;
            }
        }
    }

    info!(
        passes = data.passes,
        failed_passes = data.failed_passes,
        "watch loop stopped"
    );
    Ok(CommandResult::ok(serde_json::to_value(data)?).with_warnings(warnings))
}
