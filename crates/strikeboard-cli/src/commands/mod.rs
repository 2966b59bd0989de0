mod clear;
mod favorites;
mod process;
mod status;
mod stocks;
mod summary;
mod upload;
mod view;
mod watch;

use std::time::Instant;

use serde_json::Value;
use strikeboard_core::{
    parse_sheet_date, Envelope, EnvelopeError, StrikeboardConfig, ValidationError, Warehouse,
    WarehouseConfig,
};
use time::Date;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: Option<u64>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();
    let config = load_config(cli)?;

    let command_result = match &cli.command {
        Command::Process(args) => process::run(args, &config).await?,
        Command::Stocks => stocks::run(&config)?,
        Command::Summary(args) => summary::run(args, &config, cli.format)?,
        Command::Status => status::run(&config)?,
        Command::Favorites => favorites::run(&config)?,
        Command::Upload(args) => upload::run(args, &config).await?,
        Command::Clear(args) => clear::run(args, &config)?,
        Command::Watch(args) => watch::run(args, &config).await?,
        Command::View(args) => view::run(args, &config)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
    } = command_result;

    let mut metadata = Metadata::new(
        latency_ms.unwrap_or_else(|| started.elapsed().as_millis() as u64),
    );
    for warning in warnings {
        metadata.push_warning(warning);
    }

    Envelope::with_errors(metadata.into_envelope_meta()?, data, errors).map_err(CliError::from)
}

/// Resolve configuration and apply command-line overrides on top.
fn load_config(cli: &Cli) -> Result<StrikeboardConfig, CliError> {
    let mut config = StrikeboardConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

fn open_warehouse(config: &StrikeboardConfig) -> Result<Warehouse, CliError> {
    Ok(Warehouse::open(WarehouseConfig::new(&config.db_path))?)
}

fn parse_as_of(value: Option<&str>) -> Result<Option<Date>, CliError> {
    value
        .map(|text| {
            parse_sheet_date(text).ok_or_else(|| ValidationError::InvalidDate {
                value: text.to_owned(),
            })
        })
        .transpose()
        .map_err(CliError::from)
}
