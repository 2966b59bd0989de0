//! CLI argument definitions for strikeboard.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `process` | Run a reconciliation pass |
//! | `stocks` | List symbols with stored data |
//! | `summary` | Show the stored rows of one symbol |
//! | `status` | Last pass, recent uploads, workbook files |
//! | `favorites` | Show the favorites list |
//! | `upload` | Replace the baseline and/or live workbook |
//! | `clear` | Delete stored rows |
//! | `watch` | Re-run passes on a schedule during market hours |
//! | `view` | Read a dashboard view of the store |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and errors as failures |
//! | `--config` | | YAML configuration file |
//! | `--log-format` | `compact` | Log format on stderr |

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;

/// Reconcile live option-chain open interest against the historical baseline.
#[derive(Debug, Parser)]
#[command(
    name = "strikeboard",
    author,
    version,
    about = "Open-interest reconciliation between a historical baseline and a live snapshot workbook"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Configuration file (defaults to `<home>/config.yaml` when present).
    #[arg(long, global = true, env = "STRIKEBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Override the directory holding the workbooks.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the DuckDB store path.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Override the worker thread count.
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a reconciliation pass.
    ///
    /// Without symbols the configured universe is processed and all stored
    /// rows are replaced; with symbols only those are replaced.
    ///
    ///   strikeboard process
    ///   strikeboard process INFY TCS --as-of 2026-02-20
    Process(ProcessArgs),

    /// List symbols that have stored data.
    Stocks,

    /// Show the stored baseline and live rows of one symbol.
    Summary(SummaryArgs),

    /// Show the last pass, recent uploads and workbook files.
    Status,

    /// Show the favorites list and which favorites have stored data.
    Favorites,

    /// Replace the baseline and/or live workbook, then run a full pass.
    ///
    ///   strikeboard upload --live ~/Downloads/Live.xlsx
    Upload(UploadArgs),

    /// Delete stored rows for every symbol, or one.
    Clear(ClearArgs),

    /// Re-run full passes on a schedule while the market is open.
    Watch(WatchArgs),

    /// Read one of the dashboard views of the store.
    ///
    ///   strikeboard view new-strikes --symbol INFY
    View(ViewArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ProcessArgs {
    /// Symbols to process (defaults to the configured universe).
    pub symbols: Vec<String>,

    /// Use the sheets closest to this date (YYYY-MM-DD or DD.MM.YYYY).
    #[arg(long)]
    pub as_of: Option<String>,

    /// Keep stored rows of symbols outside this pass.
    #[arg(long, default_value_t = false)]
    pub keep_existing: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("workbooks")
        .required(true)
        .multiple(true)
        .args(["baseline", "live"])
))]
pub struct UploadArgs {
    /// New historical baseline workbook.
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// New live snapshot workbook.
    #[arg(long)]
    pub live: Option<PathBuf>,

    /// Only store the files; skip the reconciliation pass.
    #[arg(long, default_value_t = false)]
    pub no_process: bool,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Only clear this symbol.
    #[arg(long)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Stop after this many passes.
    #[arg(long)]
    pub max_passes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewName {
    /// Live strikes with no baseline counterpart.
    NewStrikes,
    /// Baseline and live row counts per symbol.
    Coverage,
    /// Passes, newest first.
    Passes,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[arg(value_enum)]
    pub view: ViewName,

    /// Only rows of this symbol.
    #[arg(long)]
    pub symbol: Option<String>,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 500)]
    pub max_rows: usize,
}
