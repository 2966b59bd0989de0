//! Configuration loading.
//!
//! Values resolve in order: built-in defaults, the YAML file (`--config` or
//! `<home>/config.yaml` when present), then `STRIKEBOARD_*` environment
//! variables. Command-line flags are applied by the caller on top.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::Symbol;
use crate::engine::WorkbookPaths;
use crate::live::LiveLayout;
use crate::schedule::{WatchSchedule, WatchSettings};

pub const ENV_HOME: &str = "STRIKEBOARD_HOME";
pub const ENV_DATA_DIR: &str = "STRIKEBOARD_DATA_DIR";
pub const ENV_DB: &str = "STRIKEBOARD_DB";
pub const ENV_WORKERS: &str = "STRIKEBOARD_WORKERS";

const MAX_DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("environment variable {name}='{value}' is invalid: {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Optional keys of the YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    home: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    baseline_file: Option<String>,
    live_file: Option<String>,
    db_path: Option<PathBuf>,
    favorites_file: Option<PathBuf>,
    symbols: Option<Vec<String>>,
    workers: Option<usize>,
    layout: Option<LiveLayout>,
    watch: Option<WatchSettings>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrikeboardConfig {
    pub home: PathBuf,
    pub data_dir: PathBuf,
    pub baseline_file: String,
    pub live_file: String,
    pub db_path: PathBuf,
    pub favorites_file: PathBuf,
    pub symbols: Vec<Symbol>,
    pub workers: usize,
    pub layout: LiveLayout,
    pub watch: WatchSettings,
}

impl StrikeboardConfig {
    /// Defaults rooted at `home`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            data_dir: home.join("live_data"),
            baseline_file: String::from("Historical.xlsx"),
            live_file: String::from("Live.xlsx"),
            db_path: home.join("strikeboard.duckdb"),
            favorites_file: home.join("favorites.txt"),
            symbols: default_universe(),
            workers: default_workers(),
            layout: LiveLayout::default(),
            watch: WatchSettings::default(),
            home,
        }
    }

    /// Load from the process environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, |name| std::env::var(name).ok())
    }

    /// Load with an explicit environment lookup.
    pub fn load_with_env<F>(config_file: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|value| !value.trim().is_empty());
        let env_home = lookup(ENV_HOME).map(PathBuf::from);
        let probe_home = env_home.clone().unwrap_or_else(default_home);

        let file_path = match config_file {
            Some(path) => Some(path.to_path_buf()),
            None => Some(probe_home.join("config.yaml")).filter(|path| path.is_file()),
        };
        let file = match &file_path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };

        let home = env_home
            .or_else(|| file.home.clone())
            .unwrap_or(probe_home);
        let mut config = Self::with_home(home.clone());

        if let Some(data_dir) = file.data_dir {
            config.data_dir = resolve(&home, data_dir);
        }
        if let Some(baseline_file) = file.baseline_file {
            config.baseline_file = baseline_file;
        }
        if let Some(live_file) = file.live_file {
            config.live_file = live_file;
        }
        if let Some(db_path) = file.db_path {
            config.db_path = resolve(&home, db_path);
        }
        if let Some(favorites_file) = file.favorites_file {
            config.favorites_file = resolve(&home, favorites_file);
        }
        if let Some(symbols) = file.symbols {
            config.symbols = parse_universe(&symbols)?;
        }
        if let Some(workers) = file.workers {
            config.workers = workers;
        }
        if let Some(layout) = file.layout {
            config.layout = layout;
        }
        if let Some(watch) = file.watch {
            config.watch = watch;
        }

        if let Some(data_dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(db_path) = lookup(ENV_DB) {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            config.workers = workers.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_WORKERS,
                value: workers.clone(),
                reason: String::from("expected a positive integer"),
            })?;
        }

        config.validate()?;
        debug!(
            home = %config.home.display(),
            config_file = ?file_path,
            symbols = config.symbols.len(),
            workers = config.workers,
            "configuration resolved"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                field: "workers",
                reason: String::from("must be greater than zero"),
            });
        }
        for (field, name) in [
            ("baseline_file", &self.baseline_file),
            ("live_file", &self.live_file),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: String::from("file name must not be empty"),
                });
            }
        }
        if self.baseline_file == self.live_file {
            return Err(ConfigError::Invalid {
                field: "live_file",
                reason: String::from("baseline and live workbooks must have different names"),
            });
        }
        validate_layout(&self.layout)?;
        WatchSchedule::from_settings(&self.watch)?;
        Ok(())
    }

    pub fn workbook_paths(&self) -> WorkbookPaths {
        WorkbookPaths {
            baseline: self.data_dir.join(&self.baseline_file),
            live: self.data_dir.join(&self.live_file),
        }
    }

    pub fn watch_schedule(&self) -> Result<WatchSchedule, ConfigError> {
        WatchSchedule::from_settings(&self.watch)
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve(home: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        home.join(path)
    }
}

fn parse_universe(symbols: &[String]) -> Result<Vec<Symbol>, ConfigError> {
    let mut universe: Vec<Symbol> = Vec::with_capacity(symbols.len());
    for raw in symbols {
        let symbol = Symbol::parse(raw).map_err(|error| ConfigError::Invalid {
            field: "symbols",
            reason: format!("'{raw}': {error}"),
        })?;
        if !universe.contains(&symbol) {
            universe.push(symbol);
        }
    }
    if universe.is_empty() {
        return Err(ConfigError::Invalid {
            field: "symbols",
            reason: String::from("at least one symbol is required"),
        });
    }
    Ok(universe)
}

/// Reject layouts whose call and put cells collide or that cannot fit in the
/// minimum row width.
pub fn validate_layout(layout: &LiveLayout) -> Result<(), ConfigError> {
    if layout.marker_prefix.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "layout.marker_prefix",
            reason: String::from("must not be empty"),
        });
    }

    for (field, offsets) in [("layout.call", layout.call), ("layout.put", layout.put)] {
        let [label, previous_oi, strike] = offsets.columns();
        if label == previous_oi || label == strike || previous_oi == strike {
            return Err(ConfigError::Invalid {
                field,
                reason: String::from("label, previous_oi and strike must be distinct columns"),
            });
        }
        if offsets.columns().iter().any(|column| *column >= layout.min_row_width) {
            return Err(ConfigError::Invalid {
                field,
                reason: format!(
                    "columns must be below min_row_width ({})",
                    layout.min_row_width
                ),
            });
        }
    }

    let call = layout.call.columns();
    if layout.put.columns().iter().any(|column| call.contains(column)) {
        return Err(ConfigError::Invalid {
            field: "layout.put",
            reason: String::from("put columns overlap call columns"),
        });
    }

    Ok(())
}

/// `$HOME/.strikeboard`, or `.strikeboard` when no home directory is known.
pub fn default_home() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".strikeboard"),
        _ => PathBuf::from(".strikeboard"),
    }
}

/// Available parallelism, capped.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

/// The F&O symbol universe tracked when no list is configured.
pub fn default_universe() -> Vec<Symbol> {
    DEFAULT_UNIVERSE
        .iter()
        .filter_map(|symbol| Symbol::parse(symbol).ok())
        .collect()
}

const DEFAULT_UNIVERSE: &[&str] = &[
    "ABB", "ABCAPITAL", "ADANIENSOL", "ADANIENT", "ADANIGREEN", "ADANIPORTS", "ALKEM", "AMBER",
    "AMBUJACEM", "ANGELONE", "APLAPOLLO", "APOLLOHOSP", "ASHOKLEY", "ASIANPAINT", "AINT",
    "ASTRAL", "AUBANK", "AUROPHARMA", "AXISBANK", "BAJAJFINSV", "BAJFINANCE", "BANDHANBNK",
    "BANKBARODA", "BANKINDIA", "BDL", "BEL", "BHARATFORG", "BHARTIARTL", "BHEL", "BIOCON",
    "BLUESTARCO", "BOSCHLTD", "BPCL", "BRITANNIA", "BSE", "CAMS", "CANBK", "CDSL", "CGPOWER",
    "CIPLA", "COALINDIA", "COFORGE", "COLPAL", "CONCOR", "CROMPTON", "CUMMINSIND", "CYIENT",
    "DABUR", "DALBHARAT", "DELHIVERY", "DIVISLAB", "DIXON", "DLF", "DMART", "DRREDDY",
    "EICHERMOT", "ETERNAL", "EXIDEIND", "FEDERALBNK", "FORTIS", "GAIL", "GLENMARK",
    "GMRAIRPORT", "GODREJCP", "GODREJPROP", "GRASIM", "HAL", "HAVELLS", "HCLTECH", "HDFCAMC",
    "HDFCBANK", "HDFCLIFE", "HEROMOTOCO", "HFCL", "HINDALCO", "HINDPETRO", "HINDUNILVR",
    "HINDZINC", "HUDCO", "ICICIBANK", "ICICIGI", "IDEA", "IDFCFIRSTB", "IEX", "IGL", "IIFL",
    "INDHOTEL", "INDIANB", "INDIGO", "INDUSINDBK", "INDUSTOWER", "INFY", "INOXWIND", "IOC",
    "IRCTC", "IREDA", "IRFC", "ITC", "JINDALSTEL", "JIOFIN", "JSWENERGY", "JSWSTEEL",
    "JUBLFOOD", "KALYANKJIL", "KAYNES", "KEI", "KFINTECH", "KOTAKBANK", "KPITTECH",
    "LAURUSLABS", "LICHSGFIN", "LICI", "LODHA", "LT", "LTF", "LTIM", "LUPIN", "MANAPPURAM",
    "MANKIND", "MARICO", "MARUTI", "MAXHEALTH", "MAZDOCK", "MCX", "MFSL", "MM", "MPHASIS",
    "MUTHOOTFIN", "NAUKRI", "NATIONALUM", "NBCC", "NCC", "NESTLEIND", "NHPC", "NMDC", "NTPC",
    "NUVAMA", "NYKAA", "OBEROIRLTY", "OFSS", "OIL", "ONGC", "ONE", "PAGEIND", "PATANJALI",
    "PAYTM", "PETRONET", "PFC", "PGEL", "PHOENIXLTD", "PIDILITIND", "PIIND", "PNB",
    "PNBHOUSING", "POLICYBZR", "POLYCAB", "POWERGRID", "PPLPHARMA", "PRESTIGE", "RBLBANK",
    "RECLTD", "RELIANCE", "RVNL", "SAIL", "SBICARD", "SBILIFE", "SBIN", "SHREECEM",
    "SHRIRAMFIN", "SIEMENS", "SOLARINDS", "SONACOMS", "SRF", "SUZLON", "SUNPHARMA",
    "SUPREMEIND", "SYNGENE", "TATACHEM", "TATACONSUM", "TATAELXSI", "TATAMOTORS", "TATAPOWER",
    "TATASTEEL", "TATATECH", "TCS", "TECHM", "TIINDIA", "TITAGARH", "TITAN", "TORNTPHARM",
    "TORNTPOWER", "TRENT", "TVSMOTOR", "ULTRACEMCO", "UNIONBANK", "UNITDSPR", "UNOMINDA", "UPL",
    "VBL", "VEDL", "VOLTAS", "WIPRO", "YESBANK", "ZYDUSLIFE",
];
