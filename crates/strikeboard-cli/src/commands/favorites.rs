use serde::Serialize;
use strikeboard_core::{read_favorites, StrikeboardConfig, Symbol};

use crate::error::CliError;

use super::{open_warehouse, CommandResult};

#[derive(Debug, Serialize)]
struct FavoriteEntry {
    symbol: Symbol,
    has_data: bool,
}

#[derive(Debug, Serialize)]
struct FavoritesData {
    file: String,
    count: usize,
    favorites: Vec<FavoriteEntry>,
}

pub fn run(config: &StrikeboardConfig) -> Result<CommandResult, CliError> {
    let favorites = read_favorites(&config.favorites_file)?;
    let stored = open_warehouse(config)?.list_symbols()?;

    let entries: Vec<FavoriteEntry> = favorites
        .symbols
        .into_iter()
        .map(|symbol| FavoriteEntry {
            has_data: stored.iter().any(|stored| stored == symbol.as_str()),
            symbol,
        })
        .collect();
    let data = FavoritesData {
        file: config.favorites_file.display().to_string(),
        count: entries.len(),
        favorites: entries,
    };

    let warnings = favorites
        .rejected
        .iter()
        .map(|line| format!("ignored favorites line '{line}': not a valid symbol"))
        .collect();
    Ok(CommandResult::ok(serde_json::to_value(data)?).with_warnings(warnings))
}
