//! The user's favorites list: one symbol per line.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::domain::Symbol;

/// Parsed favorites plus lines that were not valid symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Favorites {
    pub symbols: Vec<Symbol>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

/// Read the favorites file. A missing file yields an empty list.
pub fn read_favorites(path: &Path) -> io::Result<Favorites> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "favorites file not found");
            return Ok(Favorites::default());
        }
        Err(error) => return Err(error),
    };
    Ok(parse_favorites(&content))
}

pub fn parse_favorites(content: &str) -> Favorites {
    let mut favorites = Favorites::default();
    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match Symbol::parse(line) {
            Ok(symbol) if !favorites.symbols.contains(&symbol) => favorites.symbols.push(symbol),
            Ok(_) => {}
            Err(_) => favorites.rejected.push(line.to_owned()),
        }
    }
    favorites
}
