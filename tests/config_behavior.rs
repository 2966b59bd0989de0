//! Behavior-driven tests for configuration resolution and the favorites and
//! upload helpers that depend on it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use strikeboard_core::config::{ENV_DB, ENV_HOME, ENV_WORKERS};
use strikeboard_core::{
    read_favorites, store_workbook, ConfigError, StrikeboardConfig, WorkbookKind,
};
use tempfile::tempdir;

fn env_with(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), value.clone()))
        .collect();
    move |name| vars.get(name).cloned()
}

fn home_env(home: &Path) -> (&'static str, String) {
    (ENV_HOME, home.display().to_string())
}

// =============================================================================
// Config: resolution order
// =============================================================================

#[test]
fn when_home_has_config_file_then_it_is_picked_up() {
    // Given: A home directory holding config.yaml
    let temp = tempdir().expect("tempdir");
    fs::write(
        temp.path().join("config.yaml"),
        "live_file: Snapshot.xlsx\nworkers: 3\nsymbols: [infy, M&M]\n",
    )
    .expect("write config");

    // When: Loading with only STRIKEBOARD_HOME set
    let config = StrikeboardConfig::load_with_env(None, env_with(&[home_env(temp.path())]))
        .expect("config");

    // Then: File values apply over defaults
    assert_eq!(config.live_file, "Snapshot.xlsx");
    assert_eq!(config.baseline_file, "Historical.xlsx");
    assert_eq!(config.workers, 3);
    let symbols: Vec<&str> = config.symbols.iter().map(|symbol| symbol.as_str()).collect();
    assert_eq!(symbols, vec!["INFY", "MM"]);
}

#[test]
fn when_env_and_file_disagree_then_env_wins() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("custom.yaml");
    fs::write(&config_path, "db_path: from-file.duckdb\nworkers: 2\n").expect("write config");
    let env_db = temp.path().join("from-env.duckdb");

    let config = StrikeboardConfig::load_with_env(
        Some(&config_path),
        env_with(&[
            home_env(temp.path()),
            (ENV_DB, env_db.display().to_string()),
            (ENV_WORKERS, String::from("5")),
        ]),
    )
    .expect("config");

    assert_eq!(config.db_path, env_db);
    assert_eq!(config.workers, 5);
}

#[test]
fn when_file_uses_relative_paths_then_they_resolve_under_home() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, "data_dir: sheets\nfavorites_file: lists/fav.txt\n")
        .expect("write config");

    let config =
        StrikeboardConfig::load_with_env(Some(&config_path), env_with(&[home_env(temp.path())]))
            .expect("config");

    assert_eq!(config.data_dir, temp.path().join("sheets"));
    assert_eq!(config.favorites_file, temp.path().join("lists/fav.txt"));
    assert_eq!(
        config.workbook_paths().baseline,
        temp.path().join("sheets").join("Historical.xlsx")
    );
}

// =============================================================================
// Config: validation
// =============================================================================

#[test]
fn when_file_has_unknown_key_then_loading_fails() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, "wrokers: 4\n").expect("write config");

    let error =
        StrikeboardConfig::load_with_env(Some(&config_path), env_with(&[home_env(temp.path())]))
            .expect_err("must fail");
    assert!(matches!(error, ConfigError::Parse { .. }));
}

#[test]
fn when_market_window_is_inverted_then_loading_fails() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("config.yaml");
    fs::write(
        &config_path,
        "watch:\n  market_open: \"15:30\"\n  market_close: \"09:15\"\n",
    )
    .expect("write config");

    let error =
        StrikeboardConfig::load_with_env(Some(&config_path), env_with(&[home_env(temp.path())]))
            .expect_err("must fail");
    assert!(matches!(
        error,
        ConfigError::Invalid {
            field: "watch.market_close",
            ..
        }
    ));
}

#[test]
fn when_layout_offsets_overlap_then_loading_fails() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("config.yaml");
    fs::write(
        &config_path,
        "layout:\n  put:\n    label: 0\n    previous_oi: 7\n    strike: 8\n",
    )
    .expect("write config");

    let error =
        StrikeboardConfig::load_with_env(Some(&config_path), env_with(&[home_env(temp.path())]))
            .expect_err("must fail");
    assert!(matches!(error, ConfigError::Invalid { .. }));
}

#[test]
fn when_workers_env_is_not_a_number_then_loading_fails() {
    let temp = tempdir().expect("tempdir");

    let error = StrikeboardConfig::load_with_env(
        None,
        env_with(&[home_env(temp.path()), (ENV_WORKERS, String::from("many"))]),
    )
    .expect_err("must fail");
    assert!(matches!(error, ConfigError::InvalidEnv { .. }));

    let error = StrikeboardConfig::load_with_env(
        None,
        env_with(&[home_env(temp.path()), (ENV_WORKERS, String::from("0"))]),
    )
    .expect_err("must fail");
    assert!(matches!(
        error,
        ConfigError::Invalid {
            field: "workers",
            ..
        }
    ));
}

// =============================================================================
// Favorites and uploads
// =============================================================================

#[test]
fn when_favorites_file_has_padding_then_symbols_are_clean() {
    let temp = tempdir().expect("tempdir");
    let config = StrikeboardConfig::load_with_env(None, env_with(&[home_env(temp.path())]))
        .expect("config");
    fs::write(&config.favorites_file, "  INFY\n\n tcs \n").expect("write favorites");

    let favorites = read_favorites(&config.favorites_file).expect("read");

    let symbols: Vec<&str> = favorites.symbols.iter().map(|symbol| symbol.as_str()).collect();
    assert_eq!(symbols, vec!["INFY", "TCS"]);
}

#[test]
fn when_workbook_is_uploaded_then_it_lands_at_the_configured_path() {
    let temp = tempdir().expect("tempdir");
    let config = StrikeboardConfig::load_with_env(None, env_with(&[home_env(temp.path())]))
        .expect("config");
    let download = temp.path().join("Live (3).XLSX");
    fs::write(&download, b"workbook bytes").expect("write upload");

    let stored = store_workbook(
        WorkbookKind::Live,
        &download,
        &config.data_dir,
        &config.live_file,
    )
    .expect("store");

    assert_eq!(stored.stored_as, config.workbook_paths().live);
    assert_eq!(
        fs::read(config.workbook_paths().live).expect("read"),
        b"workbook bytes".to_vec()
    );
}
