use ::duckdb::{params, Connection};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_reconciled_rows",
        sql: r#"
CREATE TABLE IF NOT EXISTS baseline_rows (
    symbol TEXT NOT NULL,
    seq INTEGER NOT NULL,
    category TEXT NOT NULL,
    section TEXT,
    strike TEXT NOT NULL,
    strike_key TEXT NOT NULL,
    previous_oi DOUBLE,
    latest_oi DOUBLE,
    call_oi_delta DOUBLE,
    put_oi_delta DOUBLE,
    last_traded_price DOUBLE,
    additional_strike TEXT,
    is_additional_strike BOOLEAN NOT NULL DEFAULT FALSE,
    run_id TEXT,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS live_rows (
    symbol TEXT NOT NULL,
    seq INTEGER NOT NULL,
    section TEXT NOT NULL,
    label TEXT NOT NULL,
    strike TEXT NOT NULL,
    strike_key TEXT NOT NULL,
    previous_oi DOUBLE,
    oi_difference DOUBLE,
    is_new_strike BOOLEAN NOT NULL DEFAULT FALSE,
    additional_strike TEXT,
    run_id TEXT,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_audit_trail",
        sql: r#"
CREATE TABLE IF NOT EXISTS pass_log (
    run_id TEXT NOT NULL,
    trigger TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    baseline_sheet TEXT,
    live_sheet TEXT,
    symbols_requested BIGINT NOT NULL,
    symbols_with_data BIGINT NOT NULL,
    error_count BIGINT NOT NULL,
    message TEXT,
    recorded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS pass_errors (
    run_id TEXT NOT NULL,
    symbol TEXT,
    message TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS upload_log (
    kind TEXT NOT NULL,
    file_name TEXT NOT NULL,
    stored_as TEXT NOT NULL,
    size_bytes BIGINT NOT NULL,
    uploaded_at TEXT NOT NULL
);
"#,
    },
    Migration {
        version: "0003_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_baseline_rows_symbol ON baseline_rows(symbol);
CREATE INDEX IF NOT EXISTS idx_live_rows_symbol ON live_rows(symbol);
CREATE INDEX IF NOT EXISTS idx_pass_log_started_at ON pass_log(started_at);
CREATE INDEX IF NOT EXISTS idx_pass_errors_run_id ON pass_errors(run_id);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params![migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params![migration.version],
            )?;
        }
    }

    Ok(())
}
