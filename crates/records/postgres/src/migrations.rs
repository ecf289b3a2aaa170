use sqlx::PgPool;

use crate::config::PostgresRecordConfig;

/// Create the records table and its listing index if they do not exist.
///
/// `created_at` is filled by `clock_timestamp()` at insert time so the
/// database, not the client, owns commit time.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(
    pool: &PgPool,
    config: &PostgresRecordConfig,
) -> Result<(), sqlx::Error> {
    let table = config.records_table();

    let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {}", config.schema);

    let create_records = format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id                TEXT PRIMARY KEY,
            sequence          BIGSERIAL NOT NULL UNIQUE,
            before_note       TEXT NOT NULL DEFAULT '',
            after_note        TEXT NOT NULL DEFAULT '',
            before_locator    TEXT,
            after_locator     TEXT,
            created_at        TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
        )"
    );

    let create_listing_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}records_listing_idx ON {table} (created_at DESC, sequence DESC)",
        config.table_prefix
    );

    for stmt in [&create_schema, &create_records, &create_listing_idx] {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}
