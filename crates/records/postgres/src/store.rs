use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use sweeplog_core::{AttachmentRef, Locator, NewRecord, Record, RecordId};
use sweeplog_records::{RecordError, RecordStore};

use crate::config::PostgresRecordConfig;
use crate::migrations;

/// Build `PgConnectOptions` from a [`PostgresRecordConfig`], applying SSL
/// settings when configured.
pub(crate) fn build_connect_options(
    config: &PostgresRecordConfig,
) -> Result<sqlx::postgres::PgConnectOptions, RecordError> {
    let mut options: sqlx::postgres::PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| RecordError::WriteFailed(e.to_string()))?;

    if let Some(ref mode) = config.ssl_mode {
        let ssl_mode = match mode.as_str() {
            "disable" => sqlx::postgres::PgSslMode::Disable,
            "prefer" => sqlx::postgres::PgSslMode::Prefer,
            "require" => sqlx::postgres::PgSslMode::Require,
            "verify-ca" => sqlx::postgres::PgSslMode::VerifyCa,
            "verify-full" => sqlx::postgres::PgSslMode::VerifyFull,
            other => {
                return Err(RecordError::WriteFailed(format!("unknown ssl_mode: {other}")));
            }
        };
        options = options.ssl_mode(ssl_mode);
    }

    if let Some(ref path) = config.ssl_root_cert {
        options = options.ssl_root_cert(path);
    }

    Ok(options)
}

/// PostgreSQL-backed implementation of [`RecordStore`].
///
/// Each `create` is a single `INSERT ... RETURNING`, so a record is either
/// fully committed or absent. The database assigns `sequence` and
/// `created_at`.
pub struct PostgresRecordStore {
    pool: PgPool,
    table: String,
}

impl std::fmt::Debug for PostgresRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRecordStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl PostgresRecordStore {
    /// Connect to `PostgreSQL`, create the pool and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::WriteFailed`] if the connection or the
    /// migrations fail; the store is unusable without its table.
    pub async fn new(config: &PostgresRecordConfig) -> Result<Self, RecordError> {
        let connect_options = build_connect_options(config)?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(connect_options)
            .await
            .map_err(|e| RecordError::WriteFailed(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Create a store from an existing pool. Runs migrations on creation.
    pub async fn from_pool(pool: PgPool, config: &PostgresRecordConfig) -> Result<Self, RecordError> {
        migrations::run_migrations(&pool, config)
            .await
            .map_err(|e| RecordError::WriteFailed(e.to_string()))?;

        let table = config.records_table();
        info!(table = %table, "initialized postgres record store");
        Ok(Self { pool, table })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn create(&self, record: NewRecord) -> Result<Record, RecordError> {
        let sql = format!(
            "INSERT INTO {} (id, before_note, after_note, before_locator, after_locator)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, sequence, before_note, after_note, before_locator, after_locator, created_at",
            self.table
        );

        let id = RecordId::generate();
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id.as_str())
            .bind(&record.before_note)
            .bind(&record.after_note)
            .bind(record.before_attachment.as_ref().map(|a| a.locator.as_str()))
            .bind(record.after_attachment.as_ref().map(|a| a.locator.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RecordError::WriteFailed(e.to_string()))?;

        debug!(id = %row.id, sequence = row.sequence, "created record in postgres");
        Ok(row.into())
    }

    async fn list_all(&self) -> Result<Vec<Record>, RecordError> {
        let sql = format!(
            "SELECT id, sequence, before_note, after_note, before_locator, after_locator, created_at
             FROM {} ORDER BY created_at DESC, sequence DESC",
            self.table
        );

        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RecordError::ReadFailed(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    sequence: i64,
    before_note: String,
    after_note: String,
    before_locator: Option<String>,
    after_locator: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        // BIGSERIAL starts at 1.
        #[allow(clippy::cast_sign_loss)]
        let sequence = row.sequence as u64;

        Self {
            id: RecordId::new(row.id),
            before_note: row.before_note,
            after_note: row.after_note,
            before_attachment: row.before_locator.map(|l| AttachmentRef::from(Locator::new(l))),
            after_attachment: row.after_locator.map(|l| AttachmentRef::from(Locator::new(l))),
            created_at: row.created_at,
            sequence,
        }
    }
}
