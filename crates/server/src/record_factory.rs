use std::sync::Arc;

use sweeplog_records::RecordStore;
use sweeplog_records_memory::MemoryRecordStore;
#[cfg(feature = "postgres")]
use sweeplog_records_postgres::{PostgresRecordConfig, PostgresRecordStore};

use crate::config::RecordsConfig;
use crate::error::ServerError;

#[cfg(feature = "postgres")]
fn postgres_config(config: &RecordsConfig) -> Result<PostgresRecordConfig, ServerError> {
    let url = config.url.as_deref().ok_or_else(|| {
        ServerError::Config("records postgres backend requires [records] url".into())
    })?;

    Ok(PostgresRecordConfig {
        schema: config.schema.clone(),
        ssl_mode: config.ssl_mode.clone(),
        ssl_root_cert: config.ssl_root_cert.clone(),
        ..PostgresRecordConfig::new(url)
            .with_table_prefix(&config.prefix)
            .with_pool_size(config.pool_size)
    })
}

/// Create a record store from the given configuration.
///
/// Backends with a schema run their migrations here.
#[allow(clippy::unused_async)]
pub async fn create_record_store(
    config: &RecordsConfig,
) -> Result<Arc<dyn RecordStore>, ServerError> {
    let store: Arc<dyn RecordStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryRecordStore::new()),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let store = PostgresRecordStore::new(&postgres_config(config)?)
                .await
                .map_err(|e| ServerError::Config(format!("records postgres: {e}")))?;

            Arc::new(store)
        }
        #[cfg(not(feature = "postgres"))]
        "postgres" => {
            return Err(ServerError::Config(
                "records backend postgres requires building with the `postgres` feature".into(),
            ));
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported records backend: {other}"
            )));
        }
    };

    Ok(store)
}
