//! Startup backend selection.
//!
//! The backend is chosen once, when the process starts, and never
//! revisited. A configured but unreachable database degrades to the
//! flat-file backend with a warning so that a site can still be served from
//! local data; any other startup failure is returned to the caller.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::backends::file::{FileBackend, FileBackendConfig};
use crate::config::StorageConfig;
use crate::error::{ErrorKind, StorageResult};
use crate::site_store::SiteStore;

/// Which backend serves this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageBackendMode {
    /// PostgreSQL with one schema per site.
    Postgres,
    /// JSON files under the data directory.
    FlatFile,
}

impl fmt::Display for StorageBackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackendMode::Postgres => write!(f, "postgres"),
            StorageBackendMode::FlatFile => write!(f, "flat-file"),
        }
    }
}

impl FromStr for StorageBackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StorageBackendMode::Postgres),
            "flat-file" | "flatfile" | "file" | "json" => Ok(StorageBackendMode::FlatFile),
            other => Err(format!(
                "unknown storage backend '{}': expected postgres or flat-file",
                other
            )),
        }
    }
}

/// The outcome of [`select_backend`].
#[derive(Debug, Clone)]
pub struct SelectedBackend {
    /// The backend actually in use.
    pub mode: StorageBackendMode,
    /// Storage handle over that backend, already migrated.
    pub store: SiteStore,
    /// `true` when a database was configured but could not be used.
    pub fell_back: bool,
}

/// Opens the configured backend and runs its shared migrations.
///
/// * No database URL: flat-file under `data_dir`.
/// * A URL that connects: PostgreSQL.
/// * A URL whose server is unreachable, or a build without the `postgres`
///   feature: a warning, then flat-file.
///
/// # Errors
///
/// Anything other than unavailability, such as a failed migration, an
/// invalid partition prefix or an unwritable data directory.
pub async fn select_backend(config: &StorageConfig) -> StorageResult<SelectedBackend> {
    let Some(url) = config.resolved_database_url() else {
        tracing::info!(data_dir = %config.data_dir.display(), "no database configured, using flat-file storage");
        return open_flat_file(config, false).await;
    };

    match open_postgres(config, url).await {
        Ok(Some(store)) => Ok(SelectedBackend {
            mode: StorageBackendMode::Postgres,
            store,
            fell_back: false,
        }),
        Ok(None) => open_flat_file(config, true).await,
        Err(e) if e.kind() == ErrorKind::BackendUnavailable => {
            tracing::warn!(
                error = %e,
                data_dir = %config.data_dir.display(),
                "database unavailable at startup, falling back to flat-file storage"
            );
            open_flat_file(config, true).await
        }
        Err(e) => Err(e),
    }
}

async fn open_flat_file(config: &StorageConfig, fell_back: bool) -> StorageResult<SelectedBackend> {
    let backend = FileBackend::new(
        FileBackendConfig::new(config.data_dir.clone())
            .with_partition_prefix(config.partition_prefix.clone()),
    )?;
    let store = SiteStore::new(Arc::new(backend));
    store.migrate().await?;

    tracing::info!(
        backend = %StorageBackendMode::FlatFile,
        data_dir = %config.data_dir.display(),
        fell_back,
        "storage backend ready"
    );
    Ok(SelectedBackend {
        mode: StorageBackendMode::FlatFile,
        store,
        fell_back,
    })
}

/// Returns `Ok(None)` when PostgreSQL support is not compiled in.
#[cfg(feature = "postgres")]
async fn open_postgres(config: &StorageConfig, url: &str) -> StorageResult<Option<SiteStore>> {
    use crate::backends::postgres::{PostgresBackend, PostgresConfig};

    let pg_config = PostgresConfig::from_url(url)
        .with_max_connections(config.max_connections)
        .with_connect_timeout_secs(config.connect_timeout_secs)
        .with_partition_prefix(config.partition_prefix.clone());
    let target = pg_config.target();

    tracing::info!(target = %target, "connecting to PostgreSQL");
    let backend = PostgresBackend::new(pg_config).await?;
    let store = SiteStore::new(Arc::new(backend));
    store.health_check().await?;
    store.migrate().await?;

    tracing::info!(backend = %StorageBackendMode::Postgres, target = %target, "storage backend ready");
    Ok(Some(store))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_config: &StorageConfig, _url: &str) -> StorageResult<Option<SiteStore>> {
    tracing::warn!(
        "a database URL is configured but this build has no PostgreSQL support, using flat-file storage"
    );
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_display_and_parse() {
        assert_eq!(StorageBackendMode::FlatFile.to_string(), "flat-file");
        assert_eq!(
            "PostgreSQL".parse::<StorageBackendMode>().unwrap(),
            StorageBackendMode::Postgres
        );
        assert_eq!(
            "file".parse::<StorageBackendMode>().unwrap(),
            StorageBackendMode::FlatFile
        );
        assert!("mongo".parse::<StorageBackendMode>().is_err());
    }

    #[tokio::test]
    async fn test_no_url_selects_flat_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new().with_data_dir(dir.path());

        let selected = select_backend(&config).await.unwrap();
        assert_eq!(selected.mode, StorageBackendMode::FlatFile);
        assert!(!selected.fell_back);
        assert!(dir.path().join("sites").is_dir());
    }

    #[tokio::test]
    async fn test_invalid_prefix_is_an_error_not_a_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new()
            .with_data_dir(dir.path())
            .with_partition_prefix("Bad-Prefix");

        let err = select_backend(&config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
    }
}
