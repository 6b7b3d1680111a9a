//! Storage configuration.
//!
//! [`StorageConfig`] carries everything [`select_backend`](crate::select_backend)
//! needs to pick and open a backend. Binaries usually build it from their own
//! command-line or environment settings; it also deserializes from JSON or
//! any other serde format.
//!
//! # Example
//!
//! ```
//! use siteforge_persistence::StorageConfig;
//!
//! let config = StorageConfig::new()
//!     .with_database_url("postgres://siteforge@localhost/siteforge")
//!     .with_data_dir("/var/lib/siteforge");
//! assert!(config.resolved_database_url().is_some());
//!
//! // An empty URL means "no database"
//! let config = StorageConfig::new().with_database_url("  ");
//! assert!(config.resolved_database_url().is_none());
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::partition::DEFAULT_PARTITION_PREFIX;

/// Settings for backend selection and the backends themselves.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// PostgreSQL connection URL. Absent or blank selects the flat-file backend.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Root directory of the flat-file backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Prefix of every tenant partition name.
    #[serde(default = "default_partition_prefix")]
    pub partition_prefix: String,

    /// Maximum size of the PostgreSQL connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Seconds to wait for a PostgreSQL connection at startup.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_partition_prefix() -> String {
    DEFAULT_PARTITION_PREFIX.to_string()
}

fn default_max_connections() -> usize {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            data_dir: default_data_dir(),
            partition_prefix: default_partition_prefix(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "<redacted>"),
            )
            .field("data_dir", &self.data_dir)
            .field("partition_prefix", &self.partition_prefix)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl StorageConfig {
    /// Creates a configuration with defaults (flat-file under `./data`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database URL.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the flat-file data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the partition prefix.
    pub fn with_partition_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.partition_prefix = prefix.into();
        self
    }

    /// Sets the maximum pool size.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the connect timeout in seconds.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Returns the trimmed database URL, treating a blank value as unset.
    pub fn resolved_database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
