//! Command-line configuration.
//!
//! Every global setting can also come from the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SITEFORGE_DATABASE_URL` | unset | PostgreSQL URL; unset or empty uses flat files |
//! | `SITEFORGE_DATA_DIR` | ./data | Flat-file data directory |
//! | `SITEFORGE_LOG_LEVEL` | info | Log level |
//! | `SITEFORGE_PARTITION_PREFIX` | tenant_ | Prefix of partition names |
//! | `SITEFORGE_PLATFORM_DOMAIN` | unset | Comma-separated platform domains |
//! | `SITEFORGE_PG_MAX_CONNECTIONS` | 10 | PostgreSQL pool size |
//! | `SITEFORGE_PG_CONNECT_TIMEOUT` | 5 | PostgreSQL connect timeout (seconds) |

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use siteforge_persistence::StorageConfig;
use siteforge_persistence::partition::PartitionNaming;
use siteforge_persistence::tenant::normalize_hostname;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// SiteForge storage administration.
#[derive(Debug, Clone, Parser)]
#[command(name = "siteforge")]
#[command(about = "Administer SiteForge site storage", version)]
pub struct Cli {
    /// PostgreSQL connection URL. Without one, data lives in flat files.
    #[arg(long, global = true, env = "SITEFORGE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Directory for the flat-file backend.
    #[arg(long, global = true, env = "SITEFORGE_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "SITEFORGE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Prefix of every per-site partition name.
    #[arg(
        long,
        global = true,
        env = "SITEFORGE_PARTITION_PREFIX",
        default_value = "tenant_"
    )]
    pub partition_prefix: String,

    /// Platform domains whose subdomains are site slugs (comma-separated).
    #[arg(
        long,
        global = true,
        env = "SITEFORGE_PLATFORM_DOMAIN",
        value_delimiter = ','
    )]
    pub platform_domain: Vec<String>,

    /// Maximum PostgreSQL pool size.
    #[arg(
        long,
        global = true,
        env = "SITEFORGE_PG_MAX_CONNECTIONS",
        default_value = "10"
    )]
    pub pg_max_connections: usize,

    /// Seconds to wait for PostgreSQL at startup before falling back.
    #[arg(
        long,
        global = true,
        env = "SITEFORGE_PG_CONNECT_TIMEOUT",
        default_value = "5"
    )]
    pub pg_connect_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create or upgrade the shared structures.
    Migrate,
    /// Re-create missing partition structures for every site.
    Reprovision,
    /// Show which backend was selected.
    Status,
    /// Manage sites.
    #[command(subcommand)]
    Sites(SitesCommand),
    /// Resolve a hostname to a site.
    Resolve {
        /// Hostname as received in a `Host` header.
        hostname: String,
    },
    /// Inspect pages.
    #[command(subcommand)]
    Pages(PagesCommand),
    /// Inspect leads.
    #[command(subcommand)]
    Leads(LeadsCommand),
}

/// Site commands.
#[derive(Debug, Clone, Subcommand)]
pub enum SitesCommand {
    /// List all sites.
    List,
    /// Print a site as JSON.
    Show { slug: String },
    /// Create a site with an empty home page.
    Create {
        slug: String,
        name: String,
        /// Domain to bind (repeatable).
        #[arg(long = "domain")]
        domains: Vec<String>,
    },
    /// Change a site's slug.
    Rename { old_slug: String, new_slug: String },
    /// Bind a domain to a site.
    AddDomain { slug: String, domain: String },
}

/// Page commands.
#[derive(Debug, Clone, Subcommand)]
pub enum PagesCommand {
    /// List a site's pages.
    List { site: String },
    /// Print a page as JSON.
    Show { site: String, page: String },
    /// Delete a page.
    Delete { site: String, page: String },
}

/// Lead commands.
#[derive(Debug, Clone, Subcommand)]
pub enum LeadsCommand {
    /// List a site's leads, newest first.
    List {
        site: String,
        #[arg(long, default_value = "20", allow_negative_numbers = true)]
        limit: i64,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        offset: i64,
    },
    /// Count a site's leads.
    Count { site: String },
}

impl Cli {
    /// Validates the configuration and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "Log level '{}' must be one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if let Err(e) = PartitionNaming::new(self.partition_prefix.clone()) {
            errors.push(e.to_string());
        }

        for domain in &self.platform_domain {
            if normalize_hostname(domain).is_none() {
                errors.push(format!("Platform domain '{}' is not a valid hostname", domain));
            }
        }

        if self.pg_max_connections == 0 {
            errors.push("PostgreSQL pool size cannot be 0".to_string());
        }

        if self.pg_connect_timeout == 0 {
            errors.push("PostgreSQL connect timeout cannot be 0".to_string());
        }

        if self.data_dir.as_os_str().is_empty() {
            errors.push("Data directory cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the storage configuration for backend selection.
    pub fn storage_config(&self) -> StorageConfig {
        let mut config = StorageConfig::new()
            .with_data_dir(self.data_dir.clone())
            .with_partition_prefix(self.partition_prefix.clone())
            .with_max_connections(self.pg_max_connections)
            .with_connect_timeout_secs(self.pg_connect_timeout);
        if let Some(url) = &self.database_url {
            config = config.with_database_url(url.clone());
        }
        config
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise both SiteForge crates log at `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "siteforge={level},siteforge_persistence={level}",
            level = level.to_ascii_lowercase()
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
