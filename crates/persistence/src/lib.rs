//! SiteForge storage core.
//!
//! This crate stores the data of a multi-tenant website builder: site
//! records and their bound domains, the users who manage them, and each
//! site's pages and contact-form leads. Every site's pages and leads live in
//! a partition of their own, derived from the site's immutable id.
//!
//! # Backends
//!
//! - **PostgreSQL** (feature `postgres`, default): one shared schema for
//!   sites, domains and users; one schema per site for pages and leads.
//! - **Flat file**: JSON documents under a data directory. Used when no
//!   database is configured, and as the startup fallback when the database
//!   cannot be reached.
//!
//! # Architecture
//!
//! - [`partition`] - Partition name derivation and provisioning
//! - [`core`] - Backend traits (directories, stores, lifecycle)
//! - [`backends`] - Flat-file and PostgreSQL implementations
//! - [`site_store`] - The slug-keyed facade callers work with
//! - [`selector`] - Startup backend selection with fallback
//! - [`tenant`] - Site ids, hostname normalization, domain resolution
//! - [`types`] - Sites, pages, sections, leads, users
//! - [`validation`] - Input rules shared by every backend
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```no_run
//! use siteforge_persistence::{StorageConfig, select_backend};
//! use siteforge_persistence::tenant::DomainResolver;
//! use siteforge_persistence::types::{NewLead, Site};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let selected = select_backend(&StorageConfig::new().with_data_dir("./data")).await?;
//! let store = selected.store;
//!
//! store.create_site(Site::new("plumber", "Joe's Plumbing")).await?;
//! store
//!     .submit_lead("plumber", NewLead::new("Jane", "jane@example.com", "Leaky tap"))
//!     .await?;
//!
//! let resolver = DomainResolver::new(store.clone()).with_platform_domain("siteforge.app");
//! let site = resolver.resolve_site("plumber.siteforge.app").await?;
//! assert!(site.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod partition;
pub mod selector;
pub mod site_store;
pub mod tenant;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::StorageConfig;
pub use error::{ErrorKind, StorageError, StorageResult};
pub use selector::{SelectedBackend, StorageBackendMode, select_backend};
pub use site_store::SiteStore;
pub use tenant::{DomainResolver, SiteId};

// Re-export core traits
pub use core::{
    Backend, BackendKind, DynBackend, LeadStore, PageStore, StorageBackend, TenantDirectory,
    UserDirectory,
};
pub use partition::{PartitionName, PartitionProvisioner};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
