//! PostgreSQL backend.
//!
//! Shared records (sites, domains, users, the partition registry) live in one
//! shared schema. Each site's pages and leads live in a schema of their own,
//! named by [`SchemaPerTenantStrategy`](crate::partition::SchemaPerTenantStrategy)
//! from the site's immutable id and created on first write.
//!
//! Connections come from a deadpool-postgres pool. The pool is shared by all
//! tenants, so every statement uses fully qualified table names and the
//! session `search_path` is never touched.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use siteforge_persistence::backends::postgres::{PostgresBackend, PostgresConfig};
//! use siteforge_persistence::SiteStore;
//! use siteforge_persistence::types::Site;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PostgresConfig::from_url("postgres://siteforge@localhost/siteforge");
//! let backend = PostgresBackend::new(config).await?;
//! backend.init_schema().await?;
//!
//! let store = SiteStore::new(Arc::new(backend));
//! let site = store.create_site(Site::new("plumber", "Joe's Plumbing")).await?;
//! println!("created {}", site.id);
//! # Ok(())
//! # }
//! ```

mod backend;
mod directory;
mod provisioner;
pub(crate) mod schema;
mod store;

pub use backend::{PostgresBackend, PostgresConfig, PostgresSslMode};
