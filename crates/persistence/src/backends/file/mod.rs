//! Flat-file backend.
//!
//! Stores every record as a pretty-printed JSON document under one data
//! directory. Used when no database URL is configured, and as the startup
//! fallback when PostgreSQL is unreachable.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use siteforge_persistence::backends::file::{FileBackend, FileBackendConfig};
//! use siteforge_persistence::SiteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = FileBackend::new(FileBackendConfig::new("./data"))?;
//! let store = SiteStore::new(Arc::new(backend));
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod atomic;
mod backend;
mod directory;
mod layout;
mod store;

pub use backend::{FileBackend, FileBackendConfig};
