//! Core storage traits.
//!
//! A physical backend implements every trait below; [`StorageBackend`] is
//! the union the rest of the crate works with:
//!
//! ```text
//! StorageBackend
//!     ├── Backend               lifecycle (health check, initialize)
//!     ├── PartitionProvisioner  per-site partitions
//!     ├── TenantDirectory       sites (shared partition)
//!     ├── UserDirectory         users (shared partition)
//!     ├── PageStore             pages (site partition)
//!     └── LeadStore             leads (site partition)
//! ```

use std::sync::Arc;

pub mod backend;
pub mod directory;
pub mod store;

pub use backend::{Backend, BackendKind};
pub use directory::{TenantDirectory, UserDirectory};
pub use store::{LeadStore, PageStore};

use crate::partition::PartitionProvisioner;

/// Everything a backend must provide to sit behind [`SiteStore`](crate::SiteStore).
pub trait StorageBackend:
    Backend + PartitionProvisioner + TenantDirectory + UserDirectory + PageStore + LeadStore
{
}

impl<T> StorageBackend for T where
    T: Backend + PartitionProvisioner + TenantDirectory + UserDirectory + PageStore + LeadStore
{
}

/// Shared handle to the backend selected at startup.
pub type DynBackend = Arc<dyn StorageBackend>;
