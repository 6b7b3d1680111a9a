//! Backend abstraction.
//!
//! This module defines the [`Backend`] trait: the lifecycle surface every
//! physical backend exposes to the selector (identity, health check,
//! startup initialization).

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the physical backend behind a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// PostgreSQL with one schema per site.
    Postgres,
    /// JSON documents on the local filesystem.
    FlatFile,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Postgres => write!(f, "postgres"),
            BackendKind::FlatFile => write!(f, "flat-file"),
        }
    }
}

/// Lifecycle operations shared by every backend.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Returns the backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Verifies the backend is reachable.
    ///
    /// Returns [`BackendError::Unavailable`] when it is not.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Prepares the shared partition: runs schema migrations for PostgreSQL,
    /// creates the root directories for the flat-file backend.
    ///
    /// Safe to call more than once.
    async fn initialize(&self) -> Result<(), BackendError>;
}
