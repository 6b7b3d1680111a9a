//! Storage backend implementations.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Flat file | always | JSON documents under a data directory; the fallback |
//! | PostgreSQL | `postgres` | Shared schema plus one schema per site |
//!
//! Callers normally let [`select_backend`](crate::select_backend) choose
//! between them from a [`StorageConfig`](crate::StorageConfig).

pub mod file;

#[cfg(feature = "postgres")]
pub mod postgres;
