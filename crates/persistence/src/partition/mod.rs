//! Storage partitions.
//!
//! A partition is the isolated namespace holding one site's pages and leads:
//! a PostgreSQL schema for the relational backend, a pair of directories for
//! the flat-file backend. Partition names are derived from the immutable
//! [`SiteId`](crate::tenant::SiteId), never from the editable slug.
//!
//! - [`PartitionName`] / [`PartitionNaming`] - pure name derivation
//! - [`PartitionProvisioner`] - idempotent creation of a site's partition
//! - [`SchemaPerTenantStrategy`] - the DDL used by the PostgreSQL backend

mod name;
mod provisioner;
mod schema_per_tenant;

pub use name::{DEFAULT_PARTITION_PREFIX, MAX_IDENTIFIER_LEN, PartitionName, PartitionNaming};
pub use provisioner::{PartitionProvisioner, ProvisionedCache};
pub(crate) use provisioner::partition_taken;
pub use schema_per_tenant::{SchemaPerTenantConfig, SchemaPerTenantStrategy};
