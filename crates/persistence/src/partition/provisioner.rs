//! Partition provisioning.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{StorageError, StorageResult, TenantError};
use crate::tenant::SiteId;

use super::name::PartitionName;

/// Guarantees that a site's storage partition exists.
///
/// Implementations must be idempotent: provisioning the same site twice,
/// sequentially or concurrently, leaves exactly one set of structures and
/// returns the same [`PartitionName`] both times.
#[async_trait]
pub trait PartitionProvisioner: Send + Sync {
    /// Creates the partition for `site_id` and its `pages` and `leads`
    /// collections if they are missing.
    ///
    /// # Errors
    ///
    /// * `InvalidIdentifier` if the id cannot be turned into a partition name.
    /// * `BackendUnavailable` if the backend cannot be reached.
    async fn ensure_partition(&self, site_id: &SiteId) -> StorageResult<PartitionName>;

    /// Returns `true` if the partition for `site_id` is fully present.
    async fn partition_exists(&self, site_id: &SiteId) -> StorageResult<bool>;

    /// Re-applies partition DDL to every registered partition.
    ///
    /// Returns the number of partitions visited.
    async fn reprovision_all(&self) -> StorageResult<usize>;
}

/// In-process record of partitions already provisioned by this process,
/// together with the site that owns each one.
///
/// A hit only skips redundant DDL; a miss always falls through to the
/// idempotent provisioning path, which checks ownership again.
#[derive(Debug, Default)]
pub struct ProvisionedCache {
    owners: RwLock<HashMap<PartitionName, SiteId>>,
}

impl ProvisionedCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `partition` was provisioned for `site_id` earlier
    /// in this process.
    pub fn contains(&self, partition: &PartitionName, site_id: &SiteId) -> bool {
        self.owners.read().get(partition) == Some(site_id)
    }

    /// Records a successfully provisioned partition and its owner.
    pub fn insert(&self, partition: PartitionName, site_id: SiteId) {
        self.owners.write().insert(partition, site_id);
    }

    /// Drops every entry, forcing the next call per partition to re-check.
    pub fn clear(&self) {
        self.owners.write().clear();
    }

    /// Number of cached partitions.
    pub fn len(&self) -> usize {
        self.owners.read().len()
    }

    /// Returns `true` if nothing has been provisioned yet.
    pub fn is_empty(&self) -> bool {
        self.owners.read().is_empty()
    }
}

/// Error for a site whose derived partition already belongs to another site.
pub(crate) fn partition_taken(
    site_id: &SiteId,
    partition: &PartitionName,
    owner: &str,
) -> StorageError {
    TenantError::InvalidIdentifier {
        identifier: site_id.to_string(),
        reason: format!("partition {} already belongs to site {}", partition, owner),
    }
    .into()
}
