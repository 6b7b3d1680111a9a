//! Flat-file backend handle and partition provisioning.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::{Backend, BackendKind, TenantDirectory};
use crate::error::{BackendError, StorageResult};
use crate::partition::{
    DEFAULT_PARTITION_PREFIX, PartitionName, PartitionNaming, PartitionProvisioner,
    ProvisionedCache, partition_taken,
};
use crate::tenant::SiteId;

use super::atomic::{create_json, read_json};
use super::layout::FileLayout;

/// Configuration for the flat-file backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackendConfig {
    /// Root directory for all documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Prefix for per-site partition directories.
    #[serde(default = "default_partition_prefix")]
    pub partition_prefix: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_partition_prefix() -> String {
    DEFAULT_PARTITION_PREFIX.to_string()
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            partition_prefix: default_partition_prefix(),
        }
    }
}

impl FileBackendConfig {
    /// Creates a configuration rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Sets the partition prefix.
    pub fn with_partition_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.partition_prefix = prefix.into();
        self
    }
}

/// Stores sites, users, pages and leads as JSON documents on disk.
///
/// Writes to the shared partition (sites, users) are serialized by an
/// in-process mutex so uniqueness checks cannot interleave with writes.
/// Page writes are last-write-wins; lead inserts never overwrite.
pub struct FileBackend {
    pub(super) config: FileBackendConfig,
    pub(super) layout: FileLayout,
    naming: PartitionNaming,
    pub(super) shared_write: Mutex<()>,
    provisioned: ProvisionedCache,
}

impl Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("config", &self.config)
            .field("provisioned", &self.provisioned.len())
            .finish_non_exhaustive()
    }
}

impl FileBackend {
    /// Creates a backend. Nothing touches the disk until [`Backend::initialize`]
    /// or the first write.
    ///
    /// Fails with `InvalidIdentifier` if the partition prefix is malformed.
    pub fn new(config: FileBackendConfig) -> StorageResult<Self> {
        let naming = PartitionNaming::new(config.partition_prefix.clone())?;
        Ok(Self {
            layout: FileLayout::new(config.data_dir.clone()),
            config,
            naming,
            shared_write: Mutex::new(()),
            provisioned: ProvisionedCache::new(),
        })
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &FileBackendConfig {
        &self.config
    }

    /// Returns the data directory.
    pub fn data_dir(&self) -> &Path {
        self.layout.root()
    }

    /// Derives the partition of a site without creating it.
    pub fn partition_for(&self, site_id: &SiteId) -> StorageResult<PartitionName> {
        Ok(self.naming.derive(site_id.as_str())?)
    }

    async fn create_partition_dirs(&self, partition: &PartitionName) -> StorageResult<()> {
        tokio::fs::create_dir_all(self.layout.pages_dir(partition)).await?;
        tokio::fs::create_dir_all(self.layout.leads_dir(partition)).await?;
        Ok(())
    }

    /// Reads the id of the site that owns `partition`, if any.
    pub(super) async fn partition_owner(
        &self,
        partition: &PartitionName,
    ) -> StorageResult<Option<SiteId>> {
        read_json(&self.layout.partition_owner_path(partition)).await
    }

    /// Records `site_id` as the owner of `partition`, or fails if another
    /// site already owns it.
    async fn claim_partition(
        &self,
        site_id: &SiteId,
        partition: &PartitionName,
    ) -> StorageResult<()> {
        let marker = self.layout.partition_owner_path(partition);
        if create_json(&marker, site_id).await? {
            return Ok(());
        }
        match self.partition_owner(partition).await? {
            Some(owner) if &owner == site_id => Ok(()),
            Some(owner) => Err(partition_taken(site_id, partition, owner.as_str())),
            // removed between the failed create and the read
            None => Err(partition_taken(site_id, partition, "unknown")),
        }
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FlatFile
    }

    fn name(&self) -> &'static str {
        "flat-file"
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let metadata = tokio::fs::metadata(self.layout.root())
            .await
            .map_err(|e| BackendError::Unavailable {
                backend_name: "flat-file".to_string(),
                message: format!("{}: {}", self.layout.root().display(), e),
            })?;
        if !metadata.is_dir() {
            return Err(BackendError::Unavailable {
                backend_name: "flat-file".to_string(),
                message: format!("{} is not a directory", self.layout.root().display()),
            });
        }
        Ok(())
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        for dir in [
            self.layout.sites_dir(),
            self.layout.users_dir(),
            self.layout.pages_root(),
            self.layout.leads_root(),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| BackendError::Unavailable {
                    backend_name: "flat-file".to_string(),
                    message: format!("cannot create {}: {}", dir.display(), e),
                })?;
        }
        tracing::info!(data_dir = %self.layout.root().display(), "flat-file backend initialized");
        Ok(())
    }
}

#[async_trait]
impl PartitionProvisioner for FileBackend {
    async fn ensure_partition(&self, site_id: &SiteId) -> StorageResult<PartitionName> {
        let partition = self.partition_for(site_id)?;
        if self.provisioned.contains(&partition, site_id) {
            return Ok(partition);
        }

        // create_dir_all is idempotent and tolerates concurrent creators
        self.create_partition_dirs(&partition).await?;
        self.claim_partition(site_id, &partition).await?;
        self.provisioned.insert(partition.clone(), site_id.clone());
        tracing::debug!(site_id = %site_id, partition = %partition, "partition provisioned");
        Ok(partition)
    }

    async fn partition_exists(&self, site_id: &SiteId) -> StorageResult<bool> {
        let partition = self.partition_for(site_id)?;
        let pages = tokio::fs::try_exists(self.layout.pages_dir(&partition)).await?;
        let leads = tokio::fs::try_exists(self.layout.leads_dir(&partition)).await?;
        Ok(pages && leads)
    }

    async fn reprovision_all(&self) -> StorageResult<usize> {
        let sites = self.list_sites().await?;
        for site in &sites {
            let partition = self.partition_for(&site.id)?;
            self.create_partition_dirs(&partition).await?;
            self.claim_partition(&site.id, &partition).await?;
            self.provisioned.insert(partition, site.id.clone());
        }
        tracing::info!(partitions = sites.len(), "flat-file partitions reprovisioned");
        Ok(sites.len())
    }
}
