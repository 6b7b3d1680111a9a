//! On-disk layout of the flat-file backend.
//!
//! ```text
//! <data_dir>/
//!     sites/<site_id>.json
//!     users/<user_id>.json
//!     pages/<partition>/.owner
//!     pages/<partition>/<page_slug>.json
//!     leads/<partition>/<lead_id>.json
//! ```

use std::path::{Path, PathBuf};

use crate::partition::PartitionName;

/// Path builder rooted at the data directory.
#[derive(Debug, Clone)]
pub(crate) struct FileLayout {
    root: PathBuf,
}

impl FileLayout {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn sites_dir(&self) -> PathBuf {
        self.root.join("sites")
    }

    pub(crate) fn site_path(&self, site_id: &str) -> PathBuf {
        self.sites_dir().join(json_name(site_id))
    }

    pub(crate) fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    pub(crate) fn user_path(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(json_name(user_id))
    }

    pub(crate) fn pages_root(&self) -> PathBuf {
        self.root.join("pages")
    }

    pub(crate) fn pages_dir(&self, partition: &PartitionName) -> PathBuf {
        self.pages_root().join(partition.as_str())
    }

    /// Marker holding the id of the site that owns `partition`.
    pub(crate) fn partition_owner_path(&self, partition: &PartitionName) -> PathBuf {
        self.pages_dir(partition).join(".owner")
    }

    pub(crate) fn page_path(&self, partition: &PartitionName, page_slug: &str) -> PathBuf {
        self.pages_dir(partition).join(json_name(page_slug))
    }

    pub(crate) fn leads_root(&self) -> PathBuf {
        self.root.join("leads")
    }

    pub(crate) fn leads_dir(&self, partition: &PartitionName) -> PathBuf {
        self.leads_root().join(partition.as_str())
    }

    pub(crate) fn lead_path(&self, partition: &PartitionName, lead_id: &str) -> PathBuf {
        self.leads_dir(partition).join(json_name(lead_id))
    }
}

/// Returns `true` if `name` can be used as a single path component.
///
/// Callers validate ids and slugs before building paths; this is the last
/// line that keeps a lookup inside its directory.
pub(crate) fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn json_name(stem: &str) -> String {
    format!("{}.json", stem)
}
