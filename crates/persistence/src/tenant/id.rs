//! Site identifier type.
//!
//! This module defines the [`SiteId`] type, the immutable key that every
//! storage partition is derived from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque, immutable site identifier.
///
/// Unlike a site's slug, which owners may rename, the `SiteId` never changes
/// once a site exists. Partitions, page tables, lead tables and user
/// memberships are all keyed by it, so renaming a slug never has to move
/// tenant data.
///
/// # Examples
///
/// ```
/// use siteforge_persistence::tenant::SiteId;
///
/// let generated = SiteId::generate();
/// assert_eq!(generated.as_str().len(), 32);
///
/// let imported = SiteId::new("legacy-42");
/// assert_eq!(imported.as_str(), "legacy-42");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Creates a site ID from an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, collision-resistant site ID (UUID v4, simple form).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the site ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SiteId({})", self.0)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SiteId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for SiteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SiteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SiteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
