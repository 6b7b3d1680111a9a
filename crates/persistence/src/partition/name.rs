//! Partition name derivation.
//!
//! Turns a tenant identifier into a name that is legal as an unquoted
//! identifier in the relational backend and as a directory name in the
//! flat-file backend. Derivation is a pure function of the identifier and
//! the configured prefix, so provisioning the same tenant twice always
//! targets the same partition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TenantError;

/// Default prefix for tenant partition names.
pub const DEFAULT_PARTITION_PREFIX: &str = "tenant_";

/// Maximum length of the sanitized identifier core, before the prefix is added.
///
/// This mirrors PostgreSQL's 63-byte identifier limit (`NAMEDATALEN - 1`).
/// Backends with a hard limit on the full name check it separately.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A sanitized storage-partition name such as `tenant_3f2a9c`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionName(String);

impl PartitionName {
    /// Derives the partition name for `identifier` with the default prefix.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::InvalidIdentifier`] when nothing alphanumeric
    /// survives sanitization, or when the sanitized core is longer than
    /// [`MAX_IDENTIFIER_LEN`].
    ///
    /// # Examples
    ///
    /// ```
    /// use siteforge_persistence::partition::PartitionName;
    ///
    /// let name = PartitionName::derive("My-Site").unwrap();
    /// assert_eq!(name.as_str(), "tenant_my_site");
    /// assert!(PartitionName::derive("--!!--").is_err());
    /// ```
    pub fn derive(identifier: &str) -> Result<Self, TenantError> {
        PartitionNaming::default().derive(identifier)
    }

    /// Returns the partition name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the full name in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a derived name is never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartitionName({})", self.0)
    }
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PartitionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives partition names with a fixed prefix.
#[derive(Debug, Clone)]
pub struct PartitionNaming {
    prefix: String,
}

impl Default for PartitionNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PARTITION_PREFIX.to_string(),
        }
    }
}

impl PartitionNaming {
    /// Creates a naming scheme with a custom prefix.
    ///
    /// The prefix must start with a lowercase letter and contain only
    /// lowercase letters, digits and underscores, so that no derived name can
    /// collide with a system namespace such as `pg_catalog` or `public`.
    pub fn new(prefix: impl Into<String>) -> Result<Self, TenantError> {
        let prefix = prefix.into();
        let mut chars = prefix.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            && !prefix.starts_with("pg_");
        if !valid {
            return Err(TenantError::InvalidIdentifier {
                identifier: prefix,
                reason: "partition prefix must match [a-z][a-z0-9_]* and must not start with pg_"
                    .to_string(),
            });
        }
        Ok(Self { prefix })
    }

    /// Returns the configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derives the partition name for `identifier`.
    pub fn derive(&self, identifier: &str) -> Result<PartitionName, TenantError> {
        let core = sanitize_identifier(identifier);

        if core.is_empty() {
            return Err(TenantError::InvalidIdentifier {
                identifier: identifier.to_string(),
                reason: "no letters or digits remain after sanitization".to_string(),
            });
        }

        if core.len() > MAX_IDENTIFIER_LEN {
            return Err(TenantError::InvalidIdentifier {
                identifier: identifier.to_string(),
                reason: format!(
                    "sanitized identifier is {} characters, maximum is {}",
                    core.len(),
                    MAX_IDENTIFIER_LEN
                ),
            });
        }

        Ok(PartitionName(format!("{}{}", self.prefix, core)))
    }
}

/// Lowercases `identifier`, collapses every run of characters outside
/// `[a-z0-9]` into one underscore, and trims underscores from both ends.
pub(crate) fn sanitize_identifier(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    let mut pending_separator = false;

    for c in identifier.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    out
}
