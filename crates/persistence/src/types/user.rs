//! Platform users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tenant::SiteId;

/// A user allowed to manage one or more sites.
///
/// Memberships reference sites by [`SiteId`], so slug renames never touch
/// user records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque identifier.
    pub id: String,
    /// Unique, stored lowercase.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Platform role.
    #[serde(default)]
    pub role: UserRole,
    /// Sites this user may manage.
    #[serde(default)]
    pub site_ids: Vec<SiteId>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates an owner with a fresh id.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            email: email.into(),
            name: name.into(),
            role: UserRole::Owner,
            site_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Grants access to a site.
    pub fn with_site(mut self, site_id: SiteId) -> Self {
        self.site_ids.push(site_id);
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Returns `true` if the user may manage `site_id`.
    pub fn can_manage(&self, site_id: &SiteId) -> bool {
        self.role == UserRole::Admin || self.site_ids.contains(site_id)
    }
}

/// Platform role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Manages every site.
    Admin,
    /// Manages the sites listed in `site_ids`.
    #[default]
    Owner,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_manage() {
        let site = SiteId::new("s1");
        let owner = User::new("a@x.com", "A").with_site(site.clone());
        assert!(owner.can_manage(&site));
        assert!(!owner.can_manage(&SiteId::new("s2")));

        let admin = User::new("b@x.com", "B").with_role(UserRole::Admin);
        assert!(admin.can_manage(&SiteId::new("s2")));
    }
}
