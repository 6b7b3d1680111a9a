//! Shared-partition directories: sites and users.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::tenant::SiteId;
use crate::types::{Site, User};

/// CRUD over [`Site`] records in the shared partition.
///
/// Sites are never deleted.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Looks up a site by its current slug.
    async fn get_site_by_slug(&self, slug: &str) -> StorageResult<Option<Site>>;

    /// Looks up a site by its immutable id.
    async fn get_site_by_id(&self, id: &SiteId) -> StorageResult<Option<Site>>;

    /// Looks up the site a hostname is bound to.
    ///
    /// The hostname is normalized first (case, port, trailing dot). If more
    /// than one site claims it, the earliest created wins.
    async fn get_site_by_domain(&self, hostname: &str) -> StorageResult<Option<Site>>;

    /// Lists all sites in creation order.
    async fn list_sites(&self) -> StorageResult<Vec<Site>>;

    /// Inserts or updates a site, keyed by slug.
    ///
    /// # Errors
    ///
    /// * `Validation` for a malformed slug, name or domain, or when an
    ///   existing site's slug would change (use [`rename_site_slug`](Self::rename_site_slug)).
    /// * `AlreadyExists` when the slug belongs to another site.
    /// * `DomainClaimed` when a domain is already bound to another site.
    async fn save_site(&self, site: Site) -> StorageResult<Site>;

    /// Changes a site's slug.
    ///
    /// Partitions are keyed by [`SiteId`], so no page, lead or user record
    /// moves; only the site record and its slug index change.
    ///
    /// # Errors
    ///
    /// * `Validation` if `new_slug` is malformed.
    /// * `NotFound` if no site has `old_slug`.
    /// * `AlreadyExists` if `new_slug` is taken.
    async fn rename_site_slug(&self, old_slug: &str, new_slug: &str) -> StorageResult<Site>;
}

/// CRUD over [`User`] records in the shared partition.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Inserts or updates a user. Emails are unique, compared lowercase.
    async fn save_user(&self, user: User) -> StorageResult<User>;

    /// Looks up a user by email, case-insensitively.
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Lists users that may manage `site_id`, ordered by email.
    async fn list_users_for_site(&self, site_id: &SiteId) -> StorageResult<Vec<User>>;
}
