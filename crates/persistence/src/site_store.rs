//! The slug-keyed storage facade.
//!
//! Backends key partitions by [`SiteId`]. Callers (the request router, the
//! editor, the CLI) address sites by slug. [`SiteStore`] resolves slugs
//! through the tenant directory and forwards to the per-site stores, and
//! owns the rules that hold regardless of backend: the `home` page cannot
//! be deleted, new sites get a partition and an empty `home` page, and
//! public lead submissions are validated and stamped before they are stored.

use std::sync::Arc;

use crate::core::{BackendKind, DynBackend, StorageBackend};
use crate::error::{ResourceError, StorageError, StorageResult};
use crate::partition::PartitionName;
use crate::tenant::SiteId;
use crate::types::{HOME_PAGE_SLUG, Lead, NewLead, Page, Pagination, Site, User};
use crate::validation::{normalize_site, validate_new_lead};

/// Cloneable handle to the selected backend, addressed by site slug.
#[derive(Clone)]
pub struct SiteStore {
    backend: DynBackend,
}

impl std::fmt::Debug for SiteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl SiteStore {
    /// Wraps a backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Returns the kind of the wrapped backend.
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Returns the wrapped backend.
    pub fn backend(&self) -> &DynBackend {
        &self.backend
    }

    /// Creates the shared structures. Safe to run on every startup.
    pub async fn migrate(&self) -> StorageResult<()> {
        self.backend.initialize().await?;
        Ok(())
    }

    /// Checks that the backend is reachable.
    pub async fn health_check(&self) -> StorageResult<()> {
        self.backend.health_check().await?;
        Ok(())
    }

    async fn require_site(&self, slug: &str) -> StorageResult<Site> {
        self.backend
            .get_site_by_slug(slug)
            .await?
            .ok_or_else(|| StorageError::not_found("site", slug))
    }

    // Sites

    /// Looks up a site by slug.
    pub async fn get_site_by_slug(&self, slug: &str) -> StorageResult<Option<Site>> {
        self.backend.get_site_by_slug(slug).await
    }

    /// Looks up a site by id.
    pub async fn get_site_by_id(&self, id: &SiteId) -> StorageResult<Option<Site>> {
        self.backend.get_site_by_id(id).await
    }

    /// Looks up the site bound to `hostname`.
    pub async fn get_site_by_domain(&self, hostname: &str) -> StorageResult<Option<Site>> {
        self.backend.get_site_by_domain(hostname).await
    }

    /// Lists all sites in creation order.
    pub async fn list_sites(&self) -> StorageResult<Vec<Site>> {
        self.backend.list_sites().await
    }

    /// Inserts or updates a site record.
    pub async fn save_site(&self, site: Site) -> StorageResult<Site> {
        self.backend.save_site(site).await
    }

    /// Creates a new site with its partition and an empty `home` page.
    ///
    /// The partition and `home` page are in place before the site record is
    /// written, so a site that can be looked up always has its `home` page.
    /// A failed call leaves no site record and can be retried with the same
    /// site.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the slug is taken, `InvalidIdentifier` if the id's
    /// partition belongs to another site, plus anything
    /// [`save_site`](Self::save_site) rejects.
    pub async fn create_site(&self, site: Site) -> StorageResult<Site> {
        let site = normalize_site(site)?;
        if self.backend.get_site_by_slug(&site.slug).await?.is_some() {
            return Err(StorageError::already_exists("site", site.slug));
        }

        let partition = self.backend.ensure_partition(&site.id).await?;
        if self.backend.get_page(&site.id, HOME_PAGE_SLUG).await?.is_none() {
            self.backend.save_page(&site.id, Page::home()).await?;
        }
        let site = self.backend.save_site(site).await?;

        tracing::info!(
            site_id = %site.id,
            slug = %site.slug,
            partition = %partition,
            backend = %self.backend.kind(),
            "site created"
        );
        Ok(site)
    }

    /// Binds another domain to a site.
    pub async fn add_domain(&self, slug: &str, domain: &str) -> StorageResult<Site> {
        let mut site = self.require_site(slug).await?;
        site.domains.push(domain.to_string());
        let site = self.backend.save_site(site).await?;
        tracing::info!(site_id = %site.id, slug, domain, "domain bound");
        Ok(site)
    }

    /// Renames a site. Pages, leads and memberships follow automatically.
    pub async fn rename_site_slug(&self, old_slug: &str, new_slug: &str) -> StorageResult<Site> {
        self.backend.rename_site_slug(old_slug, new_slug).await
    }

    // Pages

    /// Reads a page. An unknown site reads as no page.
    pub async fn get_page(&self, site_slug: &str, page_slug: &str) -> StorageResult<Option<Page>> {
        match self.backend.get_site_by_slug(site_slug).await? {
            Some(site) => self.backend.get_page(&site.id, page_slug).await,
            None => Ok(None),
        }
    }

    /// Lists a site's pages, `home` first. An unknown site has no pages.
    pub async fn list_pages(&self, site_slug: &str) -> StorageResult<Vec<Page>> {
        match self.backend.get_site_by_slug(site_slug).await? {
            Some(site) => self.backend.list_pages(&site.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Upserts a page and its whole section list.
    pub async fn save_page(&self, site_slug: &str, page: Page) -> StorageResult<Page> {
        let site = self.require_site(site_slug).await?;
        self.backend.save_page(&site.id, page).await
    }

    /// Deletes a page.
    ///
    /// # Errors
    ///
    /// * `ProtectedResource` for `home`, on any site, before any lookup.
    /// * `NotFound` if the site or the page does not exist.
    pub async fn delete_page(&self, site_slug: &str, page_slug: &str) -> StorageResult<()> {
        if page_slug == HOME_PAGE_SLUG {
            return Err(ResourceError::Protected {
                resource_type: "page".to_string(),
                id: HOME_PAGE_SLUG.to_string(),
                reason: "every site must keep its home page".to_string(),
            }
            .into());
        }

        let site = self.require_site(site_slug).await?;
        if !self.backend.delete_page(&site.id, page_slug).await? {
            return Err(StorageError::not_found("page", page_slug));
        }
        tracing::info!(site_id = %site.id, page = page_slug, "page deleted");
        Ok(())
    }

    // Leads

    /// Stores a fully formed lead. A colliding id fails with `DuplicateId`.
    pub async fn save_lead(&self, site_slug: &str, lead: Lead) -> StorageResult<Lead> {
        let site = self.require_site(site_slug).await?;
        self.backend.insert_lead(&site.id, lead).await
    }

    /// Validates a public form submission, stamps it and stores it.
    pub async fn submit_lead(&self, site_slug: &str, submission: NewLead) -> StorageResult<Lead> {
        validate_new_lead(&submission)?;
        let site = self.require_site(site_slug).await?;
        let lead = self
            .backend
            .insert_lead(&site.id, Lead::from_submission(submission))
            .await?;
        tracing::info!(site_id = %site.id, lead_id = %lead.id, "lead submitted");
        Ok(lead)
    }

    /// Lists leads newest first. `limit` and `offset` are clamped.
    pub async fn list_leads(
        &self,
        site_slug: &str,
        limit: i64,
        offset: i64,
    ) -> StorageResult<Vec<Lead>> {
        match self.backend.get_site_by_slug(site_slug).await? {
            Some(site) => {
                self.backend
                    .list_leads(&site.id, Pagination::new(limit, offset))
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Counts a site's leads.
    pub async fn count_leads(&self, site_slug: &str) -> StorageResult<u64> {
        let site = self.require_site(site_slug).await?;
        self.backend.count_leads(&site.id).await
    }

    // Partitions

    /// Provisions the partition of the site with `site_slug`.
    pub async fn ensure_partition(&self, site_slug: &str) -> StorageResult<PartitionName> {
        let site = self.require_site(site_slug).await?;
        self.backend.ensure_partition(&site.id).await
    }

    /// Returns `true` if the site's partition is fully present.
    pub async fn partition_exists(&self, site_slug: &str) -> StorageResult<bool> {
        let site = self.require_site(site_slug).await?;
        self.backend.partition_exists(&site.id).await
    }

    /// Re-applies partition structures to every known site.
    pub async fn reprovision_all(&self) -> StorageResult<usize> {
        let count = self.backend.reprovision_all().await?;
        tracing::info!(partitions = count, backend = %self.backend.kind(), "partitions reprovisioned");
        Ok(count)
    }

    // Users

    /// Inserts or updates a user.
    pub async fn save_user(&self, user: User) -> StorageResult<User> {
        self.backend.save_user(user).await
    }

    /// Looks up a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.backend.get_user_by_email(email).await
    }

    /// Lists the users who may manage a site.
    pub async fn list_users_for_site(&self, site_slug: &str) -> StorageResult<Vec<User>> {
        let site = self.require_site(site_slug).await?;
        self.backend.list_users_for_site(&site.id).await
    }
}
