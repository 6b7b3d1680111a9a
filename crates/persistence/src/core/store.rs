//! Per-site stores: pages and leads.
//!
//! These traits are keyed by [`SiteId`]; the slug-keyed contract lives on
//! [`SiteStore`](crate::SiteStore), which resolves slugs through the tenant
//! directory first.

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::tenant::SiteId;
use crate::types::{HOME_PAGE_SLUG, Lead, Page, Pagination};

/// Pages stored in a site's partition.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Reads one page. A missing partition reads as no page.
    async fn get_page(&self, site_id: &SiteId, page_slug: &str) -> StorageResult<Option<Page>>;

    /// Lists pages with `home` first, then by slug.
    async fn list_pages(&self, site_id: &SiteId) -> StorageResult<Vec<Page>>;

    /// Upserts a page, replacing its whole section list.
    ///
    /// Provisions the partition on first use. Concurrent saves of the same
    /// page are last-write-wins.
    async fn save_page(&self, site_id: &SiteId, page: Page) -> StorageResult<Page>;

    /// Deletes a page. Returns `false` if it did not exist.
    ///
    /// The protected `home` page is refused by the caller before this runs.
    async fn delete_page(&self, site_id: &SiteId, page_slug: &str) -> StorageResult<bool>;
}

/// Append-only leads stored in a site's partition.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Inserts a lead. An existing id fails with `DuplicateId`.
    async fn insert_lead(&self, site_id: &SiteId, lead: Lead) -> StorageResult<Lead>;

    /// Lists leads newest first within the pagination window.
    async fn list_leads(&self, site_id: &SiteId, page: Pagination) -> StorageResult<Vec<Lead>>;

    /// Counts all leads of a site.
    async fn count_leads(&self, site_id: &SiteId) -> StorageResult<u64>;
}

/// Orders pages with `home` first, then by slug.
pub(crate) fn page_order(a: &Page, b: &Page) -> Ordering {
    match (a.slug == HOME_PAGE_SLUG, b.slug == HOME_PAGE_SLUG) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.slug.cmp(&b.slug),
    }
}

/// Orders leads newest first, ties broken by id descending.
pub(crate) fn lead_order(a: &Lead, b: &Lead) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}
