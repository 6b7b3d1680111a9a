//! Page and lead stores for the PostgreSQL backend.
//!
//! Every query targets the site's own schema by fully qualified name. Reads
//! against a partition that was never provisioned return empty results.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tokio_postgres::Row;

use crate::core::{LeadStore, PageStore};
use crate::error::{ResourceError, StorageError, StorageResult};
use crate::partition::PartitionProvisioner;
use crate::tenant::SiteId;
use crate::types::{HOME_PAGE_SLUG, Lead, Page, Pagination, Section};
use crate::validation::{validate_lead, validate_page, validate_page_slug};

use super::backend::{PostgresBackend, is_missing_relation};

fn page_from_row(row: &Row) -> StorageResult<Page> {
    let sections: serde_json::Value = row.get("sections");
    let sections: Vec<Section> = serde_json::from_value(sections)?;
    Ok(Page {
        slug: row.get("slug"),
        title: row.get("title"),
        sections,
        updated_at: row.get::<_, DateTime<Utc>>("updated_at"),
    })
}

fn lead_from_row(row: &Row) -> Lead {
    Lead {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}

/// Maps a missing tenant relation to `fallback`, other errors through.
fn or_unprovisioned<T>(err: tokio_postgres::Error, fallback: T) -> StorageResult<T> {
    if is_missing_relation(&err) {
        Ok(fallback)
    } else {
        Err(StorageError::from(err))
    }
}

impl PostgresBackend {
    fn tenant_table(&self, site_id: &SiteId, table: &str) -> StorageResult<String> {
        let partition = self.strategy.partition_for(site_id)?;
        Ok(self.strategy.tenant_table(&partition, table))
    }
}

#[async_trait]
impl PageStore for PostgresBackend {
    async fn get_page(&self, site_id: &SiteId, page_slug: &str) -> StorageResult<Option<Page>> {
        if validate_page_slug(page_slug).is_err() {
            return Ok(None);
        }
        let pages = self.tenant_table(site_id, "pages")?;
        let client = self.get_client().await?;
        let sql = format!(
            "SELECT slug, title, sections, updated_at FROM {} WHERE slug = $1",
            pages
        );
        match client.query_opt(sql.as_str(), &[&page_slug]).await {
            Ok(row) => row.as_ref().map(page_from_row).transpose(),
            Err(e) => or_unprovisioned(e, None),
        }
    }

    async fn list_pages(&self, site_id: &SiteId) -> StorageResult<Vec<Page>> {
        let pages = self.tenant_table(site_id, "pages")?;
        let client = self.get_client().await?;
        let sql = format!(
            "SELECT slug, title, sections, updated_at FROM {}
             ORDER BY (slug = $1) DESC, slug",
            pages
        );
        match client.query(sql.as_str(), &[&HOME_PAGE_SLUG]).await {
            Ok(rows) => rows.iter().map(page_from_row).collect(),
            Err(e) => or_unprovisioned(e, Vec::new()),
        }
    }

    async fn save_page(&self, site_id: &SiteId, mut page: Page) -> StorageResult<Page> {
        validate_page(&page)?;
        let partition = self.ensure_partition(site_id).await?;
        let pages = self.strategy.tenant_table(&partition, "pages");

        // TIMESTAMPTZ keeps microseconds
        page.updated_at = Utc::now().trunc_subsecs(6);
        let sections = serde_json::to_value(&page.sections)?;

        let client = self.get_client().await?;
        client
            .execute(
                format!(
                    "INSERT INTO {} (slug, title, sections, updated_at)
                     VALUES ($1, $2, $3, $4)
                     ON CONFLICT (slug) DO UPDATE
                     SET title = EXCLUDED.title,
                         sections = EXCLUDED.sections,
                         updated_at = EXCLUDED.updated_at",
                    pages
                )
                .as_str(),
                &[&page.slug, &page.title, &sections, &page.updated_at],
            )
            .await?;

        tracing::debug!(
            site_id = %site_id,
            partition = %partition,
            page = %page.slug,
            sections = page.sections.len(),
            "page saved"
        );
        Ok(page)
    }

    async fn delete_page(&self, site_id: &SiteId, page_slug: &str) -> StorageResult<bool> {
        if validate_page_slug(page_slug).is_err() {
            return Ok(false);
        }
        let pages = self.tenant_table(site_id, "pages")?;
        let client = self.get_client().await?;
        let sql = format!("DELETE FROM {} WHERE slug = $1", pages);
        match client.execute(sql.as_str(), &[&page_slug]).await {
            Ok(n) => Ok(n > 0),
            Err(e) => or_unprovisioned(e, false),
        }
    }
}

#[async_trait]
impl LeadStore for PostgresBackend {
    async fn insert_lead(&self, site_id: &SiteId, mut lead: Lead) -> StorageResult<Lead> {
        validate_lead(&lead)?;
        lead.created_at = lead.created_at.trunc_subsecs(6);
        let partition = self.ensure_partition(site_id).await?;
        let leads = self.strategy.tenant_table(&partition, "leads");

        let client = self.get_client().await?;
        let inserted = client
            .execute(
                format!(
                    "INSERT INTO {} (id, name, email, message, created_at)
                     VALUES ($1, $2, $3, $4, $5)
                     ON CONFLICT (id) DO NOTHING",
                    leads
                )
                .as_str(),
                &[
                    &lead.id,
                    &lead.name,
                    &lead.email,
                    &lead.message,
                    &lead.created_at,
                ],
            )
            .await?;

        if inserted == 0 {
            return Err(ResourceError::DuplicateId {
                resource_type: "lead".to_string(),
                id: lead.id,
            }
            .into());
        }

        tracing::debug!(site_id = %site_id, partition = %partition, lead_id = %lead.id, "lead stored");
        Ok(lead)
    }

    async fn list_leads(&self, site_id: &SiteId, page: Pagination) -> StorageResult<Vec<Lead>> {
        let leads = self.tenant_table(site_id, "leads")?;
        let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let client = self.get_client().await?;
        let sql = format!(
            "SELECT id, name, email, message, created_at FROM {}
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2",
            leads
        );
        match client.query(sql.as_str(), &[&limit, &offset]).await {
            Ok(rows) => Ok(rows.iter().map(lead_from_row).collect()),
            Err(e) => or_unprovisioned(e, Vec::new()),
        }
    }

    async fn count_leads(&self, site_id: &SiteId) -> StorageResult<u64> {
        let leads = self.tenant_table(site_id, "leads")?;
        let client = self.get_client().await?;
        let sql = format!("SELECT count(*) FROM {}", leads);
        match client.query_one(sql.as_str(), &[]).await {
            Ok(row) => Ok(u64::try_from(row.get::<_, i64>(0)).unwrap_or(0)),
            Err(e) => or_unprovisioned(e, 0),
        }
    }
}
