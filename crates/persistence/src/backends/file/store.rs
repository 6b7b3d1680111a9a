//! Page and lead stores for the flat-file backend.

use async_trait::async_trait;
use chrono::Utc;

use crate::core::store::{lead_order, page_order};
use crate::core::{LeadStore, PageStore};
use crate::error::{ResourceError, StorageResult};
use crate::partition::PartitionProvisioner;
use crate::tenant::SiteId;
use crate::types::{Lead, Page, Pagination};
use crate::validation::{validate_lead, validate_page, validate_page_slug};

use super::atomic::{count_json, create_json, read_json, read_json_dir, remove_json, write_json};
use super::backend::FileBackend;

#[async_trait]
impl PageStore for FileBackend {
    async fn get_page(&self, site_id: &SiteId, page_slug: &str) -> StorageResult<Option<Page>> {
        if validate_page_slug(page_slug).is_err() {
            return Ok(None);
        }
        let partition = self.partition_for(site_id)?;
        read_json(&self.layout.page_path(&partition, page_slug)).await
    }

    async fn list_pages(&self, site_id: &SiteId) -> StorageResult<Vec<Page>> {
        let partition = self.partition_for(site_id)?;
        let mut pages: Vec<Page> = read_json_dir(&self.layout.pages_dir(&partition)).await?;
        pages.sort_by(page_order);
        Ok(pages)
    }

    async fn save_page(&self, site_id: &SiteId, mut page: Page) -> StorageResult<Page> {
        validate_page(&page)?;
        let partition = self.ensure_partition(site_id).await?;

        page.updated_at = Utc::now();
        write_json(&self.layout.page_path(&partition, &page.slug), &page).await?;

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
        let partition = self.partition_for(site_id)?;
        remove_json(&self.layout.page_path(&partition, page_slug)).await
    }
}

#[async_trait]
impl LeadStore for FileBackend {
    async fn insert_lead(&self, site_id: &SiteId, lead: Lead) -> StorageResult<Lead> {
        validate_lead(&lead)?;
        let partition = self.ensure_partition(site_id).await?;

        let created = create_json(&self.layout.lead_path(&partition, &lead.id), &lead).await?;
        if !created {
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
        let partition = self.partition_for(site_id)?;
        let mut leads: Vec<Lead> = read_json_dir(&self.layout.leads_dir(&partition)).await?;
        leads.sort_by(lead_order);
        Ok(page.apply(leads))
    }

    async fn count_leads(&self, site_id: &SiteId) -> StorageResult<u64> {
        let partition = self.partition_for(site_id)?;
        count_json(&self.layout.leads_dir(&partition)).await
    }
}
