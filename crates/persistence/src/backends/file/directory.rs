//! Site and user directories for the flat-file backend.

use async_trait::async_trait;
use chrono::Utc;

use crate::core::{TenantDirectory, UserDirectory};
use crate::error::{StorageError, StorageResult, TenantError, ValidationError};
use crate::partition::partition_taken;
use crate::tenant::{SiteId, normalize_hostname};
use crate::types::{Site, User};
use crate::validation::{normalize_site, normalize_user, validate_site_slug};

use super::atomic::{read_json, read_json_dir, write_json};
use super::backend::FileBackend;
use super::layout::is_safe_component;

impl FileBackend {
    /// All sites in creation order.
    async fn all_sites(&self) -> StorageResult<Vec<Site>> {
        let mut sites: Vec<Site> = read_json_dir(&self.layout.sites_dir()).await?;
        sites.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(sites)
    }

    async fn all_users(&self) -> StorageResult<Vec<User>> {
        read_json_dir(&self.layout.users_dir()).await
    }
}

#[async_trait]
impl TenantDirectory for FileBackend {
    async fn get_site_by_slug(&self, slug: &str) -> StorageResult<Option<Site>> {
        Ok(self
            .all_sites()
            .await?
            .into_iter()
            .find(|site| site.slug == slug))
    }

    async fn get_site_by_id(&self, id: &SiteId) -> StorageResult<Option<Site>> {
        if !is_safe_component(id.as_str()) {
            return Ok(None);
        }
        read_json(&self.layout.site_path(id.as_str())).await
    }

    async fn get_site_by_domain(&self, hostname: &str) -> StorageResult<Option<Site>> {
        let Some(host) = normalize_hostname(hostname) else {
            return Ok(None);
        };
        Ok(self
            .all_sites()
            .await?
            .into_iter()
            .find(|site| site.has_domain(&host)))
    }

    async fn list_sites(&self) -> StorageResult<Vec<Site>> {
        self.all_sites().await
    }

    async fn save_site(&self, site: Site) -> StorageResult<Site> {
        let mut site = normalize_site(site)?;
        let partition = self.partition_for(&site.id)?;
        let _guard = self.shared_write.lock().await;

        let existing = self.all_sites().await?;
        let mut previous = None;
        for other in &existing {
            if other.id == site.id {
                if other.slug != site.slug {
                    return Err(ValidationError::ImmutableField {
                        field: "slug".to_string(),
                        message: format!(
                            "site {} is '{}'; use rename_site_slug to change it",
                            site.id, other.slug
                        ),
                    }
                    .into());
                }
                previous = Some(other);
                continue;
            }
            if other.slug == site.slug {
                return Err(StorageError::already_exists("site", site.slug.clone()));
            }
            if self.partition_for(&other.id).ok().as_ref() == Some(&partition) {
                return Err(partition_taken(&site.id, &partition, other.id.as_str()));
            }
            if let Some(domain) = site.domains.iter().find(|d| other.has_domain(d)) {
                return Err(TenantError::DomainClaimed {
                    domain: domain.clone(),
                    owner: other.slug.clone(),
                }
                .into());
            }
        }

        match previous {
            Some(previous) => site.created_at = previous.created_at,
            None => {
                if let Some(owner) = self.partition_owner(&partition).await?
                    && owner != site.id
                {
                    return Err(partition_taken(&site.id, &partition, owner.as_str()));
                }
            }
        }
        site.updated_at = Utc::now();

        write_json(&self.layout.site_path(site.id.as_str()), &site).await?;
        tracing::debug!(site_id = %site.id, slug = %site.slug, "site saved");
        Ok(site)
    }

    async fn rename_site_slug(&self, old_slug: &str, new_slug: &str) -> StorageResult<Site> {
        validate_site_slug(new_slug)?;
        let _guard = self.shared_write.lock().await;

        let sites = self.all_sites().await?;
        let mut site = sites
            .iter()
            .find(|s| s.slug == old_slug)
            .cloned()
            .ok_or_else(|| StorageError::not_found("site", old_slug))?;

        if old_slug == new_slug {
            return Ok(site);
        }
        if sites.iter().any(|s| s.slug == new_slug) {
            return Err(StorageError::already_exists("site", new_slug));
        }

        site.slug = new_slug.to_string();
        site.updated_at = Utc::now();
        write_json(&self.layout.site_path(site.id.as_str()), &site).await?;

        tracing::info!(site_id = %site.id, old_slug, new_slug, "site slug renamed");
        Ok(site)
    }
}

#[async_trait]
impl UserDirectory for FileBackend {
    async fn save_user(&self, user: User) -> StorageResult<User> {
        let mut user = normalize_user(user)?;
        let _guard = self.shared_write.lock().await;

        for other in self.all_users().await? {
            if other.id == user.id {
                user.created_at = other.created_at;
            } else if other.email == user.email {
                return Err(StorageError::already_exists("user", user.email.clone()));
            }
        }

        write_json(&self.layout.user_path(&user.id), &user).await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.trim().to_ascii_lowercase();
        Ok(self
            .all_users()
            .await?
            .into_iter()
            .find(|user| user.email == email))
    }

    async fn list_users_for_site(&self, site_id: &SiteId) -> StorageResult<Vec<User>> {
        let mut users: Vec<User> = self
            .all_users()
            .await?
            .into_iter()
            .filter(|user| user.site_ids.contains(site_id))
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}
