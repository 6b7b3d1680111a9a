//! Site and user directories for the PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;

use crate::core::{TenantDirectory, UserDirectory};
use crate::error::{StorageError, StorageResult, TenantError, ValidationError};
use crate::partition::partition_taken;
use crate::tenant::{SiteId, normalize_hostname};
use crate::types::{Site, User};
use crate::validation::{normalize_site, normalize_user, validate_site_slug};

use super::backend::{PostgresBackend, is_unique_violation};

fn site_from_row(row: &Row) -> StorageResult<Site> {
    let data: serde_json::Value = row.get("data");
    Ok(serde_json::from_value(data)?)
}

fn user_from_row(row: &Row) -> StorageResult<User> {
    let data: serde_json::Value = row.get("data");
    Ok(serde_json::from_value(data)?)
}

impl PostgresBackend {
    async fn query_site(
        &self,
        sql: &str,
        param: &(dyn tokio_postgres::types::ToSql + Sync),
    ) -> StorageResult<Option<Site>> {
        let client = self.get_client().await?;
        let row = client.query_opt(sql, &[param]).await?;
        row.as_ref().map(site_from_row).transpose()
    }
}

#[async_trait]
impl TenantDirectory for PostgresBackend {
    async fn get_site_by_slug(&self, slug: &str) -> StorageResult<Option<Site>> {
        let sql = format!("SELECT data FROM {} WHERE slug = $1", self.shared("sites"));
        self.query_site(&sql, &slug).await
    }

    async fn get_site_by_id(&self, id: &SiteId) -> StorageResult<Option<Site>> {
        let sql = format!("SELECT data FROM {} WHERE id = $1", self.shared("sites"));
        self.query_site(&sql, &id.as_str()).await
    }

    async fn get_site_by_domain(&self, hostname: &str) -> StorageResult<Option<Site>> {
        let Some(host) = normalize_hostname(hostname) else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT s.data FROM {} s JOIN {} d ON d.site_id = s.id
             WHERE d.domain = $1
             ORDER BY s.created_at, s.id
             LIMIT 1",
            self.shared("sites"),
            self.shared("site_domains")
        );
        self.query_site(&sql, &host).await
    }

    async fn list_sites(&self) -> StorageResult<Vec<Site>> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                format!(
                    "SELECT data FROM {} ORDER BY created_at, id",
                    self.shared("sites")
                )
                .as_str(),
                &[],
            )
            .await?;
        rows.iter().map(site_from_row).collect()
    }

    async fn save_site(&self, site: Site) -> StorageResult<Site> {
        let mut site = normalize_site(site)?;
        let partition = self.strategy.partition_for(&site.id)?;
        let sites = self.shared("sites");
        let domains = self.shared("site_domains");

        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let slug_owner = tx
            .query_opt(
                format!("SELECT id FROM {} WHERE slug = $1 FOR UPDATE", sites).as_str(),
                &[&site.slug],
            )
            .await?;
        if let Some(row) = slug_owner
            && row.get::<_, &str>(0) != site.id.as_str()
        {
            return Err(StorageError::already_exists("site", site.slug.clone()));
        }

        let existing = tx
            .query_opt(
                format!("SELECT slug, created_at FROM {} WHERE id = $1 FOR UPDATE", sites)
                    .as_str(),
                &[&site.id.as_str()],
            )
            .await?;
        if let Some(row) = &existing {
            let current_slug: String = row.get(0);
            if current_slug != site.slug {
                return Err(ValidationError::ImmutableField {
                    field: "slug".to_string(),
                    message: format!(
                        "site {} is '{}'; use rename_site_slug to change it",
                        site.id, current_slug
                    ),
                }
                .into());
            }
            site.created_at = row.get::<_, DateTime<Utc>>(1);
        } else {
            let registered = tx
                .query_opt(
                    format!(
                        "SELECT site_id FROM {} WHERE schema_name = $1 AND site_id <> $2",
                        self.shared("partitions")
                    )
                    .as_str(),
                    &[&partition.as_str(), &site.id.as_str()],
                )
                .await?;
            if let Some(row) = registered {
                return Err(partition_taken(&site.id, &partition, row.get::<_, &str>(0)));
            }

            // sites saved but not yet provisioned are not in the registry
            let others = tx
                .query(format!("SELECT id FROM {}", sites).as_str(), &[])
                .await?;
            for row in others {
                let other = SiteId::new(row.get::<_, String>(0));
                if self.strategy.partition_for(&other).ok().as_ref() == Some(&partition) {
                    return Err(partition_taken(&site.id, &partition, other.as_str()));
                }
            }
        }

        for domain in &site.domains {
            let claimed = tx
                .query_opt(
                    format!(
                        "SELECT s.slug FROM {} d JOIN {} s ON s.id = d.site_id
                         WHERE d.domain = $1 AND d.site_id <> $2",
                        domains, sites
                    )
                    .as_str(),
                    &[domain, &site.id.as_str()],
                )
                .await?;
            if let Some(row) = claimed {
                return Err(TenantError::DomainClaimed {
                    domain: domain.clone(),
                    owner: row.get(0),
                }
                .into());
            }
        }

        site.updated_at = Utc::now();
        let data = serde_json::to_value(&site)?;

        tx.execute(
            format!(
                "INSERT INTO {} (id, slug, data, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO UPDATE
                 SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at",
                sites
            )
            .as_str(),
            &[
                &site.id.as_str(),
                &site.slug,
                &data,
                &site.created_at,
                &site.updated_at,
            ],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::already_exists("site", site.slug.clone())
            } else {
                e.into()
            }
        })?;

        tx.execute(
            format!("DELETE FROM {} WHERE site_id = $1", domains).as_str(),
            &[&site.id.as_str()],
        )
        .await?;
        for domain in &site.domains {
            tx.execute(
                format!("INSERT INTO {} (domain, site_id) VALUES ($1, $2)", domains).as_str(),
                &[domain, &site.id.as_str()],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::from(TenantError::DomainClaimed {
                        domain: domain.clone(),
                        owner: "another site".to_string(),
                    })
                } else {
                    e.into()
                }
            })?;
        }

        tx.commit().await?;
        tracing::debug!(site_id = %site.id, slug = %site.slug, "site saved");
        Ok(site)
    }

    async fn rename_site_slug(&self, old_slug: &str, new_slug: &str) -> StorageResult<Site> {
        validate_site_slug(new_slug)?;
        let sites = self.shared("sites");

        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let row = tx
            .query_opt(
                format!("SELECT data FROM {} WHERE slug = $1 FOR UPDATE", sites).as_str(),
                &[&old_slug],
            )
            .await?
            .ok_or_else(|| StorageError::not_found("site", old_slug))?;
        let mut site = site_from_row(&row)?;

        if old_slug == new_slug {
            return Ok(site);
        }

        let taken = tx
            .query_opt(
                format!("SELECT 1 FROM {} WHERE slug = $1", sites).as_str(),
                &[&new_slug],
            )
            .await?;
        if taken.is_some() {
            return Err(StorageError::already_exists("site", new_slug));
        }

        site.slug = new_slug.to_string();
        site.updated_at = Utc::now();
        let data = serde_json::to_value(&site)?;

        tx.execute(
            format!(
                "UPDATE {} SET slug = $2, data = $3, updated_at = $4 WHERE id = $1",
                sites
            )
            .as_str(),
            &[&site.id.as_str(), &new_slug, &data, &site.updated_at],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::already_exists("site", new_slug)
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        tracing::info!(site_id = %site.id, old_slug, new_slug, "site slug renamed");
        Ok(site)
    }
}

#[async_trait]
impl UserDirectory for PostgresBackend {
    async fn save_user(&self, user: User) -> StorageResult<User> {
        let mut user = normalize_user(user)?;
        let users = self.shared("users");
        let memberships = self.shared("user_sites");

        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let email_owner = tx
            .query_opt(
                format!("SELECT id FROM {} WHERE email = $1 FOR UPDATE", users).as_str(),
                &[&user.email],
            )
            .await?;
        if let Some(row) = email_owner
            && row.get::<_, &str>(0) != user.id
        {
            return Err(StorageError::already_exists("user", user.email.clone()));
        }

        let existing = tx
            .query_opt(
                format!("SELECT created_at FROM {} WHERE id = $1", users).as_str(),
                &[&user.id],
            )
            .await?;
        if let Some(row) = existing {
            user.created_at = row.get(0);
        }

        let data = serde_json::to_value(&user)?;
        tx.execute(
            format!(
                "INSERT INTO {} (id, email, data, created_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, data = EXCLUDED.data",
                users
            )
            .as_str(),
            &[&user.id, &user.email, &data, &user.created_at],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::already_exists("user", user.email.clone())
            } else {
                e.into()
            }
        })?;

        tx.execute(
            format!("DELETE FROM {} WHERE user_id = $1", memberships).as_str(),
            &[&user.id],
        )
        .await?;
        for site_id in &user.site_ids {
            tx.execute(
                format!(
                    "INSERT INTO {} (user_id, site_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                    memberships
                )
                .as_str(),
                &[&user.id, &site_id.as_str()],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.trim().to_ascii_lowercase();
        let client = self.get_client().await?;
        let row = client
            .query_opt(
                format!("SELECT data FROM {} WHERE email = $1", self.shared("users")).as_str(),
                &[&email],
            )
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users_for_site(&self, site_id: &SiteId) -> StorageResult<Vec<User>> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                format!(
                    "SELECT u.data FROM {} u JOIN {} m ON m.user_id = u.id
                     WHERE m.site_id = $1
                     ORDER BY u.email",
                    self.shared("users"),
                    self.shared("user_sites")
                )
                .as_str(),
                &[&site_id.as_str()],
            )
            .await?;
        rows.iter().map(user_from_row).collect()
    }
}
