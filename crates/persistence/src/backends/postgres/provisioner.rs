//! Schema-per-site provisioning for PostgreSQL.

use async_trait::async_trait;

use crate::error::{StorageResult, TenantError};
use crate::partition::{PartitionName, PartitionProvisioner};
use crate::tenant::SiteId;

use super::backend::{PostgresBackend, is_creation_race, pg_error};

/// Outcome of one provisioning transaction.
enum Provisioned {
    Done,
    /// The registry disagrees with the derived name; carries the reason.
    Conflict(String),
}

impl PostgresBackend {
    /// Creates the schema, tables and registry row in one transaction.
    ///
    /// The advisory lock keyed on the schema name serializes concurrent
    /// provisioners of the same site; different sites never contend.
    async fn provision_once(
        &self,
        client: &mut deadpool_postgres::Client,
        site_id: &SiteId,
        partition: &PartitionName,
    ) -> Result<Provisioned, tokio_postgres::Error> {
        let tx = client.transaction().await?;

        tx.execute(self.strategy.advisory_lock_sql(), &[&partition.as_str()])
            .await?;
        for sql in self.strategy.partition_ddl(partition) {
            tx.execute(sql.as_str(), &[]).await?;
        }

        let registry = self.shared("partitions");
        tx.execute(
            format!(
                "INSERT INTO {} (site_id, schema_name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                registry
            )
            .as_str(),
            &[&site_id.as_str(), &partition.as_str()],
        )
        .await?;

        let owner: Option<String> = tx
            .query_opt(
                format!("SELECT site_id FROM {} WHERE schema_name = $1", registry).as_str(),
                &[&partition.as_str()],
            )
            .await?
            .map(|row| row.get(0));
        if owner.as_deref() != Some(site_id.as_str()) {
            // rolled back on drop
            let reason = match owner {
                Some(owner) => format!("partition {} already belongs to site {}", partition, owner),
                None => format!("site is registered under a partition other than {}", partition),
            };
            return Ok(Provisioned::Conflict(reason));
        }

        tx.commit().await?;
        Ok(Provisioned::Done)
    }
}

#[async_trait]
impl PartitionProvisioner for PostgresBackend {
    async fn ensure_partition(&self, site_id: &SiteId) -> StorageResult<PartitionName> {
        let partition = self.strategy.partition_for(site_id)?;
        if self.provisioned.contains(&partition, site_id) {
            return Ok(partition);
        }

        let mut client = self.get_client().await?;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.provision_once(&mut client, site_id, &partition).await {
                Ok(Provisioned::Done) => break,
                Ok(Provisioned::Conflict(reason)) => {
                    return Err(TenantError::InvalidIdentifier {
                        identifier: site_id.to_string(),
                        reason,
                    }
                    .into());
                }
                Err(e) if attempt == 1 && is_creation_race(&e) => {
                    tracing::warn!(
                        site_id = %site_id,
                        partition = %partition,
                        error = %e,
                        "partition creation raced, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.provisioned.insert(partition.clone(), site_id.clone());
        tracing::info!(site_id = %site_id, partition = %partition, "partition provisioned");
        Ok(partition)
    }

    async fn partition_exists(&self, site_id: &SiteId) -> StorageResult<bool> {
        let partition = self.strategy.partition_for(site_id)?;
        let client = self.get_client().await?;
        let count: i64 = client
            .query_one(self.strategy.partition_exists_sql(), &[&partition.as_str()])
            .await?
            .get(0);
        Ok(count == 2)
    }

    async fn reprovision_all(&self) -> StorageResult<usize> {
        let mut client = self.get_client().await?;
        let rows = client
            .query(
                format!(
                    "SELECT site_id FROM {} ORDER BY provisioned_at, site_id",
                    self.shared("partitions")
                )
                .as_str(),
                &[],
            )
            .await?;

        let mut count = 0;
        for row in rows {
            let site_id = SiteId::new(row.get::<_, String>(0));
            let partition = self.strategy.partition_for(&site_id)?;
            match self.provision_once(&mut client, &site_id, &partition).await? {
                Provisioned::Done => {
                    self.provisioned.insert(partition, site_id);
                    count += 1;
                }
                Provisioned::Conflict(reason) => {
                    return Err(pg_error(format!("cannot reprovision {}: {}", site_id, reason)));
                }
            }
        }

        tracing::info!(partitions = count, "PostgreSQL partitions reprovisioned");
        Ok(count)
    }
}
