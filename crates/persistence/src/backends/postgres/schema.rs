//! PostgreSQL shared-schema definitions and migrations.
//!
//! Tenant schemas are created by the provisioner; this module only manages
//! the shared schema holding sites, domains, users and the partition
//! registry.

use crate::error::{BackendError, StorageError, StorageResult};
use crate::partition::SchemaPerTenantStrategy;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Advisory lock key serializing migrations across processes.
const MIGRATION_LOCK_KEY: i64 = 0x5173_f0e6_0001;

/// Initialize the shared schema.
///
/// Runs in one transaction under an advisory lock, so concurrent starters
/// apply each migration exactly once.
pub async fn initialize_schema(
    client: &mut deadpool_postgres::Client,
    strategy: &SchemaPerTenantStrategy,
) -> StorageResult<()> {
    let tx = client
        .transaction()
        .await
        .map_err(|e| migration_error(format!("Failed to begin migration: {}", e)))?;

    tx.execute("SELECT pg_advisory_xact_lock($1)", &[&MIGRATION_LOCK_KEY])
        .await
        .map_err(|e| migration_error(format!("Failed to take migration lock: {}", e)))?;

    tx.execute(strategy.create_shared_schema_sql().as_str(), &[])
        .await
        .map_err(|e| migration_error(format!("Failed to create shared schema: {}", e)))?;

    let current_version = get_schema_version(&tx, strategy).await?;

    if current_version == 0 {
        create_schema_v1(&tx, strategy).await?;
        migrate_schema(&tx, strategy, 1).await?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(&tx, strategy, current_version).await?;
    } else if current_version > SCHEMA_VERSION {
        return Err(migration_error(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    tx.commit()
        .await
        .map_err(|e| migration_error(format!("Failed to commit migration: {}", e)))?;

    if current_version != SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            schema = strategy.shared_schema(),
            "shared schema migrated"
        );
    }
    Ok(())
}

/// Get the current schema version.
async fn get_schema_version(
    tx: &deadpool_postgres::Transaction<'_>,
    strategy: &SchemaPerTenantStrategy,
) -> StorageResult<i32> {
    let table = strategy.shared_table("schema_version");
    tx.execute(
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                version INTEGER NOT NULL
            )",
            table
        )
        .as_str(),
        &[],
    )
    .await
    .map_err(|e| migration_error(format!("Failed to create schema_version table: {}", e)))?;

    let row = tx
        .query_opt(format!("SELECT version FROM {} LIMIT 1", table).as_str(), &[])
        .await
        .map_err(|e| migration_error(format!("Failed to query schema version: {}", e)))?;

    Ok(row.map(|r| r.get::<_, i32>(0)).unwrap_or(0))
}

/// Set the schema version.
async fn set_schema_version(
    tx: &deadpool_postgres::Transaction<'_>,
    strategy: &SchemaPerTenantStrategy,
    version: i32,
) -> StorageResult<()> {
    let table = strategy.shared_table("schema_version");
    tx.execute(format!("DELETE FROM {}", table).as_str(), &[])
        .await
        .map_err(|e| migration_error(format!("Failed to clear schema_version: {}", e)))?;

    tx.execute(
        format!("INSERT INTO {} (version) VALUES ($1)", table).as_str(),
        &[&version],
    )
    .await
    .map_err(|e| migration_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1).
async fn create_schema_v1(
    tx: &deadpool_postgres::Transaction<'_>,
    strategy: &SchemaPerTenantStrategy,
) -> StorageResult<()> {
    let sites = strategy.shared_table("sites");
    let statements = [
        // Site records; the document is the source of truth, key columns are indexed copies
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
            sites
        ),
        // One row per bound domain; the primary key enforces global uniqueness
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                domain TEXT PRIMARY KEY,
                site_id TEXT NOT NULL REFERENCES {}(id)
            )",
            strategy.shared_table("site_domains"),
            sites
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            strategy.shared_table("users")
        ),
        // Registry of provisioned tenant schemas
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                site_id TEXT PRIMARY KEY,
                schema_name TEXT NOT NULL UNIQUE,
                provisioned_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            strategy.shared_table("partitions")
        ),
    ];

    for sql in &statements {
        tx.execute(sql.as_str(), &[])
            .await
            .map_err(|e| migration_error(format!("Failed to create v1 schema: {}", e)))?;
    }

    set_schema_version(tx, strategy, 1).await
}

/// Run migrations from the given version.
async fn migrate_schema(
    tx: &deadpool_postgres::Transaction<'_>,
    strategy: &SchemaPerTenantStrategy,
    from_version: i32,
) -> StorageResult<()> {
    if from_version < 2 {
        migrate_v1_to_v2(tx, strategy).await?;
        set_schema_version(tx, strategy, 2).await?;
    }
    Ok(())
}

/// v1 -> v2: user memberships and listing indexes.
async fn migrate_v1_to_v2(
    tx: &deadpool_postgres::Transaction<'_>,
    strategy: &SchemaPerTenantStrategy,
) -> StorageResult<()> {
    let user_sites = strategy.shared_table("user_sites");
    let migrations = [
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                user_id TEXT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                site_id TEXT NOT NULL,
                PRIMARY KEY (user_id, site_id)
            )",
            user_sites,
            strategy.shared_table("users")
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_user_sites_site ON {} (site_id)",
            user_sites
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_sites_created ON {} (created_at, id)",
            strategy.shared_table("sites")
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_site_domains_site ON {} (site_id)",
            strategy.shared_table("site_domains")
        ),
    ];

    for sql in &migrations {
        tx.execute(sql.as_str(), &[])
            .await
            .map_err(|e| migration_error(format!("Migration v1->v2 failed: {}", e)))?;
    }

    Ok(())
}

fn migration_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError { message })
}
