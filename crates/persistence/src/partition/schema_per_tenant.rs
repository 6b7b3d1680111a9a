//! Schema-per-tenant partitioning for PostgreSQL.
//!
//! Each site owns a PostgreSQL schema holding its `pages` and `leads`
//! tables. Sites, domains, users and the partition registry live in one
//! shared schema. All SQL generated here uses fully qualified, quoted
//! identifiers; the connection's `search_path` is never changed, since pooled
//! connections are shared by every tenant.

use serde::{Deserialize, Serialize};

use crate::error::TenantError;
use crate::tenant::SiteId;

use super::name::{DEFAULT_PARTITION_PREFIX, PartitionName, PartitionNaming};

/// Configuration for schema-per-tenant partitioning.
///
/// # Example
///
/// ```
/// use siteforge_persistence::partition::SchemaPerTenantConfig;
///
/// let config = SchemaPerTenantConfig::new()
///     .with_prefix("site_")
///     .with_shared_schema("platform");
/// assert_eq!(config.schema_prefix, "site_");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaPerTenantConfig {
    /// Prefix for tenant schema names.
    ///
    /// The full schema name is `{prefix}{sanitized site id}`.
    #[serde(default = "default_schema_prefix")]
    pub schema_prefix: String,

    /// Name of the shared schema holding sites, domains, users and partitions.
    #[serde(default = "default_shared_schema")]
    pub shared_schema: String,

    /// Maximum full schema name length (PostgreSQL limit is 63).
    #[serde(default = "default_max_schema_length")]
    pub max_schema_length: usize,
}

fn default_schema_prefix() -> String {
    DEFAULT_PARTITION_PREFIX.to_string()
}

fn default_shared_schema() -> String {
    "siteforge".to_string()
}

fn default_max_schema_length() -> usize {
    63 // PostgreSQL identifier limit
}

impl Default for SchemaPerTenantConfig {
    fn default() -> Self {
        Self {
            schema_prefix: default_schema_prefix(),
            shared_schema: default_shared_schema(),
            max_schema_length: default_max_schema_length(),
        }
    }
}

impl SchemaPerTenantConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.schema_prefix = prefix.into();
        self
    }

    /// Sets the shared schema name.
    pub fn with_shared_schema(mut self, schema: impl Into<String>) -> Self {
        self.shared_schema = schema.into();
        self
    }
}

/// Generates the SQL that maps sites onto PostgreSQL schemas.
#[derive(Debug, Clone)]
pub struct SchemaPerTenantStrategy {
    config: SchemaPerTenantConfig,
    naming: PartitionNaming,
}

impl SchemaPerTenantStrategy {
    /// Creates a strategy, validating the prefix and the shared schema name.
    pub fn new(config: SchemaPerTenantConfig) -> Result<Self, TenantError> {
        let naming = PartitionNaming::new(config.schema_prefix.clone())?;

        let shared_ok = config
            .shared_schema
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            && !config.shared_schema.is_empty()
            && !config.shared_schema.starts_with(&config.schema_prefix);
        if !shared_ok {
            return Err(TenantError::InvalidIdentifier {
                identifier: config.shared_schema.clone(),
                reason: "shared schema must be [a-z0-9_]+ and must not use the tenant prefix"
                    .to_string(),
            });
        }

        Ok(Self { config, naming })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SchemaPerTenantConfig {
        &self.config
    }

    /// Returns the shared schema name.
    pub fn shared_schema(&self) -> &str {
        &self.config.shared_schema
    }

    /// Returns the prefix every tenant schema starts with.
    pub fn schema_prefix(&self) -> &str {
        self.naming.prefix()
    }

    /// Derives the schema for a site and checks it against the backend limit.
    ///
    /// PostgreSQL silently truncates longer identifiers, which could make two
    /// sites share a schema, so overlong names are rejected instead.
    pub fn partition_for(&self, site_id: &SiteId) -> Result<PartitionName, TenantError> {
        let partition = self.naming.derive(site_id.as_str())?;
        if partition.len() > self.config.max_schema_length {
            return Err(TenantError::InvalidIdentifier {
                identifier: site_id.to_string(),
                reason: format!(
                    "schema name {} exceeds maximum length of {} characters",
                    partition, self.config.max_schema_length
                ),
            });
        }
        Ok(partition)
    }

    /// Returns `"schema"."table"` for a tenant table.
    pub fn tenant_table(&self, partition: &PartitionName, table: &str) -> String {
        format!(
            "{}.{}",
            escape_identifier(partition.as_str()),
            escape_identifier(table)
        )
    }

    /// Returns `"shared"."table"` for a shared table.
    pub fn shared_table(&self, table: &str) -> String {
        format!(
            "{}.{}",
            escape_identifier(&self.config.shared_schema),
            escape_identifier(table)
        )
    }

    /// Generates SQL to create the shared schema.
    pub fn create_shared_schema_sql(&self) -> String {
        format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            escape_identifier(&self.config.shared_schema)
        )
    }

    /// Generates SQL to create a tenant schema.
    pub fn create_schema_sql(&self, partition: &PartitionName) -> String {
        format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            escape_identifier(partition.as_str())
        )
    }

    /// Generates SQL to create the tenant's pages table.
    pub fn create_pages_table_sql(&self, partition: &PartitionName) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                slug TEXT PRIMARY KEY,
                title TEXT,
                sections JSONB NOT NULL DEFAULT '[]'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL
            )",
            self.tenant_table(partition, "pages")
        )
    }

    /// Generates SQL to create the tenant's leads table.
    pub fn create_leads_table_sql(&self, partition: &PartitionName) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            self.tenant_table(partition, "leads")
        )
    }

    /// Generates SQL for the newest-first lead listing index.
    pub fn create_leads_index_sql(&self, partition: &PartitionName) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS idx_leads_created_at ON {} (created_at DESC, id DESC)",
            self.tenant_table(partition, "leads")
        )
    }

    /// All DDL statements for one tenant partition, in execution order.
    pub fn partition_ddl(&self, partition: &PartitionName) -> Vec<String> {
        vec![
            self.create_schema_sql(partition),
            self.create_pages_table_sql(partition),
            self.create_leads_table_sql(partition),
            self.create_leads_index_sql(partition),
        ]
    }

    /// Generates SQL to check whether a tenant schema and both of its tables exist.
    ///
    /// Takes the schema name as `$1`.
    pub fn partition_exists_sql(&self) -> &'static str {
        "SELECT count(*) FROM information_schema.tables \
         WHERE table_schema = $1 AND table_name IN ('pages', 'leads')"
    }

    /// Generates SQL to serialize provisioning of one schema across sessions.
    ///
    /// Takes the schema name as `$1`; the lock is released at commit.
    pub fn advisory_lock_sql(&self) -> &'static str {
        "SELECT pg_advisory_xact_lock(hashtext($1))"
    }

    /// Generates SQL to drop a tenant schema.
    ///
    /// Partitions are never dropped automatically; this exists for operators
    /// and tests.
    pub fn drop_schema_sql(&self, partition: &PartitionName) -> String {
        format!(
            "DROP SCHEMA IF EXISTS {} CASCADE",
            escape_identifier(partition.as_str())
        )
    }
}

/// Escapes a SQL identifier (schema name, table name, etc.).
fn escape_identifier(id: &str) -> String {
    format!("\"{}\"", id.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> SchemaPerTenantStrategy {
        SchemaPerTenantStrategy::new(SchemaPerTenantConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = SchemaPerTenantConfig::default();
        assert_eq!(config.schema_prefix, "tenant_");
        assert_eq!(config.shared_schema, "siteforge");
        assert_eq!(config.max_schema_length, 63);
    }

    #[test]
    fn test_config_builder() {
        let config = SchemaPerTenantConfig::new()
            .with_prefix("org_")
            .with_shared_schema("common");
        assert_eq!(config.schema_prefix, "org_");
        assert_eq!(config.shared_schema, "common");
    }

    #[test]
    fn test_partition_for_generated_id() {
        let id = SiteId::new("3f2a9c0e5b7d4e1fa0b2c3d4e5f60718");
        let partition = strategy().partition_for(&id).unwrap();
        assert_eq!(partition.as_str(), "tenant_3f2a9c0e5b7d4e1fa0b2c3d4e5f60718");
    }

    #[test]
    fn test_partition_for_rejects_truncation() {
        // 63-char core is legal for the deriver but too long once prefixed
        let id = SiteId::new("a".repeat(63));
        assert!(strategy().partition_for(&id).is_err());

        let id = SiteId::new("a".repeat(56));
        assert!(strategy().partition_for(&id).is_ok());
    }

    #[test]
    fn test_shared_schema_validation() {
        let bad = SchemaPerTenantConfig::new().with_shared_schema("Shared");
        assert!(SchemaPerTenantStrategy::new(bad).is_err());

        let clash = SchemaPerTenantConfig::new().with_shared_schema("tenant_shared");
        assert!(SchemaPerTenantStrategy::new(clash).is_err());

        let bad_prefix = SchemaPerTenantConfig::new().with_prefix("Tenant");
        assert!(SchemaPerTenantStrategy::new(bad_prefix).is_err());
    }

    #[test]
    fn test_create_schema_sql() {
        let partition = PartitionName::derive("acme").unwrap();
        let sql = strategy().create_schema_sql(&partition);
        assert_eq!(sql, "CREATE SCHEMA IF NOT EXISTS \"tenant_acme\"");
    }

    #[test]
    fn test_partition_ddl_is_idempotent_sql() {
        let partition = PartitionName::derive("acme").unwrap();
        let ddl = strategy().partition_ddl(&partition);
        assert_eq!(ddl.len(), 4);
        for statement in &ddl {
            assert!(statement.contains("IF NOT EXISTS"), "{}", statement);
            assert!(statement.contains("\"tenant_acme\""), "{}", statement);
        }
        assert!(ddl[1].contains("\"tenant_acme\".\"pages\""));
        assert!(ddl[2].contains("\"tenant_acme\".\"leads\""));
    }

    #[test]
    fn test_shared_table() {
        assert_eq!(strategy().shared_table("sites"), "\"siteforge\".\"sites\"");
    }

    #[test]
    fn test_drop_schema_sql() {
        let partition = PartitionName::derive("acme").unwrap();
        assert_eq!(
            strategy().drop_schema_sql(&partition),
            "DROP SCHEMA IF EXISTS \"tenant_acme\" CASCADE"
        );
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("test\"schema"), "\"test\"\"schema\"");
    }
}
