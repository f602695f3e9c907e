//! Database schema definitions for the azf resource cache.
//!
//! The cache is a single SQLite file holding one table. Column names keep the
//! camelCase spelling of the Azure Resource Graph projection so the file stays
//! readable with plain `sqlite3`.

/// Subdirectory of the cache root that owns the database file.
pub const CACHE_SUBDIR: &str = "azf";
pub const CACHE_DB_NAME: &str = "azf.db";

pub const RESOURCES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS resources (
        id TEXT PRIMARY KEY,
        name TEXT,
        type TEXT,
        subscriptionId TEXT,
        resourceGroup TEXT,
        location TEXT,
        tenantId TEXT,
        updatedAt TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
";
pub const RESOURCES_SCHEMA_NAME_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_resources_name ON resources(name COLLATE NOCASE)";

pub const RESOURCE_COLUMNS: &str =
    "id, name, type, subscriptionId, resourceGroup, location, tenantId, updatedAt";

/// Canonical ordering shared by every read query.
pub const RESOURCE_ORDER_BY: &str = "ORDER BY name COLLATE NOCASE ASC,
             resourceGroup COLLATE NOCASE ASC,
             type COLLATE NOCASE ASC";

pub const RESOURCE_UPSERT: &str = "
    INSERT OR REPLACE INTO resources
        (id, name, type, subscriptionId, resourceGroup, location, tenantId, updatedAt)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, CURRENT_TIMESTAMP)
";
