use crate::core::error::AzfError;
use crate::core::schemas;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT_SECS: u64 = 5;

pub fn db_connect(db_path: &Path) -> Result<Connection, AzfError> {
    let conn = Connection::open(db_path).map_err(|e| AzfError::init("open", db_path, e))?;
    conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
        .map_err(|e| AzfError::init("busy_timeout", db_path, e))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(|e| AzfError::init("journal_mode", db_path, e))?;
    Ok(conn)
}

/// `<cache_root>/azf/azf.db`
pub fn cache_db_path(cache_root: &Path) -> PathBuf {
    cache_root
        .join(schemas::CACHE_SUBDIR)
        .join(schemas::CACHE_DB_NAME)
}

pub fn initialize_schema(conn: &Connection, db_path: &Path) -> Result<(), AzfError> {
    conn.execute(schemas::RESOURCES_SCHEMA, [])
        .map_err(|e| AzfError::init("schema", db_path, e))?;
    conn.execute(schemas::RESOURCES_SCHEMA_NAME_INDEX, [])
        .map_err(|e| AzfError::init("schema_index", db_path, e))?;
    Ok(())
}
