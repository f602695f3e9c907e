//! Persistent resource cache.
//!
//! A `ResourceStore` owns one SQLite connection for the lifetime of a command
//! invocation. Callers open it at the command boundary and pass it down
//! explicitly; nothing in the crate keeps a process-wide handle.
//!
//! Every read query returns rows in the canonical `(name, resourceGroup, type)`
//! order, case-insensitive. The picker's tie-break and the `list` table both
//! depend on that order being stable.

use crate::core::db;
use crate::core::error::AzfError;
use crate::core::resource::Resource;
use crate::core::schemas;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Escape character used in every `LIKE` pattern built from user text.
const LIKE_ESCAPE: char = '\\';

pub struct ResourceStore {
    conn: Option<Connection>,
    path: PathBuf,
}

impl ResourceStore {
    /// Open (or create) the cache under `cache_root`.
    ///
    /// Creates `<cache_root>/azf/`, opens `azf.db` and ensures the schema.
    /// Safe to call repeatedly on the same root.
    pub fn open(cache_root: &Path) -> Result<Self, AzfError> {
        let path = db::cache_db_path(cache_root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AzfError::init("create_dir", parent, e))?;
        }

        let conn = db::db_connect(&path)?;
        if let Err(e) = db::initialize_schema(&conn, &path) {
            if let Err((_, close_err)) = conn.close() {
                debug!(error = %close_err, "close after failed schema init");
            }
            return Err(e);
        }

        debug!(path = %path.display(), "resource cache opened");
        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the connection, reporting any failure to close it.
    pub fn close(mut self) -> Result<(), AzfError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| AzfError::CloseError(e)),
            None => Ok(()),
        }
    }

    fn conn(&self) -> Result<&Connection, AzfError> {
        self.conn
            .as_ref()
            .ok_or_else(|| AzfError::init("connection", &self.path, "cache connection is closed"))
    }

    /// Insert or replace `resources` in one transaction.
    ///
    /// All-or-nothing: the first failing row rolls the whole batch back and the
    /// returned error names that row's id. Empty input never touches the file.
    pub fn insert_resources(&mut self, resources: &[Resource]) -> Result<(), AzfError> {
        if resources.is_empty() {
            return Ok(());
        }
        let path = self.path.clone();
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| AzfError::init("connection", &path, "cache connection is closed"))?;

        let tx = conn
            .transaction()
            .map_err(|source| AzfError::InsertError { id: None, source })?;
        {
            let mut stmt = tx
                .prepare(schemas::RESOURCE_UPSERT)
                .map_err(|source| AzfError::InsertError { id: None, source })?;
            for r in resources {
                stmt.execute(params![
                    r.id,
                    r.name,
                    r.resource_type,
                    r.subscription_id,
                    r.resource_group,
                    r.location,
                    r.tenant_id,
                ])
                .map_err(|source| AzfError::InsertError {
                    id: Some(r.id.clone()),
                    source,
                })?;
            }
        }
        // Dropping `tx` on any early return above rolls back.
        tx.commit()
            .map_err(|source| AzfError::InsertError { id: None, source })?;

        debug!(count = resources.len(), "resources upserted");
        Ok(())
    }

    /// Every cached resource.
    pub fn list_resources(&self) -> Result<Vec<Resource>, AzfError> {
        let sql = format!(
            "SELECT {} FROM resources {}",
            schemas::RESOURCE_COLUMNS,
            schemas::RESOURCE_ORDER_BY
        );
        self.query_resources("list_resources", &sql, &[])
    }

    /// Case-insensitive substring match on `name` or `id`. An empty needle
    /// matches everything.
    pub fn find_resources(&self, needle: &str) -> Result<Vec<Resource>, AzfError> {
        let pattern = format!("%{}%", escape_like(needle));
        let sql = format!(
            "SELECT {} FROM resources
             WHERE name LIKE ?1 ESCAPE '{esc}' OR id LIKE ?1 ESCAPE '{esc}'
             {}",
            schemas::RESOURCE_COLUMNS,
            schemas::RESOURCE_ORDER_BY,
            esc = LIKE_ESCAPE
        );
        self.query_resources("find_resources", &sql, &[&pattern])
    }

    /// Case-insensitive prefix match on `name` only.
    pub fn find_resources_by_name_prefix(&self, prefix: &str) -> Result<Vec<Resource>, AzfError> {
        let pattern = format!("{}%", escape_like(prefix));
        let sql = format!(
            "SELECT {} FROM resources
             WHERE name LIKE ?1 ESCAPE '{esc}'
             {}",
            schemas::RESOURCE_COLUMNS,
            schemas::RESOURCE_ORDER_BY,
            esc = LIKE_ESCAPE
        );
        self.query_resources("find_resources_by_name_prefix", &sql, &[&pattern])
    }

    /// First resource, in canonical order, whose name equals `name` ignoring case.
    pub fn find_resource_by_exact_name(&self, name: &str) -> Result<Option<Resource>, AzfError> {
        let sql = format!(
            "SELECT {} FROM resources
             WHERE name = ?1 COLLATE NOCASE
             {}
             LIMIT 1",
            schemas::RESOURCE_COLUMNS,
            schemas::RESOURCE_ORDER_BY
        );
        let op = "find_resource_by_exact_name";
        self.conn()?
            .query_row(&sql, params![name], resource_from_row)
            .optional()
            .map_err(AzfError::query(op))
    }

    pub fn count_resources(&self) -> Result<usize, AzfError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))
            .map_err(AzfError::query("count_resources"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn query_resources(
        &self,
        op: &'static str,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Resource>, AzfError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(AzfError::query(op))?;
        let rows = stmt
            .query_map(args, resource_from_row)
            .map_err(AzfError::query(op))?;

        let mut results = Vec::new();
        for r in rows {
            results.push(r.map_err(AzfError::query(op))?);
        }
        Ok(results)
    }
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    // Rows written by this crate never hold NULL; older or foreign writers might.
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };
    Ok(Resource {
        id: text(0)?,
        name: text(1)?,
        resource_type: text(2)?,
        subscription_id: text(3)?,
        resource_group: text(4)?,
        location: text(5)?,
        tenant_id: text(6)?,
        updated_at: row.get(7)?,
    })
}

/// Make `%`, `_` and the escape character in user text match literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}
