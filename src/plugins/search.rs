//! Interactive search over the cache and the portal "open" action.

use crate::core::config::ColumnWidths;
use crate::core::error::AzfError;
use crate::core::output::{Table, rule};
use crate::core::resource::Resource;
use crate::core::store::ResourceStore;
use crate::plugins::picker::{Picker, Selection, select_resource};
use std::io::Write;
use tracing::debug;

pub const EMPTY_CACHE_HINT: &str = "No cached resources found. Run `azf sync` first.";

/// Portal deep link for a resource.
pub fn portal_url(resource: &Resource, portal_base: &str) -> String {
    format!(
        "{}/#@{}/resource{}",
        portal_base.trim_end_matches('/'),
        resource.tenant_id,
        resource.id
    )
}

pub trait UrlOpener {
    fn open(&self, url: &str) -> Result<(), AzfError>;
}

/// Hands the URL to the platform's default browser.
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), AzfError> {
        debug!(url, "opening resource");
        webbrowser::open(url).map_err(|source| AzfError::OpenError {
            url: url.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Opened(Resource),
    Cancelled,
    EmptyCache,
}

pub struct SearchContext<'a> {
    pub picker: &'a dyn Picker,
    pub opener: &'a dyn UrlOpener,
    pub widths: ColumnWidths,
    pub portal_url: &'a str,
}

impl SearchContext<'_> {
    fn open(&self, resource: Resource) -> Result<SearchOutcome, AzfError> {
        self.opener.open(&portal_url(&resource, self.portal_url))?;
        Ok(SearchOutcome::Opened(resource))
    }
}

/// Resolve `args` to one resource and open it.
///
/// A single argument that exactly names a resource opens it without the
/// picker. Otherwise the whole cache goes to the picker with the joined args
/// as its initial query; a cache of exactly one resource opens directly.
pub fn run_search(
    store: &ResourceStore,
    ctx: &SearchContext<'_>,
    args: &[String],
) -> Result<SearchOutcome, AzfError> {
    if let [only] = args {
        if let Some(exact) = store.find_resource_by_exact_name(only)? {
            debug!(name = %exact.name, "exact name match");
            return ctx.open(exact);
        }
    }

    let query = args.join(" ");
    let mut resources = store.list_resources()?;
    match resources.len() {
        0 => return Ok(SearchOutcome::EmptyCache),
        1 => return ctx.open(resources.remove(0)),
        _ => {}
    }

    match select_resource(ctx.picker, &resources, &query, &ctx.widths)? {
        Selection::Selected(r) => ctx.open(r),
        Selection::Cancelled => Ok(SearchOutcome::Cancelled),
    }
}

/// Print every cached resource as a Name / Type / Resource Group table.
pub fn list_cache<W: Write>(store: &ResourceStore, out: &mut W) -> Result<usize, AzfError> {
    let resources = store.find_resources("")?;
    if resources.is_empty() {
        let line = rule(60);
        writeln!(out, "{line}")?;
        writeln!(out, "{EMPTY_CACHE_HINT}")?;
        writeln!(out, "{line}")?;
        return Ok(0);
    }

    writeln!(out, "Cached {} resources:\n", resources.len())?;
    let mut table = Table::new(["Name", "Type", "Resource Group"]);
    for r in &resources {
        table.add_row([&r.name, &r.resource_type, &r.resource_group]);
    }
    table.render(out)?;
    Ok(resources.len())
}
