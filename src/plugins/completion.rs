//! Dynamic shell completion candidates.
//!
//! Completion hooks must never print errors into the user's prompt, so every
//! failure degrades to "no candidates".

use crate::core::store::ResourceStore;
use rustc_hash::FxHashSet;
use std::path::Path;
use tracing::debug;

/// Unique, non-blank resource names starting with `partial` (case-insensitive),
/// in canonical order.
pub fn generate(store: &ResourceStore, partial: &str) -> Vec<String> {
    let found = if partial.is_empty() {
        store.list_resources()
    } else {
        store.find_resources_by_name_prefix(partial)
    };
    let resources = match found {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "completion query failed");
            return Vec::new();
        }
    };

    let mut seen = FxHashSet::default();
    let mut names = Vec::new();
    for r in resources {
        if r.name.trim().is_empty() || !seen.insert(r.name.clone()) {
            continue;
        }
        names.push(r.name);
    }
    names
}

/// Open the cache at `cache_root`, generate, and close. Silent on failure.
pub fn generate_at(cache_root: &Path, partial: &str) -> Vec<String> {
    let store = match ResourceStore::open(cache_root) {
        Ok(s) => s,
        Err(e) => {
            debug!(error = %e, "completion could not open cache");
            return Vec::new();
        }
    };
    let names = generate(&store, partial);
    if let Err(e) = store.close() {
        debug!(error = %e, "completion close failed");
    }
    names
}
