//! The cached resource record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One cached Azure resource.
///
/// `id` is the only identity. `name` is for display and is not unique across
/// subscriptions or resource groups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
    pub tenant_id: String,
    /// Stamped by the store on every write; `None` until the record has been stored.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Ordering used by every store read: `(name, resource_group, type)`, ASCII
    /// case-insensitive, matching SQLite's `COLLATE NOCASE`.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        nocase_cmp(&self.name, &other.name)
            .then_with(|| nocase_cmp(&self.resource_group, &other.resource_group))
            .then_with(|| nocase_cmp(&self.resource_type, &other.resource_type))
    }

    /// Field-wise equality ignoring `updated_at`.
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.resource_type == other.resource_type
            && self.subscription_id == other.subscription_id
            && self.resource_group == other.resource_group
            && self.location == other.location
            && self.tenant_id == other.tenant_id
    }
}

// NOCASE only folds ASCII letters, so this must not use Unicode lowercasing.
fn nocase_cmp(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

pub fn sort_canonical(resources: &mut [Resource]) {
    resources.sort_by(Resource::canonical_cmp);
}
