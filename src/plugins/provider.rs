//! Remote resource provider contract.
//!
//! Raw records decode with every field optional. Mapping into a `Resource`
//! goes through `FieldDefaults`, so a field the remote side did not send is an
//! explicit, named outcome rather than whatever an absent lookup stringifies to.

use crate::core::error::AzfError;
use crate::core::resource::Resource;
use serde::{Deserialize, Serialize};

/// Value stored for a field the provider did not return.
pub const MISSING_FIELD_PLACEHOLDER: &str = "<nil>";

/// Subscription as listed by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubscription {
    pub subscription_id: Option<String>,
    pub display_name: Option<String>,
    pub tenant_id: Option<String>,
}

/// Resource row as projected by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResource {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub tenant_id: Option<String>,
}

/// Named substitutes for absent raw fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefaults {
    pub missing: String,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            missing: MISSING_FIELD_PLACEHOLDER.to_string(),
        }
    }
}

impl FieldDefaults {
    fn or_missing(&self, value: Option<String>) -> String {
        value.unwrap_or_else(|| self.missing.clone())
    }
}

impl RawResource {
    /// Present values (including empty strings) are kept as-is.
    pub fn into_resource(self, defaults: &FieldDefaults) -> Resource {
        Resource {
            id: defaults.or_missing(self.id),
            name: defaults.or_missing(self.name),
            resource_type: defaults.or_missing(self.resource_type),
            subscription_id: defaults.or_missing(self.subscription_id),
            resource_group: defaults.or_missing(self.resource_group),
            location: defaults.or_missing(self.location),
            tenant_id: defaults.or_missing(self.tenant_id),
            updated_at: None,
        }
    }

    /// Fields the provider left out, by wire name.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let checks: [(&'static str, bool); 7] = [
            ("id", self.id.is_none()),
            ("name", self.name.is_none()),
            ("type", self.resource_type.is_none()),
            ("subscriptionId", self.subscription_id.is_none()),
            ("resourceGroup", self.resource_group.is_none()),
            ("location", self.location.is_none()),
            ("tenantId", self.tenant_id.is_none()),
        ];
        for (name, absent) in checks {
            if absent {
                missing.push(name);
            }
        }
        missing
    }
}

/// Source of subscriptions and their resources.
///
/// `authenticate` is called exactly once per sync, before anything else.
pub trait ResourceProvider {
    fn authenticate(&mut self) -> Result<(), AzfError>;
    fn list_subscriptions(&self) -> Result<Vec<RawSubscription>, AzfError>;
    fn list_resources(
        &self,
        subscription_id: &str,
        page_size: u32,
    ) -> Result<Vec<RawResource>, AzfError>;
}
