//! Azure Resource Manager provider.
//!
//! Token acquisition reuses an existing login: `AZURE_ACCESS_TOKEN` if set,
//! otherwise the Azure CLI (`az account get-access-token`). Subscriptions come
//! from ARM, resources from Azure Resource Graph, one subscription per query.

use crate::core::error::AzfError;
use crate::plugins::provider::{RawResource, RawSubscription, ResourceProvider};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

pub const ENV_ACCESS_TOKEN: &str = "AZURE_ACCESS_TOKEN";
const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";
const RESOURCE_GRAPH_API_VERSION: &str = "2021-03-01";
/// Resource Graph caps a single response at 1000 rows.
const RESOURCE_GRAPH_MAX_TOP: u32 = 1000;
const HTTP_TIMEOUT_SECS: u64 = 30;

const RESOURCE_PROJECTION: &str =
    "Resources | project id,name,type,subscriptionId,resourceGroup,location,tenantId";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionPage {
    #[serde(default)]
    value: Vec<RawSubscription>,
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphPage {
    #[serde(default)]
    data: JsonValue,
    #[serde(rename = "$skipToken")]
    skip_token: Option<String>,
}

pub struct AzureProvider {
    endpoint: String,
    client: reqwest::blocking::Client,
    token: Option<String>,
}

impl AzureProvider {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AzfError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("azf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
            token: None,
        })
    }

    fn token(&self, op: &'static str) -> Result<&str, AzfError> {
        self.token.as_deref().ok_or_else(|| AzfError::ProviderError {
            op,
            message: "not authenticated".to_string(),
        })
    }

    fn check(
        op: &'static str,
        resp: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, AzfError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(AzfError::ProviderError {
            op,
            message: format!("{status}: {}", crate::core::output::compact_line(&body, 300)),
        })
    }
}

fn token_from_cli() -> Result<String, AzfError> {
    let output = Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            "https://management.azure.com/",
            "--output",
            "json",
        ])
        .output()
        .map_err(|e| AzfError::AuthError(format!("failed to run `az`: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AzfError::AuthError(format!(
            "`az account get-access-token` failed (run `az login`): {}",
            stderr.trim()
        )));
    }
    let token: CliToken = serde_json::from_slice(&output.stdout)?;
    Ok(token.access_token)
}

/// Resource Graph query for one page.
pub fn graph_query(limit: u32) -> String {
    format!("{RESOURCE_PROJECTION} | limit {limit}")
}

fn parse_graph_rows(data: JsonValue) -> Result<Vec<RawResource>, AzfError> {
    match data {
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| -> Result<RawResource, AzfError> {
                if !item.is_object() {
                    return Err(AzfError::ProviderError {
                        op: "list_resources",
                        message: "unexpected item format in resource graph response".to_string(),
                    });
                }
                Ok(serde_json::from_value(item)?)
            })
            .collect(),
        JsonValue::Null => Err(AzfError::ProviderError {
            op: "list_resources",
            message: "resource graph query returned no data".to_string(),
        }),
        _ => Err(AzfError::ProviderError {
            op: "list_resources",
            message: "unexpected data format in resource graph response".to_string(),
        }),
    }
}

impl ResourceProvider for AzureProvider {
    fn authenticate(&mut self) -> Result<(), AzfError> {
        let token = match std::env::var(ENV_ACCESS_TOKEN) {
            Ok(t) if !t.trim().is_empty() => {
                info!("using access token from {ENV_ACCESS_TOKEN}");
                t
            }
            _ => {
                let t = token_from_cli()?;
                info!("authenticated using Azure CLI credentials");
                t
            }
        };
        self.token = Some(token);
        Ok(())
    }

    fn list_subscriptions(&self) -> Result<Vec<RawSubscription>, AzfError> {
        let op = "list_subscriptions";
        let token = self.token(op)?;
        let mut url = format!(
            "{}/subscriptions?api-version={SUBSCRIPTIONS_API_VERSION}",
            self.endpoint
        );
        let mut subs = Vec::new();
        loop {
            let resp = self.client.get(&url).bearer_auth(token).send()?;
            let page: SubscriptionPage = Self::check(op, resp)?.json()?;
            subs.extend(page.value);
            match page.next_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }
        debug!(count = subs.len(), "subscriptions listed");
        Ok(subs)
    }

    fn list_resources(
        &self,
        subscription_id: &str,
        page_size: u32,
    ) -> Result<Vec<RawResource>, AzfError> {
        let op = "list_resources";
        let token = self.token(op)?;
        let url = format!(
            "{}/providers/Microsoft.ResourceGraph/resources?api-version={RESOURCE_GRAPH_API_VERSION}",
            self.endpoint
        );
        let query = graph_query(page_size);

        let mut rows: Vec<RawResource> = Vec::new();
        let mut skip_token: Option<String> = None;
        loop {
            let remaining = page_size.saturating_sub(rows.len() as u32);
            if remaining == 0 {
                break;
            }
            let mut options = serde_json::json!({
                "resultFormat": "objectArray",
                "$top": remaining.min(RESOURCE_GRAPH_MAX_TOP),
            });
            if let Some(tok) = &skip_token {
                options["$skipToken"] = JsonValue::String(tok.clone());
            }
            let body = serde_json::json!({
                "subscriptions": [subscription_id],
                "query": query,
                "options": options,
            });

            let resp = self
                .client
                .post(&url)
                .bearer_auth(token)
                .json(&body)
                .send()?;
            let page: GraphPage = Self::check(op, resp)?.json()?;
            rows.extend(parse_graph_rows(page.data)?);
            match page.skip_token {
                Some(tok) if !tok.is_empty() => skip_token = Some(tok),
                _ => break,
            }
        }
        Ok(rows)
    }
}
