//! Subscription-partitioned sync from a `ResourceProvider` into the cache.
//!
//! Authentication and subscription listing are all-or-nothing: without them
//! there is nothing to sync. Listing resources for one subscription may fail
//! on its own; that subscription is skipped and the rest proceed. Each
//! subscription's rows land in one `insert_resources` transaction, so readers
//! see a partition entirely or not at all.
//!
//! Rows that disappeared upstream are left in place; sync only adds and
//! replaces by id.

use crate::core::error::AzfError;
use crate::core::resource::Resource;
use crate::core::store::ResourceStore;
use crate::plugins::provider::{FieldDefaults, ResourceProvider};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use ulid::Ulid;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub page_size: u32,
    pub defaults: FieldDefaults,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: crate::core::config::DEFAULT_PAGE_SIZE,
            defaults: FieldDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSync {
    pub subscription_id: String,
    pub synced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSubscription {
    pub subscription_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub run_id: String,
    /// Subscriptions returned by the provider, including skipped ones.
    pub subscriptions: usize,
    /// Total rows ingested across all subscriptions.
    pub synced: usize,
    pub per_subscription: Vec<SubscriptionSync>,
    pub skipped: Vec<SkippedSubscription>,
}

/// Progress notifications for interactive callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent<'a> {
    NoSubscriptions,
    Started { subscription_id: &'a str },
    Synced { subscription_id: &'a str, count: usize },
    Skipped { subscription_id: &'a str, reason: &'a str },
}

pub fn sync_all<P: ResourceProvider + ?Sized>(
    provider: &mut P,
    store: &mut ResourceStore,
    options: &SyncOptions,
) -> Result<SyncReport, AzfError> {
    sync_all_with_progress(provider, store, options, &mut |_| {})
}

pub fn sync_all_with_progress<P: ResourceProvider + ?Sized>(
    provider: &mut P,
    store: &mut ResourceStore,
    options: &SyncOptions,
    progress: &mut dyn FnMut(SyncEvent<'_>),
) -> Result<SyncReport, AzfError> {
    let run_id = Ulid::new().to_string();
    let span = info_span!("sync", run_id = %run_id);
    let _enter = span.enter();

    provider.authenticate()?;
    let subs = provider.list_subscriptions()?;

    let mut report = SyncReport {
        run_id,
        ..SyncReport::default()
    };

    let sub_ids: Vec<String> = subs
        .into_iter()
        .filter_map(|s| s.subscription_id.filter(|id| !id.is_empty()))
        .collect();
    report.subscriptions = sub_ids.len();

    if sub_ids.is_empty() {
        info!("no subscriptions found");
        progress(SyncEvent::NoSubscriptions);
        return Ok(report);
    }

    for sub_id in &sub_ids {
        progress(SyncEvent::Started {
            subscription_id: sub_id,
        });

        let raw = match provider.list_resources(sub_id, options.page_size) {
            Ok(raw) => raw,
            Err(e) => {
                let reason = e.to_string();
                warn!(subscription = %sub_id, error = %reason, "failed to list resources; skipping subscription");
                progress(SyncEvent::Skipped {
                    subscription_id: sub_id,
                    reason: &reason,
                });
                report.skipped.push(SkippedSubscription {
                    subscription_id: sub_id.clone(),
                    reason,
                });
                continue;
            }
        };

        let resources: Vec<Resource> = raw
            .into_iter()
            .map(|r| {
                let missing = r.missing_fields();
                if !missing.is_empty() {
                    debug!(subscription = %sub_id, ?missing, "resource row with absent fields");
                }
                r.into_resource(&options.defaults)
            })
            .collect();

        store.insert_resources(&resources)?;

        let count = resources.len();
        info!(subscription = %sub_id, count, "subscription synced");
        progress(SyncEvent::Synced {
            subscription_id: sub_id,
            count,
        });
        report.synced += count;
        report.per_subscription.push(SubscriptionSync {
            subscription_id: sub_id.clone(),
            synced: count,
        });
    }

    Ok(report)
}
