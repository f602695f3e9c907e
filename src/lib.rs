//! azfind: fast Azure resource finder.
//!
//! `azf` keeps a local SQLite cache of Azure resource metadata and drives an
//! external fuzzy picker (fzf) over it, so finding and opening a resource in
//! the portal never waits on the Azure API.
//!
//! # Architecture
//!
//! - [`core::store::ResourceStore`]: the cache. Bulk upsert in one transaction,
//!   plus list / substring / prefix / exact-name reads in a fixed order.
//! - [`plugins::selector`]: the tab-delimited line protocol spoken with the
//!   picker, and the decoder that maps the chosen line back to a resource.
//! - [`plugins::picker`]: runs the picker process; cancellation is a value,
//!   not an error.
//! - [`plugins::sync`]: pulls resources per subscription from a
//!   [`plugins::provider::ResourceProvider`] and tolerates per-subscription failures.
//!
//! # Examples
//!
//! ```bash
//! # Populate the cache
//! azf sync
//!
//! # Pick interactively, seeded with a query
//! azf prod web
//!
//! # Open an exact name directly
//! azf my-function-app
//! ```

mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, Command, OutputFormat};
use crate::core::config::{self, Config};
use crate::core::error::AzfError;
use crate::core::logging;
use crate::core::store::ResourceStore;
use crate::plugins::azure::AzureProvider;
use crate::plugins::completion;
use crate::plugins::picker::FzfPicker;
use crate::plugins::search::{self, SearchContext, SearchOutcome, SystemOpener};
use crate::plugins::sync::{self, SyncEvent, SyncOptions};

use clap::Parser;
use colored::Colorize;
use std::io;

pub fn run() -> Result<(), AzfError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Completion runs inside the shell's prompt: no config errors, no output
    // other than candidates.
    if let Some(Command::Complete { partial }) = &cli.command {
        let names = config::load_config(cli.config.as_deref())
            .and_then(Config::with_env_overrides)
            .and_then(|c| c.cache_root())
            .map(|root| completion::generate_at(&root, partial))
            .unwrap_or_default();
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?.with_env_overrides()?;
    let cache_root = config.cache_root()?;

    // One store per invocation, closed at the end of the command.
    let mut store = ResourceStore::open(&cache_root)?;
    let result = dispatch(&cli, &config, &mut store);
    let closed = store.close();
    result?;
    closed
}

fn dispatch(cli: &Cli, config: &Config, store: &mut ResourceStore) -> Result<(), AzfError> {
    match &cli.command {
        Some(Command::Sync { page_size, format }) => run_sync(config, store, *page_size, *format),
        Some(Command::List) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            search::list_cache(store, &mut out)?;
            Ok(())
        }
        Some(Command::Status { format }) => run_status(store, *format),
        Some(Command::Complete { .. }) => Ok(()),
        None => run_search(config, store, &cli.query),
    }
}

fn run_search(config: &Config, store: &ResourceStore, query: &[String]) -> Result<(), AzfError> {
    let picker = FzfPicker::new(config.selector.clone());
    let ctx = SearchContext {
        picker: &picker,
        opener: &SystemOpener,
        widths: config.columns,
        portal_url: &config.portal_url,
    };
    match search::run_search(store, &ctx, query)? {
        SearchOutcome::Opened(r) => {
            println!("{} {}", "Opening".bright_green(), r.name.bold());
        }
        SearchOutcome::EmptyCache => println!("{}", search::EMPTY_CACHE_HINT),
        SearchOutcome::Cancelled => {}
    }
    Ok(())
}

fn run_sync(
    config: &Config,
    store: &mut ResourceStore,
    page_size: Option<u32>,
    format: OutputFormat,
) -> Result<(), AzfError> {
    let page_size = page_size.unwrap_or(config.page_size);
    if page_size == 0 {
        return Err(AzfError::ConfigError("--page-size must be at least 1".into()));
    }
    let options = SyncOptions {
        page_size,
        ..SyncOptions::default()
    };
    let mut provider = AzureProvider::new(&config.arm_endpoint)?;
    let text = format == OutputFormat::Text;

    let report = sync::sync_all_with_progress(&mut provider, store, &options, &mut |event| {
        if !text {
            return;
        }
        match event {
            SyncEvent::NoSubscriptions => println!("No subscriptions found."),
            SyncEvent::Started { subscription_id } => {
                println!("Syncing subscription: {}", subscription_id.bright_cyan())
            }
            SyncEvent::Synced { count, .. } => println!("  → Synced {count} resources"),
            SyncEvent::Skipped { reason, .. } => {
                println!("  {} skipped: {}", "⚠".bright_yellow(), reason)
            }
        }
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if report.subscriptions > 0 {
                println!(
                    "{} Total resources cached: {}",
                    "Sync completed.".bright_green(),
                    report.synced
                );
            }
            if !report.skipped.is_empty() {
                println!(
                    "{} {} subscription(s) skipped",
                    "⚠".bright_yellow(),
                    report.skipped.len()
                );
            }
        }
    }
    Ok(())
}

fn run_status(store: &ResourceStore, format: OutputFormat) -> Result<(), AzfError> {
    let count = store.count_resources()?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "cmd": "status",
                "status": "ok",
                "cache": store.path().to_string_lossy(),
                "resources": count,
            }))?
        ),
        OutputFormat::Text => {
            println!("Cache:     {}", store.path().display());
            println!("Resources: {count}");
        }
    }
    Ok(())
}
