//! CLI struct definitions for the azf command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "azf",
    version = env!("CARGO_PKG_VERSION"),
    about = "Fast Azure Resource Finder",
    long_about = "azf is a fast CLI for searching, filtering, and opening Azure resources in the browser, backed by a local cache.",
    args_conflicts_with_subcommands = true
)]
pub(crate) struct Cli {
    /// Config file (default: <config dir>/azf/config.toml).
    #[clap(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Print debug diagnostics to stderr.
    #[clap(short, long, global = true)]
    pub verbose: bool,
    #[clap(subcommand)]
    pub command: Option<Command>,
    /// Search text; a single exact resource name opens it directly.
    /// Put `--` first to search for a word that is also a subcommand
    /// (`azf -- list`).
    #[clap(value_name = "QUERY")]
    pub query: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Synchronize Azure resources into the local cache.
    Sync {
        /// Maximum resources fetched per subscription.
        #[clap(long)]
        page_size: Option<u32>,
        /// Output format for the sync summary.
        #[clap(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List cached Azure resources.
    List,
    /// Show cache location and size.
    Status {
        #[clap(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print resource name completions, one per line.
    #[clap(hide = true)]
    Complete {
        #[clap(default_value = "")]
        partial: String,
    },
}
