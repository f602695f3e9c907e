//! Diagnostic logging setup.
//!
//! Library code logs through `tracing`. The subscriber writes to stderr so
//! stdout stays reserved for command output (completion candidates are read
//! by the shell).

use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "AZF_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "azfind=debug" } else { "azfind=warn" }
}

/// Install the global subscriber. `AZF_LOG` takes precedence over `verbose`.
/// Calling it twice is harmless; the second call is ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
