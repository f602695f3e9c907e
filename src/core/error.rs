use rusqlite;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzfError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to initialize cache ({op}) at {}: {source}", path.display())]
    InitializationError {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Query failed ({op}): {source}")]
    QueryError {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Insert failed{}: {source}", id.as_ref().map(|id| format!(" for resource {id:?}")).unwrap_or_default())]
    InsertError {
        id: Option<String>,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to close cache db: {0}")]
    CloseError(#[source] rusqlite::Error),
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("Provider error ({op}): {message}")]
    ProviderError { op: &'static str, message: String },
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Selector `{program}` failed: {source}")]
    SelectorError {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid config file: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to open {url} in a browser: {source}")]
    OpenError {
        url: String,
        #[source]
        source: io::Error,
    },
}

impl AzfError {
    pub(crate) fn init(
        op: &'static str,
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AzfError::InitializationError {
            op,
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn query(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| AzfError::QueryError { op, source }
    }
}
