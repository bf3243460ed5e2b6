//! Error types for the tasksync crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving and executing an API call.
///
/// Every variant is fatal to the current invocation; the binary prints the
/// message (plus [`TaskSyncError::hint`] when present) and exits non-zero.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskSyncError {
    #[error("invalid API catalog")]
    InvalidCatalog(#[source] serde_json::Error),

    #[error("unknown API: {api}")]
    UnknownApi { api: String },

    #[error("unknown task: {api} -> {task}")]
    UnknownTask { api: String, task: String },

    #[error("no API or task specified")]
    MissingApiOrTask,

    #[error("invalid arguments")]
    InvalidArguments(#[source] clap::Error),

    #[error("missing required parameters: {}", names.join(", "))]
    MissingRequiredParameter { names: Vec<String> },

    #[error("config file does not exist: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("invalid config file: {}", path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("input cancelled")]
    PromptCancelled,

    #[error("failed to read input")]
    Prompt(#[source] std::io::Error),

    #[error("no endpoint: pass --host with an instance ID or URL")]
    NoEndpoint,

    #[error("HTTP request failed")]
    RequestFailed(#[source] reqwest::Error),

    #[error("failed to read response body")]
    ResponseRead(#[source] reqwest::Error),

    #[error("HTTP {status}")]
    HttpStatus { status: reqwest::StatusCode },

    #[error("empty response")]
    EmptyResponse,

    #[error("malformed response")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("{message}")]
    ServerError { message: String },

    #[error("response has no result")]
    MissingResult,

    #[error("import file does not exist: {}", path.display())]
    ImportFileNotFound { path: PathBuf },

    #[error("invalid import file: {}", path.display())]
    InvalidImportFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to write output: {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to render result as YAML")]
    RenderYaml(#[source] serde_yaml::Error),

    #[error("failed to write to stdout")]
    Stdout(#[source] std::io::Error),
}

impl TaskSyncError {
    /// Follow-up advice printed below the diagnostic.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownApi { .. } | Self::UnknownTask { .. } => Some(
                "Use \"--help\" to get general help and a list of all API classes\n\
                 Use \"--help {API}\" to get a list of all API tasks.",
            ),
            Self::MissingRequiredParameter { .. } => Some("Type --help to see more details"),
            _ => None,
        }
    }
}
