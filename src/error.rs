//! Error types for commity modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Bare repositories are not supported")]
    BareRepository,

    #[error("Failed to read working tree status: {0}")]
    StatusFailed(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to stage {path}: {source}")]
    StagingFailed {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to write index: {0}")]
    IndexFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    SignatureFailed(#[source] git2::Error),
}

/// Errors from loading or saving the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Failed to read config {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Existing config {path} is not valid TOML: {source}")]
    EditFailed {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("Failed to write config {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error(
        "API key not configured. Set OPENAI_API_KEY or add api_key under [ai] in the config file"
    )]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors from a single commit message generation cycle.
///
/// Every variant is fatal for the cycle that produced it. Nothing here is
/// retried internally; regeneration is a new, operator-initiated cycle.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("No files selected")]
    NoFilesSelected,

    #[error("AI request failed: {0}")]
    Transport(String),

    #[error("No response from AI")]
    EmptyResponse,

    #[error("AI returned an unusable response: {0}")]
    Protocol(String),

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerateError {
    /// Short, stable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerateError::NoFilesSelected => "input",
            GenerateError::Transport(_) => "transport",
            GenerateError::EmptyResponse => "empty-response",
            GenerateError::Protocol(_) => "protocol",
            GenerateError::Cancelled => "cancelled",
        }
    }
}

/// Errors from the interactive session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No changes to commit")]
    NoChanges,

    #[error("Cancelled by user")]
    Cancelled,

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl From<dialoguer::Error> for SessionError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                SessionError::Cancelled
            }
            other => SessionError::Prompt(other.to_string()),
        }
    }
}

impl SessionError {
    /// Whether the operator ended the session (menu choice or Ctrl-C).
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            SessionError::Cancelled | SessionError::Generate(GenerateError::Cancelled)
        )
    }
}
