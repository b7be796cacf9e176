use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EccError {
    #[error("backup of {path} failed: {reason}")]
    BackupFailed { path: PathBuf, reason: String },

    /// The destination has been restored from its backup (or was never touched).
    #[error("merge into {path} failed: {reason}")]
    MergeFailed { path: PathBuf, reason: String },

    #[error("invalid fragment {path}: {reason}")]
    FragmentInvalid { path: PathBuf, reason: String },

    /// Never fatal: callers log it and leave the placeholder in place.
    #[error("credential lookup via '{source_name}' failed: {reason}")]
    CredentialLookupFailed { source_name: String, reason: String },

    #[error("required tool not found on PATH: {0}")]
    DependencyMissing(String),

    #[error("invalid JSON path '{path}': {reason}")]
    InvalidJsonPath { path: String, reason: String },

    #[error("invalid preservation rule '{0}': expected PATH or PATH=CHECK")]
    InvalidRule(String),

    #[error("invalid bundle config: {0}")]
    InvalidConfig(String),

    #[error("cannot auto-detect bundle source directory (tried {0}); pass --src explicitly")]
    SourceNotFound(String),

    #[error("no backup found at {0}")]
    BackupMissing(PathBuf),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EccError>;
