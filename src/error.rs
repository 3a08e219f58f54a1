//! Error types for branch-sync.

use thiserror::Error;

/// The main error type for branch synchronization.
#[derive(Error, Debug)]
pub enum BranchSyncError {
    /// The `gh` CLI or a usable credential is missing. The message carries
    /// installation or login guidance.
    #[error("{message}")]
    PrerequisiteMissing { message: String },

    #[error("Could not determine the authenticated GitHub user: {message}")]
    AuthResolution { message: String },

    #[error("Failed to list repositories for {owner}: {message}")]
    RepositoryList { owner: String, message: String },

    #[error("Repository selection cancelled")]
    SelectionCancelled,

    /// Stopped by the user while branches were being created.
    #[error("Interrupted while creating branches")]
    Interrupted,

    #[error("Branch '{branch}' already exists in {repo}")]
    AlreadyExists { repo: String, branch: String },

    #[error("Branch creation failed for {repo}: {message}")]
    BranchCreationFailed { repo: String, message: String },

    #[error("Invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("GitHub API error: {}", describe_octocrab(.0))]
    GitHub(#[from] octocrab::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A specialized Result type for branch-sync operations.
pub type Result<T> = std::result::Result<T, BranchSyncError>;

/// A one-line description of an `octocrab` error.
///
/// `octocrab`'s own `Display` appends a backtrace, which is noise in a
/// per-repository status line.
pub(crate) fn describe_octocrab(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            format!("HTTP {}: {}", source.status_code.as_u16(), source.message)
        }
        octocrab::Error::Service { source, .. } => source.to_string(),
        other => other
            .to_string()
            .lines()
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
