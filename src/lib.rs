//! # branch-sync
//!
//! Create one named branch across many repositories of a GitHub organization
//! or user, straight through the GitHub API.
//!
//! A run goes through these steps:
//! - preflight: find an API token (environment or the `gh` CLI)
//! - resolve the owner (configured organization or the authenticated user)
//! - list the owner's repositories
//! - select repositories by name, or interactively
//! - create `refs/heads/<branch>` at each default branch head, one result per
//!   repository
//!
//! A branch that already exists is reported as such and is not a failure.
//! A failure on one repository never stops the others.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use branch_sync::prelude::*;
//!
//! # async fn demo() -> branch_sync::error::Result<()> {
//! let config = Config::from_env();
//! let token = preflight::check(&config).await?;
//! let client = GitHubClient::from_config(&config, token)?;
//!
//! let report = BranchSync::new(client, config)
//!     .run("feature/login", &["web".to_string()], LinePrompt::stdio())
//!     .await?;
//!
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod branch;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod preflight;
pub mod runner;
pub mod select;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::branch::{
        BranchBase, BranchCreationRequest, create_branch, resolve_base, validate_branch_name,
    };
    pub use crate::config::Config;
    pub use crate::error::{BranchSyncError, Result};
    pub use crate::github::{
        CreateRefError, GitHost, GitHubClient, Owner, OwnerKind, RefOps, RepoOps, Repository,
        UserOps, list_repositories, resolve_owner,
    };
    pub use crate::preflight;
    pub use crate::runner::{BranchOutcome, RepoResult, RunReport, RunSummary, TaskRunner};
    pub use crate::select::{Choice, LinePrompt, RepoPrompt, Selection, select};
    pub use crate::sync::BranchSync;
}

pub use prelude::*;
