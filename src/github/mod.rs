//! GitHub API integration.
//!
//! The operations branch-sync needs from the hosting service are split into
//! three traits, one per concern:
//! - [`UserOps`]: who the credential belongs to
//! - [`RepoOps`]: listing repositories and reading their default branch
//! - [`RefOps`]: reading a branch head and creating new refs
//!
//! [`GitHubClient`] implements all of them on top of `octocrab`. Anything
//! implementing the three traits is a [`GitHost`] and can drive a run.
//!
//! # Example
//!
//! ```rust,no_run
//! use branch_sync::github::{GitHubClient, Owner, list_repositories};
//!
//! # async fn demo() -> branch_sync::error::Result<()> {
//! let client = GitHubClient::new("ghp_your_token_here")?;
//! let repos = list_repositories(&client, &Owner::organization("my-org"), 1000).await?;
//!
//! for repo in repos {
//!     println!("{} ({})", repo.full_name, repo.default_branch);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod refs;
mod repos;
mod user;

pub use client::GitHubClient;
pub use refs::{CreateRefError, RefOps, classify_create_ref_error};
pub use repos::{ApiRepository, RepoOps, Repository, list_repositories};
pub use user::{Owner, OwnerKind, UserOps, resolve_owner};

/// Everything a branch-sync run needs from the hosting service.
pub trait GitHost: UserOps + RepoOps + RefOps {}

impl<T: UserOps + RepoOps + RefOps + ?Sized> GitHost for T {}
