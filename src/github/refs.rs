//! Git reference operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BranchSyncError, Result};
use crate::github::GitHubClient;
use crate::github::client::status_code;

/// Failure of a ref creation request.
#[derive(Debug)]
pub enum CreateRefError {
    /// The ref is already present. Expected when re-running a sync.
    AlreadyExists,
    Other(BranchSyncError),
}

impl From<BranchSyncError> for CreateRefError {
    fn from(err: BranchSyncError) -> Self {
        Self::Other(err)
    }
}

/// Reference lookups and creation.
#[async_trait]
pub trait RefOps: Send + Sync {
    /// Commit SHA the branch currently points at.
    async fn branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<String>;

    /// Create `ref_path` (e.g. `refs/heads/feature`) pointing at `sha`.
    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
        sha: &str,
    ) -> std::result::Result<(), CreateRefError>;
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Serialize)]
struct NewRef<'a> {
    #[serde(rename = "ref")]
    ref_path: &'a str,
    sha: &'a str,
}

#[async_trait]
impl RefOps for GitHubClient {
    async fn branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
        let endpoint = format!("/repos/{}/{}/git/ref/heads/{}", owner, repo, branch);
        let git_ref: GitRef = self.get(&endpoint, None::<&()>).await?;
        Ok(git_ref.object.sha)
    }

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
        sha: &str,
    ) -> std::result::Result<(), CreateRefError> {
        let endpoint = format!("/repos/{}/{}/git/refs", owner, repo);
        let body = NewRef { ref_path, sha };

        self.post::<serde_json::Value, _>(&endpoint, &body)
            .await
            .map(|_| ())
            .map_err(classify_create_ref_error)
    }
}

/// Translate a ref creation failure.
///
/// GitHub answers a duplicate ref with `422 Unprocessable Entity` and the
/// message "Reference already exists". Every other failure stays an error.
pub fn classify_create_ref_error(err: octocrab::Error) -> CreateRefError {
    if status_code(&err) == Some(422)
        && let octocrab::Error::GitHub { source, .. } = &err
        && source
            .message
            .to_ascii_lowercase()
            .contains("reference already exists")
    {
        return CreateRefError::AlreadyExists;
    }
    CreateRefError::Other(err.into())
}
