//! Branch creation on a single repository.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BranchSyncError, Result};
use crate::github::{CreateRefError, GitHost};

/// Characters git refuses in ref names.
static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x20\x7f~^:?*\[\\]").expect("valid regex"));

/// A branch to create on one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCreationRequest {
    pub owner: String,
    pub repository: String,
    pub branch: String,
}

impl BranchCreationRequest {
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            branch: branch.into(),
        }
    }

    /// Full ref path of the new branch.
    pub fn ref_path(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    fn failed(&self, message: String) -> BranchSyncError {
        BranchSyncError::BranchCreationFailed {
            repo: self.repository.clone(),
            message,
        }
    }
}

/// Where a new branch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchBase {
    /// Default branch at the time of the request.
    pub branch: String,
    /// Head commit of that branch.
    pub sha: String,
}

/// Look up the repository's current default branch and its head commit.
///
/// The default branch is fetched again rather than taken from the listing,
/// so a rename between listing and creation is picked up.
pub async fn resolve_base<H: GitHost + ?Sized>(
    host: &H,
    request: &BranchCreationRequest,
) -> Result<BranchBase> {
    let branch = host
        .default_branch(&request.owner, &request.repository)
        .await
        .map_err(|e| request.failed(format!("could not resolve default branch: {}", e)))?;

    let sha = host
        .branch_head(&request.owner, &request.repository, &branch)
        .await
        .map_err(|e| request.failed(format!("could not resolve head of '{}': {}", branch, e)))?;

    Ok(BranchBase { branch, sha })
}

/// Create the requested branch at the head of the default branch.
///
/// Returns [`BranchSyncError::AlreadyExists`] when the branch is already
/// there and [`BranchSyncError::BranchCreationFailed`] for anything else
/// that goes wrong.
pub async fn create_branch<H: GitHost + ?Sized>(
    host: &H,
    request: &BranchCreationRequest,
) -> Result<BranchBase> {
    let base = resolve_base(host, request).await?;

    match host
        .create_ref(
            &request.owner,
            &request.repository,
            &request.ref_path(),
            &base.sha,
        )
        .await
    {
        Ok(()) => Ok(base),
        Err(CreateRefError::AlreadyExists) => Err(BranchSyncError::AlreadyExists {
            repo: request.repository.clone(),
            branch: request.branch.clone(),
        }),
        Err(CreateRefError::Other(e)) => Err(request.failed(e.to_string())),
    }
}

/// Check a branch name against git's ref naming rules.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(BranchSyncError::InvalidBranchName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return invalid("name is empty");
    }
    if name == "@" {
        return invalid("'@' is reserved");
    }
    if name.starts_with("refs/") {
        return invalid("give the short branch name, not a full ref");
    }
    if name.starts_with('-') {
        return invalid("must not start with '-'");
    }
    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return invalid("empty path component");
    }
    if name.ends_with('.') {
        return invalid("must not end with '.'");
    }
    if name.contains("..") {
        return invalid("must not contain '..'");
    }
    if name.contains("@{") {
        return invalid("must not contain '@{'");
    }
    if let Some(found) = FORBIDDEN_CHARS.find(name) {
        return invalid(&format!("forbidden character {:?}", found.as_str()));
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return invalid("path component starts with '.'");
        }
        if component.ends_with(".lock") {
            return invalid("path component ends with '.lock'");
        }
    }

    Ok(())
}
