//! Running branch creation across the selected repositories.

use std::fmt;

use futures::stream::{self, StreamExt};

use crate::branch::{BranchCreationRequest, create_branch, resolve_base};
use crate::error::BranchSyncError;
use crate::github::{GitHost, Repository};

/// Result of a branch creation attempt on one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// Branch created at `sha`, the head of `base`.
    Created { base: String, sha: String },
    /// Dry run: the branch would be created at `sha`.
    WouldCreate { base: String, sha: String },
    /// The branch was already there. Not a failure.
    AlreadyExists,
    /// Creation failed for the given reason.
    Failed(String),
}

/// Outcome for a single repository.
#[derive(Debug, Clone)]
pub struct RepoResult {
    pub repository: Repository,
    pub branch: String,
    pub outcome: BranchOutcome,
}

impl fmt::Display for RepoResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.repository.full_name;
        match &self.outcome {
            BranchOutcome::Created { base, sha } => write!(
                f,
                "{:<15}{}  {} from {} @ {}",
                "created",
                name,
                self.branch,
                base,
                short_sha(sha)
            ),
            BranchOutcome::WouldCreate { base, sha } => write!(
                f,
                "{:<15}{}  {} from {} @ {}",
                "would create",
                name,
                self.branch,
                base,
                short_sha(sha)
            ),
            BranchOutcome::AlreadyExists => {
                write!(f, "{:<15}{}  {}", "already exists", name, self.branch)
            }
            BranchOutcome::Failed(reason) => write!(f, "{:<15}{}  {}", "failed", name, reason),
        }
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Counts per outcome.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub created: usize,
    pub would_create: usize,
    pub already_existed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_results(results: &[RepoResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            match result.outcome {
                BranchOutcome::Created { .. } => summary.created += 1,
                BranchOutcome::WouldCreate { .. } => summary.would_create += 1,
                BranchOutcome::AlreadyExists => summary.already_existed += 1,
                BranchOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.would_create > 0 {
            write!(f, "{} would be created, ", self.would_create)?;
        }
        write!(
            f,
            "{} created, {} already existed, {} failed ({} {})",
            self.created,
            self.already_existed,
            self.failed,
            self.total,
            if self.total == 1 {
                "repository"
            } else {
                "repositories"
            }
        )
    }
}

/// Everything a finished run has to report.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub owner: String,
    pub branch: String,
    /// Requested repository names that do not exist under the owner.
    pub missing: Vec<String>,
    /// One entry per selected repository, in selection order.
    pub results: Vec<RepoResult>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn new(
        owner: impl Into<String>,
        branch: impl Into<String>,
        missing: Vec<String>,
        results: Vec<RepoResult>,
    ) -> Self {
        let summary = RunSummary::from_results(&results);
        Self {
            owner: owner.into(),
            branch: branch.into(),
            missing,
            results,
            summary,
        }
    }

    /// True when no repository was selected and nothing was attempted.
    pub fn nothing_selected(&self) -> bool {
        self.results.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Runs branch creation on each repository, isolating failures.
pub struct TaskRunner<'a, H: ?Sized> {
    host: &'a H,
    owner: &'a str,
    concurrency: usize,
    dry_run: bool,
}

impl<'a, H: GitHost + ?Sized> TaskRunner<'a, H> {
    pub fn new(host: &'a H, owner: &'a str) -> Self {
        Self {
            host,
            owner,
            concurrency: 1,
            dry_run: false,
        }
    }

    /// Process up to `concurrency` repositories at once.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Create `branch` on every repository.
    ///
    /// Every repository gets exactly one result, whatever happened to the
    /// others. Results keep the order of `repos`.
    pub async fn run(&self, repos: &[Repository], branch: &str) -> Vec<RepoResult> {
        stream::iter(repos.iter().map(|repo| self.process(repo, branch)))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn process(&self, repo: &Repository, branch: &str) -> RepoResult {
        let request = BranchCreationRequest::new(self.owner, &repo.name, branch);

        let result = if self.dry_run {
            resolve_base(self.host, &request).await
        } else {
            create_branch(self.host, &request).await
        };

        let outcome = match result {
            Ok(base) if self.dry_run => BranchOutcome::WouldCreate {
                base: base.branch,
                sha: base.sha,
            },
            Ok(base) => BranchOutcome::Created {
                base: base.branch,
                sha: base.sha,
            },
            Err(BranchSyncError::AlreadyExists { .. }) => BranchOutcome::AlreadyExists,
            Err(BranchSyncError::BranchCreationFailed { message, .. }) => {
                BranchOutcome::Failed(message)
            }
            Err(e) => BranchOutcome::Failed(e.to_string()),
        };

        match &outcome {
            BranchOutcome::Created { base, sha } => {
                tracing::info!(repo = %repo.full_name, branch, base = %base, sha = %sha, "branch created")
            }
            BranchOutcome::WouldCreate { base, sha } => {
                tracing::info!(repo = %repo.full_name, branch, base = %base, sha = %sha, "dry run, branch not created")
            }
            BranchOutcome::AlreadyExists => {
                tracing::info!(repo = %repo.full_name, branch, "branch already exists")
            }
            BranchOutcome::Failed(reason) => {
                tracing::warn!(repo = %repo.full_name, branch, reason = %reason, "branch creation failed")
            }
        }

        RepoResult {
            repository: repo.clone(),
            branch: branch.to_string(),
            outcome,
        }
    }
}
