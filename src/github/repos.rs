//! Repository listing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BranchSyncError, Result};
use crate::github::client::status_code;
use crate::github::{GitHubClient, Owner, OwnerKind, UserOps};

/// Largest page GitHub serves for repository listings.
const PAGE_SIZE: usize = 100;

/// Branch assumed when the API reports none.
pub const FALLBACK_DEFAULT_BRANCH: &str = "main";

/// Repository as returned by the listing endpoints.
///
/// Only the fields branch-sync reads are kept, and those GitHub may omit are
/// optional. [`list_repositories`] turns these into [`Repository`] values.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepository {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// A repository that can be targeted by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Name, unique within the owner.
    pub name: String,
    pub default_branch: String,
    /// `owner/name`.
    pub full_name: String,
}

impl Repository {
    /// Normalize a listing entry for `owner`.
    pub fn from_api(owner: &str, repo: ApiRepository) -> Self {
        let default_branch = repo
            .default_branch
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_DEFAULT_BRANCH.to_string());
        let full_name = repo
            .full_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{}/{}", owner, repo.name));

        Self {
            name: repo.name,
            default_branch,
            full_name,
        }
    }

    /// Label shown in the interactive chooser.
    pub fn label(&self) -> String {
        format!("{} ({})", self.full_name, self.default_branch)
    }
}

/// Repository listing and lookup operations.
#[async_trait]
pub trait RepoOps: Send + Sync {
    /// List at most `limit` repositories belonging to `owner`.
    async fn list_owner_repositories(
        &self,
        owner: &Owner,
        limit: usize,
    ) -> Result<Vec<ApiRepository>>;

    /// Current default branch of a repository.
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Serialize)]
struct ListParams<'a> {
    per_page: usize,
    page: usize,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    repo_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    affiliation: Option<&'a str>,
}

impl<'a> ListParams<'a> {
    fn new(limit: usize) -> Self {
        Self {
            per_page: PAGE_SIZE.min(limit),
            page: 1,
            repo_type: None,
            affiliation: None,
        }
    }

    fn repo_type(mut self, repo_type: &'a str) -> Self {
        self.repo_type = Some(repo_type);
        self
    }

    fn affiliation(mut self, affiliation: &'a str) -> Self {
        self.affiliation = Some(affiliation);
        self
    }
}

impl GitHubClient {
    /// Whether the credential belongs to `login`. Logins are case-insensitive.
    async fn is_authenticated_as(&self, login: &str) -> bool {
        match self.authenticated_login().await {
            Ok(me) => me.eq_ignore_ascii_case(login),
            Err(e) => {
                tracing::debug!(error = %e, "identity lookup failed, assuming another user");
                false
            }
        }
    }

    async fn list_pages(
        &self,
        route: &str,
        mut params: ListParams<'_>,
        limit: usize,
    ) -> octocrab::Result<Vec<ApiRepository>> {
        let mut all_repos = Vec::new();

        while all_repos.len() < limit {
            let repos: Vec<ApiRepository> = self.get(route, Some(&params)).await?;
            let last_page = repos.len() < params.per_page;
            all_repos.extend(repos);

            if last_page {
                break;
            }
            params.page += 1;
        }

        all_repos.truncate(limit);
        Ok(all_repos)
    }
}

#[async_trait]
impl RepoOps for GitHubClient {
    async fn list_owner_repositories(
        &self,
        owner: &Owner,
        limit: usize,
    ) -> Result<Vec<ApiRepository>> {
        let params = ListParams::new(limit);

        let repos = match owner.kind {
            OwnerKind::AuthenticatedUser => {
                self.list_pages("/user/repos", params.affiliation("owner"), limit)
                    .await?
            }
            OwnerKind::Organization => {
                let route = format!("/orgs/{}/repos", owner.login);
                match self.list_pages(&route, params.repo_type("all"), limit).await {
                    Err(e) if status_code(&e) == Some(404) => {
                        if self.is_authenticated_as(&owner.login).await {
                            // The public user listing hides the caller's private repositories.
                            tracing::debug!(owner = %owner, "owner is the authenticated user");
                            self.list_pages("/user/repos", params.affiliation("owner"), limit)
                                .await?
                        } else {
                            tracing::debug!(owner = %owner, "not an organization, listing user repositories");
                            let route = format!("/users/{}/repos", owner.login);
                            self.list_pages(&route, params.repo_type("owner"), limit)
                                .await?
                        }
                    }
                    result => result?,
                }
            }
        };

        Ok(repos)
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct RepoDetails {
            default_branch: Option<String>,
        }

        let endpoint = format!("/repos/{}/{}", owner, repo);
        let details: RepoDetails = self.get(&endpoint, None::<&()>).await?;

        Ok(details
            .default_branch
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_DEFAULT_BRANCH.to_string()))
    }
}

/// List every repository of `owner`, normalized and sorted by full name.
///
/// The listing is bounded by `limit` rather than paged indefinitely. Any
/// failure is fatal for the run since there is nothing to select from.
pub async fn list_repositories<H: RepoOps + ?Sized>(
    host: &H,
    owner: &Owner,
    limit: usize,
) -> Result<Vec<Repository>> {
    let raw = host
        .list_owner_repositories(owner, limit)
        .await
        .map_err(|e| BranchSyncError::RepositoryList {
            owner: owner.login.clone(),
            message: e.to_string(),
        })?;

    let mut repos: Vec<Repository> = raw
        .into_iter()
        .map(|repo| Repository::from_api(&owner.login, repo))
        .collect();
    repos.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    tracing::debug!(owner = %owner, count = repos.len(), "listed repositories");
    Ok(repos)
}
