//! In-memory [`GitHost`](crate::github::GitHost) used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{BranchSyncError, Result};
use crate::github::{ApiRepository, CreateRefError, Owner, RefOps, RepoOps, UserOps};

pub(crate) const OWNER: &str = "acme";

fn failure(message: &str) -> BranchSyncError {
    BranchSyncError::Io(std::io::Error::other(message.to_string()))
}

/// Fake hosting service. Every call is recorded in order.
#[derive(Default)]
pub(crate) struct FakeHost {
    login: Option<String>,
    repos: Vec<ApiRepository>,
    list_error: Option<String>,
    default_branches: HashMap<String, String>,
    heads: HashMap<(String, String), String>,
    create_failures: HashMap<String, String>,
    hanging_creates: HashSet<String>,
    refs: Mutex<HashSet<(String, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login(mut self, login: &str) -> Self {
        self.login = Some(login.to_string());
        self
    }

    /// Add a repository whose default branch head is `sha-<name>`.
    ///
    /// A `None` default branch is omitted from the listing but reported as
    /// `main` by the repository lookup.
    pub fn with_repo(mut self, name: &str, default_branch: Option<&str>) -> Self {
        let branch = default_branch.unwrap_or("main").to_string();
        self.repos.push(ApiRepository {
            name: name.to_string(),
            full_name: Some(format!("{}/{}", OWNER, name)),
            default_branch: default_branch.map(String::from),
        });
        self.heads
            .insert((name.to_string(), branch.clone()), Self::head_of(name));
        self.default_branches.insert(name.to_string(), branch);
        self
    }

    /// Change the default branch reported at creation time, leaving the
    /// listing untouched.
    pub fn with_renamed_default(mut self, name: &str, branch: &str) -> Self {
        self.default_branches
            .insert(name.to_string(), branch.to_string());
        self.heads
            .insert((name.to_string(), branch.to_string()), Self::head_of(name));
        self
    }

    pub fn with_existing_branch(self, repo: &str, branch: &str) -> Self {
        self.refs
            .lock()
            .unwrap()
            .insert((repo.to_string(), format!("refs/heads/{}", branch)));
        self
    }

    pub fn with_create_failure(mut self, repo: &str, message: &str) -> Self {
        self.create_failures
            .insert(repo.to_string(), message.to_string());
        self
    }

    /// Ref creation on `repo` never answers.
    pub fn with_hanging_create(mut self, repo: &str) -> Self {
        self.hanging_creates.insert(repo.to_string());
        self
    }

    pub fn with_missing_head(mut self, repo: &str) -> Self {
        self.heads.retain(|(name, _), _| name != repo);
        self
    }

    pub fn with_list_error(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn head_of(name: &str) -> String {
        format!("sha-{}", name)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that attempted to create a ref, as `repo:ref`.
    pub fn create_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("create_ref ").map(String::from))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl UserOps for FakeHost {
    async fn authenticated_login(&self) -> Result<String> {
        self.record("authenticated_login".into());
        self.login
            .clone()
            .ok_or_else(|| failure("HTTP 401: Bad credentials"))
    }
}

#[async_trait]
impl RepoOps for FakeHost {
    async fn list_owner_repositories(
        &self,
        owner: &Owner,
        limit: usize,
    ) -> Result<Vec<ApiRepository>> {
        self.record(format!("list {}", owner.login));
        match &self.list_error {
            Some(message) => Err(failure(message)),
            None => Ok(self.repos.iter().take(limit).cloned().collect()),
        }
    }

    async fn default_branch(&self, _owner: &str, repo: &str) -> Result<String> {
        self.record(format!("default_branch {}", repo));
        self.default_branches
            .get(repo)
            .cloned()
            .ok_or_else(|| failure("HTTP 404: Not Found"))
    }
}

#[async_trait]
impl RefOps for FakeHost {
    async fn branch_head(&self, _owner: &str, repo: &str, branch: &str) -> Result<String> {
        self.record(format!("branch_head {}:{}", repo, branch));
        self.heads
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
            .ok_or_else(|| failure("HTTP 404: Not Found"))
    }

    async fn create_ref(
        &self,
        _owner: &str,
        repo: &str,
        ref_path: &str,
        _sha: &str,
    ) -> std::result::Result<(), CreateRefError> {
        self.record(format!("create_ref {}:{}", repo, ref_path));
        if self.hanging_creates.contains(repo) {
            std::future::pending::<()>().await;
        }
        if let Some(message) = self.create_failures.get(repo) {
            return Err(CreateRefError::Other(failure(message)));
        }
        let inserted = self
            .refs
            .lock()
            .unwrap()
            .insert((repo.to_string(), ref_path.to_string()));
        if inserted {
            Ok(())
        } else {
            Err(CreateRefError::AlreadyExists)
        }
    }
}
