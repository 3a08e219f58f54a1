//! Run configuration.
//!
//! A [`Config`] is loaded once at startup and passed explicitly to every
//! component, so nothing reads process-wide state after `main`.

use crate::error::{BranchSyncError, Result};
use std::time::Duration;
use url::Url;

/// Environment variable naming the owner to operate on.
pub const ORG_ENV: &str = "BRANCH_SYNC_GITHUB_ORG";

/// Environment variable overriding the GitHub API base URL.
pub const API_URL_ENV: &str = "BRANCH_SYNC_GITHUB_API_URL";

/// Environment variable overriding the `gh` executable.
pub const GH_PATH_ENV: &str = "BRANCH_SYNC_GH_PATH";

/// Token variables, checked in order.
pub const TOKEN_ENVS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_REPO_LIMIT: usize = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRIES: u32 = 2;

/// Configuration for one branch-sync run.
#[derive(Clone)]
pub struct Config {
    /// Explicit owner. When unset the authenticated user is used.
    pub org: Option<String>,
    /// API token. When unset the `gh` CLI is asked for one.
    pub token: Option<String>,
    /// Base URL of the GitHub REST API.
    pub api_url: String,
    /// The `gh` executable used for preflight and token lookup.
    pub gh_command: String,
    /// Maximum number of repositories processed at once.
    pub concurrency: usize,
    /// Maximum number of repositories listed for the owner.
    pub repo_limit: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Retries for read-only API calls.
    pub max_retries: u32,
    /// Resolve base commits but create nothing.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            org: None,
            token: None,
            api_url: DEFAULT_API_URL.into(),
            gh_command: "gh".into(),
            concurrency: DEFAULT_CONCURRENCY,
            repo_limit: DEFAULT_REPO_LIMIT,
            request_timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_RETRIES,
            dry_run: false,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("org", &self.org)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("gh_command", &self.gh_command)
            .field("concurrency", &self.concurrency)
            .field("repo_limit", &self.repo_limit)
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self {
            org: get(ORG_ENV),
            token: TOKEN_ENVS.iter().find_map(|&key| get(key)),
            ..Self::default()
        };
        if let Some(url) = get(API_URL_ENV) {
            config.api_url = url;
        }
        if let Some(gh) = get(GH_PATH_ENV) {
            config.gh_command = gh;
        }
        config
    }

    /// Override the owner. Blank names are ignored.
    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        let org = org.into().trim().to_string();
        if !org.is_empty() {
            self.org = Some(org);
        }
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Use a GitHub Enterprise API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        // Remove trailing slash if present
        if url.ends_with('/') {
            url.pop();
        }
        self.api_url = url;
        self
    }

    pub fn with_gh_command(mut self, command: impl Into<String>) -> Self {
        self.gh_command = command.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_repo_limit(mut self, limit: usize) -> Self {
        self.repo_limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Resolve base commits without creating any branch.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(BranchSyncError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.repo_limit == 0 {
            return Err(BranchSyncError::InvalidConfig(
                "repository limit must be at least 1".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(BranchSyncError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }

        let url = Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BranchSyncError::InvalidConfig(format!(
                "API URL must use http or https: {}",
                self.api_url
            )));
        }
        Ok(())
    }
}
