//! Authenticated identity and owner resolution.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{BranchSyncError, Result};
use crate::github::GitHubClient;

/// The namespace whose repositories a run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub login: String,
    pub kind: OwnerKind,
}

/// How an owner was determined, which decides how its repositories are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    /// Named explicitly in configuration. Usually an organization, but a
    /// user account is accepted too.
    Organization,
    /// The account the API credential belongs to.
    AuthenticatedUser,
}

impl Owner {
    pub fn organization(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            kind: OwnerKind::Organization,
        }
    }

    pub fn authenticated_user(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            kind: OwnerKind::AuthenticatedUser,
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.login)
    }
}

/// Identity lookups.
#[async_trait]
pub trait UserOps: Send + Sync {
    /// Login of the user the credential authenticates as.
    async fn authenticated_login(&self) -> Result<String>;
}

#[derive(Deserialize)]
struct AuthenticatedUser {
    login: String,
}

#[async_trait]
impl UserOps for GitHubClient {
    async fn authenticated_login(&self) -> Result<String> {
        let user: AuthenticatedUser = self.get("/user", None::<&()>).await?;
        Ok(user.login)
    }
}

/// Determine the owner to operate on.
///
/// A configured organization is returned as-is without touching the network.
/// Otherwise the authenticated user is looked up; failing that, the run
/// cannot proceed.
pub async fn resolve_owner<H: UserOps + ?Sized>(host: &H, config: &Config) -> Result<Owner> {
    if let Some(org) = &config.org {
        tracing::debug!(owner = %org, "using configured owner");
        return Ok(Owner::organization(org.clone()));
    }

    let login = host
        .authenticated_login()
        .await
        .map_err(|e| BranchSyncError::AuthResolution {
            message: e.to_string(),
        })?;
    tracing::debug!(owner = %login, "using authenticated user as owner");
    Ok(Owner::authenticated_user(login))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeHost;

    #[tokio::test]
    async fn test_configured_org_skips_identity_lookup() {
        let host = FakeHost::new();
        let config = Config::default().with_org("acme");

        let owner = resolve_owner(&host, &config).await.unwrap();

        assert_eq!(owner, Owner::organization("acme"));
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_authenticated_user() {
        let host = FakeHost::new().with_login("octocat");

        let owner = resolve_owner(&host, &Config::default()).await.unwrap();

        assert_eq!(owner, Owner::authenticated_user("octocat"));
        assert_eq!(host.calls(), vec!["authenticated_login".to_string()]);
    }

    #[tokio::test]
    async fn test_identity_failure_is_auth_resolution_error() {
        let host = FakeHost::new();

        let err = resolve_owner(&host, &Config::default()).await.unwrap_err();

        assert!(matches!(err, BranchSyncError::AuthResolution { .. }));
    }
}
