//! Checks that run before any GitHub call.
//!
//! A run needs an API token. One given through the environment is used
//! directly; otherwise the GitHub CLI (`gh`) must be installed and logged in
//! so it can hand out its token.

use std::process::Stdio;

use tokio::process::Command;
use url::Url;

use crate::config::{Config, DEFAULT_API_URL};
use crate::error::{BranchSyncError, Result};

/// Printed when neither a token nor a usable `gh` is available.
pub const INSTALL_GUIDANCE: &str = "\
branch-sync needs the GitHub CLI (gh) or a GitHub token.
  Install gh from https://cli.github.com/ and run `gh auth login`,
  or export GITHUB_TOKEN with access to the target repositories.";

/// Whether `command --version` runs successfully.
pub async fn cli_available(command: &str) -> bool {
    Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Ask `gh` for the token of its logged-in account.
///
/// For GitHub Enterprise the host is taken from `api_url`.
pub async fn cli_token(command: &str, api_url: &str) -> Result<String> {
    let mut cmd = Command::new(command);
    cmd.args(["auth", "token"]).stdin(Stdio::null());
    if let Some(host) = enterprise_host(api_url) {
        cmd.arg("--hostname").arg(&host);
    }

    let output = cmd.output().await?;
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if !output.status.success() || token.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        return Err(BranchSyncError::PrerequisiteMissing {
            message: format!(
                "gh is not logged in{}{}\n  Run `gh auth login`, or export GITHUB_TOKEN.",
                if detail.is_empty() { "" } else { ": " },
                detail
            ),
        });
    }

    Ok(token)
}

/// Host name to pass to `gh` when the API is not github.com.
fn enterprise_host(api_url: &str) -> Option<String> {
    if api_url.trim_end_matches('/') == DEFAULT_API_URL {
        return None;
    }
    Url::parse(api_url)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
}

/// Verify prerequisites and return the API token to use.
///
/// Nothing else should run when this fails.
pub async fn check(config: &Config) -> Result<String> {
    if let Some(token) = &config.token {
        tracing::debug!("using token from environment");
        return Ok(token.clone());
    }

    if !cli_available(&config.gh_command).await {
        tracing::debug!(command = %config.gh_command, "gh CLI not available");
        return Err(BranchSyncError::PrerequisiteMissing {
            message: INSTALL_GUIDANCE.to_string(),
        });
    }

    tracing::debug!(command = %config.gh_command, "using token from gh CLI");
    cli_token(&config.gh_command, &config.api_url).await
}
