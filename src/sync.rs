//! The end-to-end branch sync pipeline.

use std::future::Future;
use std::pin::Pin;

use crate::branch::validate_branch_name;
use crate::config::Config;
use crate::error::{BranchSyncError, Result};
use crate::github::{GitHost, Repository, list_repositories, resolve_owner};
use crate::runner::{RunReport, TaskRunner};
use crate::select::{RepoPrompt, Selection, select};

/// Creates one branch across a selection of an owner's repositories.
///
/// # Example
///
/// ```rust,no_run
/// use branch_sync::prelude::*;
///
/// # async fn demo() -> branch_sync::error::Result<()> {
/// let config = Config::from_env().with_org("acme");
/// let client = GitHubClient::from_config(&config, "ghp_your_token_here")?;
///
/// let report = BranchSync::new(client, config)
///     .run("release/2.0", &["api".to_string(), "web".to_string()], LinePrompt::stdio())
///     .await?;
///
/// for result in &report.results {
///     println!("{}", result);
/// }
/// println!("{}", report.summary);
/// # Ok(())
/// # }
/// ```
pub struct BranchSync<H> {
    host: H,
    config: Config,
}

impl<H: GitHost> BranchSync<H> {
    pub fn new(host: H, config: Config) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Run the pipeline, stopping on Ctrl-C.
    ///
    /// With `names` empty, `prompt` decides the working set; otherwise
    /// repositories are matched by name and the prompt is never used.
    /// Per-repository failures end up in the report. Owner resolution and
    /// listing failures, and a cancelled selection, are returned as errors
    /// before any branch is created.
    ///
    /// The branch name is validated here as well, so library callers get the
    /// same check the CLI performs before preflight.
    pub async fn run<P>(&self, branch: &str, names: &[String], prompt: P) -> Result<RunReport>
    where
        P: RepoPrompt + Send + 'static,
    {
        self.run_until(branch, names, prompt, interrupt_signal())
            .await
    }

    /// Run the pipeline, stopping when `interrupt` completes.
    ///
    /// An interrupt during selection is a [`BranchSyncError::SelectionCancelled`].
    /// Once branch creation has started it is a [`BranchSyncError::Interrupted`],
    /// and requests still in flight are dropped.
    pub async fn run_until<P, S>(
        &self,
        branch: &str,
        names: &[String],
        mut prompt: P,
        interrupt: S,
    ) -> Result<RunReport>
    where
        P: RepoPrompt + Send + 'static,
        S: Future<Output = ()>,
    {
        validate_branch_name(branch)?;
        tokio::pin!(interrupt);

        let owner = resolve_owner(&self.host, &self.config).await?;
        let repos = list_repositories(&self.host, &owner, self.config.repo_limit).await?;
        tracing::info!(owner = %owner, count = repos.len(), "repositories available");

        let selection = if names.is_empty() {
            prompt_for_selection(&repos, prompt, &mut interrupt).await?
        } else {
            select(&repos, names, &mut prompt)?
        };

        if !selection.missing.is_empty() {
            tracing::warn!(
                owner = %owner,
                missing = %selection.missing.join(", "),
                "repositories not found"
            );
        }

        if selection.chosen.is_empty() {
            tracing::info!("no repositories selected");
            return Ok(RunReport::new(
                owner.login,
                branch,
                selection.missing,
                Vec::new(),
            ));
        }

        tracing::info!(
            branch,
            count = selection.chosen.len(),
            dry_run = self.config.dry_run,
            "creating branch"
        );
        let runner = TaskRunner::new(&self.host, &owner.login)
            .concurrency(self.config.concurrency)
            .dry_run(self.config.dry_run);

        let results = tokio::select! {
            biased;
            () = &mut interrupt => {
                tracing::warn!(branch, "interrupted during branch creation");
                return Err(BranchSyncError::Interrupted);
            }
            results = runner.run(&selection.chosen, branch) => results,
        };

        Ok(RunReport::new(owner.login, branch, selection.missing, results))
    }
}

/// Completes on Ctrl-C. Never completes if the signal cannot be watched.
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Ask the user to choose, treating an interrupt as a cancelled selection.
///
/// The prompt blocks on input, so it runs on a blocking thread.
async fn prompt_for_selection<P, S>(
    repos: &[Repository],
    mut prompt: P,
    interrupt: &mut Pin<&mut S>,
) -> Result<Selection>
where
    P: RepoPrompt + Send + 'static,
    S: Future<Output = ()>,
{
    let repos = repos.to_vec();
    let chooser = tokio::task::spawn_blocking(move || select(&repos, &[], &mut prompt));

    tokio::select! {
        biased;
        () = interrupt.as_mut() => Err(BranchSyncError::SelectionCancelled),
        joined = chooser => joined.map_err(|e| BranchSyncError::Io(std::io::Error::other(e)))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::runner::BranchOutcome;
    use crate::select::Choice;
    use crate::test_support::{FakeHost, OWNER};

    /// Answers with fixed indices; panics if asked when it should not be.
    struct FixedPrompt(Option<Result<Vec<usize>>>);

    impl RepoPrompt for FixedPrompt {
        fn choose(&mut self, _choices: &[Choice]) -> Result<Vec<usize>> {
            self.0.take().expect("prompt consulted unexpectedly")
        }
    }

    fn never() -> FixedPrompt {
        FixedPrompt(None)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn acme_host() -> FakeHost {
        FakeHost::new()
            .with_repo("foo", Some("main"))
            .with_repo("bar", Some("develop"))
    }

    fn config() -> Config {
        Config::default().with_org(OWNER)
    }

    #[tokio::test]
    async fn test_named_run_reports_missing_and_creates() {
        let sync = BranchSync::new(acme_host(), config());

        let report = sync
            .run("x", &names(&["foo", "baz"]), never())
            .await
            .unwrap();

        assert_eq!(report.owner, OWNER);
        assert_eq!(report.missing, names(&["baz"]));
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].repository.name, "foo");
        assert!(matches!(
            report.results[0].outcome,
            BranchOutcome::Created { .. }
        ));
        assert_eq!(
            sync.host().create_calls(),
            vec!["foo:refs/heads/x".to_string()]
        );
    }

    #[tokio::test]
    async fn test_existing_branch_is_not_a_failure() {
        let host = acme_host().with_existing_branch("foo", "x");
        let sync = BranchSync::new(host, config());

        let report = sync.run("x", &names(&["foo"]), never()).await.unwrap();

        assert_eq!(report.results[0].outcome, BranchOutcome::AlreadyExists);
        assert!(!report.has_failures());
        assert_eq!(report.summary.already_existed, 1);
    }

    #[tokio::test]
    async fn test_empty_interactive_selection_creates_nothing() {
        let sync = BranchSync::new(acme_host(), config());

        let report = sync
            .run("x", &[], FixedPrompt(Some(Ok(Vec::new()))))
            .await
            .unwrap();

        assert!(report.nothing_selected());
        assert!(sync.host().create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_interactive_selection_uses_sorted_listing() {
        let sync = BranchSync::new(acme_host(), config());

        // Index 0 is acme/bar once sorted.
        let report = sync
            .run("x", &[], FixedPrompt(Some(Ok(vec![0]))))
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].repository.full_name, "acme/bar");
    }

    #[tokio::test]
    async fn test_cancelled_selection_creates_nothing() {
        let sync = BranchSync::new(acme_host(), config());

        let err = sync
            .run(
                "x",
                &[],
                FixedPrompt(Some(Err(BranchSyncError::SelectionCancelled))),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BranchSyncError::SelectionCancelled));
        assert!(sync.host().create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_owner_failure_aborts_before_listing() {
        let sync = BranchSync::new(acme_host(), Config::default());

        let err = sync.run("x", &names(&["foo"]), never()).await.unwrap_err();

        assert!(matches!(err, BranchSyncError::AuthResolution { .. }));
        assert_eq!(sync.host().calls(), vec!["authenticated_login".to_string()]);
    }

    #[tokio::test]
    async fn test_authenticated_user_is_owner() {
        let host = acme_host().with_login("octocat");
        let sync = BranchSync::new(host, Config::default());

        let report = sync.run("x", &names(&["bar"]), never()).await.unwrap();

        assert_eq!(report.owner, "octocat");
        assert!(sync.host().calls().contains(&"list octocat".to_string()));
    }

    #[tokio::test]
    async fn test_listing_failure_aborts() {
        let host = acme_host().with_list_error("HTTP 500: oops");
        let sync = BranchSync::new(host, config());

        let err = sync.run("x", &names(&["foo"]), never()).await.unwrap_err();

        assert!(matches!(err, BranchSyncError::RepositoryList { .. }));
        assert!(sync.host().create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_branch_name_makes_no_calls() {
        let sync = BranchSync::new(acme_host(), config());

        let err = sync
            .run("bad..name", &names(&["foo"]), never())
            .await
            .unwrap_err();

        assert!(matches!(err, BranchSyncError::InvalidBranchName { .. }));
        assert!(sync.host().calls().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_still_completes() {
        let host = acme_host().with_create_failure("bar", "HTTP 403: denied");
        let sync = BranchSync::new(host, config().with_concurrency(2));

        let report = sync
            .run("x", &names(&["foo", "bar"]), never())
            .await
            .unwrap();

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.created, 1);
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_interrupt_during_creation_stops_run() {
        let host = acme_host().with_hanging_create("foo");
        let sync = BranchSync::new(host, config());

        let err = sync
            .run_until(
                "x",
                &names(&["foo"]),
                never(),
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BranchSyncError::Interrupted));
        assert_eq!(
            sync.host().create_calls(),
            vec!["foo:refs/heads/x".to_string()]
        );
    }

    #[tokio::test]
    async fn test_interrupt_during_selection_cancels() {
        let sync = BranchSync::new(acme_host(), config());

        let err = sync
            .run_until(
                "x",
                &[],
                FixedPrompt(Some(Ok(vec![0]))),
                std::future::ready(()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BranchSyncError::SelectionCancelled));
        assert!(sync.host().create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_quiet_interrupt_lets_run_finish() {
        let sync = BranchSync::new(acme_host(), config());

        let report = sync
            .run_until("x", &names(&["foo"]), never(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(report.summary.created, 1);
    }

    #[tokio::test]
    async fn test_dry_run_from_config() {
        let sync = BranchSync::new(acme_host(), config().dry_run());

        let report = sync.run("x", &names(&["foo"]), never()).await.unwrap();

        assert_eq!(report.summary.would_create, 1);
        assert!(sync.host().create_calls().is_empty());
    }
}
