//! CLI for branch-sync.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use branch_sync::config::{DEFAULT_CONCURRENCY, DEFAULT_REPO_LIMIT, DEFAULT_RETRIES};
use branch_sync::logging;
use branch_sync::prelude::*;
use clap::Parser;

const EXAMPLES: &str = "\
Examples:
  branch-sync feature/login                 choose repositories interactively
  branch-sync release/2.0 api web worker    create the branch on three repositories
  BRANCH_SYNC_GITHUB_ORG=acme branch-sync hotfix api

Environment:
  BRANCH_SYNC_GITHUB_ORG       organization or user to operate on
                               (default: the authenticated user)
  GITHUB_TOKEN, GH_TOKEN       API token (default: `gh auth token`)
  BRANCH_SYNC_GITHUB_API_URL   GitHub Enterprise API base URL
  BRANCH_SYNC_GH_PATH          gh executable to use";

#[derive(Parser)]
#[command(name = "branch-sync")]
#[command(author, version, about = "Create a branch across many GitHub repositories", long_about = None)]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Name of the branch to create
    branch: String,

    /// Repositories to create it on; omit to choose interactively
    repos: Vec<String>,

    /// Organization or user owning the repositories
    #[arg(short, long)]
    org: Option<String>,

    /// GitHub API base URL (GitHub Enterprise)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Path to the gh executable
    #[arg(long, value_name = "PATH")]
    gh_path: Option<String>,

    /// Number of repositories processed at once
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Maximum number of repositories to list
    #[arg(long, default_value_t = DEFAULT_REPO_LIMIT)]
    limit: usize,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Retries for read-only API calls
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    /// Show what would be created without creating anything
    #[arg(long)]
    dry_run: bool,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "BRANCH_SYNC_LOG")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level) {
        eprintln!("warning: {}", e);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(cli));
    // A cancelled prompt may still be blocked reading stdin.
    runtime.shutdown_background();
    code
}

async fn run(cli: Cli) -> ExitCode {
    match execute(cli).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => match e.downcast_ref::<BranchSyncError>() {
            Some(BranchSyncError::SelectionCancelled) => {
                eprintln!("Selection cancelled, no branches were created.");
                ExitCode::SUCCESS
            }
            Some(BranchSyncError::Interrupted) => {
                eprintln!("Interrupted. Branches may already exist on some repositories.");
                ExitCode::from(130)
            }
            _ => {
                eprintln!("error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn execute(cli: Cli) -> Result<RunReport> {
    // Checked again by `BranchSync::run`; here it fails fast, before preflight.
    validate_branch_name(&cli.branch)?;

    let config = build_config(&cli);
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let token = preflight::check(&config).await?;
    let client =
        GitHubClient::from_config(&config, token).context("failed to create GitHub client")?;

    let report = BranchSync::new(client, config)
        .run(&cli.branch, &cli.repos, LinePrompt::stdio())
        .await?;
    Ok(report)
}

/// Environment first, then command-line flags on top.
fn build_config(cli: &Cli) -> Config {
    let mut config = Config::from_env()
        .with_concurrency(cli.concurrency)
        .with_repo_limit(cli.limit)
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_retries(cli.retries);

    if let Some(org) = &cli.org {
        config = config.with_org(org);
    }
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(gh) = &cli.gh_path {
        config = config.with_gh_command(gh);
    }
    if cli.dry_run {
        config = config.dry_run();
    }
    config
}

fn print_report(report: &RunReport) {
    if !report.missing.is_empty() {
        eprintln!(
            "warning: not found in {}: {}",
            report.owner,
            report.missing.join(", ")
        );
    }

    if report.nothing_selected() {
        println!("No repositories selected.");
        return;
    }

    for result in &report.results {
        println!("{}", result);
    }
    println!();
    println!("{}", report.summary);
}
