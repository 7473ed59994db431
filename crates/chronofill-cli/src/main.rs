//! chronofill - backdated commit history generator
//!
//! ## Commands
//!
//! - `commits`: dated commits on the current branch, pushed once at the end
//! - `prs`: one branch and pull request per commit, all merged at the end

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use chronofill_core::config::{base_branch, load_dotenv};
use chronofill_core::{
    is_git_repo, obs, BranchPrOrchestrator, CommitFactory, CommitMode, DateRange, FillConfig,
    FillError, GitCli, GitHubSettings, GitOps, MarkerFile, MergeMethod, RepoContextResolver,
    RunController, RunSpan, RunSummary, ScheduleZone, Variant,
};
use chronofill_github::GitHubClient;

#[derive(Parser)]
#[command(name = "chronofill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fill a git repository with backdated commit history", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines and a JSON run summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commit directly on the current branch, then push once
    Commits(RunArgs),

    /// Open and merge one pull request per commit
    Prs(RunArgs),
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Repository to write into
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// First day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Marker file rewritten by every commit, relative to the repository
    #[arg(long, default_value = "data.json")]
    marker: PathBuf,

    /// Seed for a reproducible schedule
    #[arg(long)]
    seed: Option<u64>,

    /// Draw times of day in UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Merge method for pull requests: merge, squash or rebase
    #[arg(long, default_value = "merge")]
    merge_method: MergeMethod,

    /// Base branch for pull requests (falls back to BASE_BRANCH, then main)
    #[arg(long)]
    base: Option<String>,
}

impl Commands {
    fn split(self) -> (Variant, RunArgs) {
        match self {
            Commands::Commits(args) => (Variant::Commits, args),
            Commands::Prs(args) => (Variant::PullRequests, args),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    chronofill_core::init_tracing(cli.json, level);

    let json = cli.json;
    let (variant, args) = cli.command.split();

    let summary = execute(variant, args, |key| std::env::var(key).ok()).await?;
    print_summary(&summary, variant, json)?;
    Ok(())
}

/// Merge command-line arguments with the environment into a validated config.
fn build_config(
    variant: Variant,
    args: RunArgs,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<FillConfig> {
    let mut config = FillConfig::new(variant);
    let defaults = variant.default_range();

    config.repo_dir = args.repo;
    config.range = DateRange::new(
        args.start.unwrap_or(defaults.start()),
        args.end.unwrap_or(defaults.end()),
    );
    config.marker_file = args.marker;
    config.seed = args.seed;
    config.zone = if args.utc {
        ScheduleZone::Utc
    } else {
        ScheduleZone::Local
    };
    config.merge_method = args.merge_method;
    config.base_branch = base_branch(args.base, &lookup);

    if variant == Variant::PullRequests {
        config.github = Some(GitHubSettings::from_vars(&lookup)?);
    }

    config.validate()?;
    Ok(config)
}

/// Configure and run `variant` inside a run span. Every failure, including
/// a bad configuration, is logged as `run.failed`.
async fn execute(
    variant: Variant,
    args: RunArgs,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RunSummary> {
    let span = RunSpan::enter(variant.name());

    let result = match build_config(variant, args, lookup) {
        Ok(config) => {
            info!(run_id = %span.run_id(), repo = %config.repo_dir.display(), "starting run");
            run(&config).await.map_err(anyhow::Error::from)
        }
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        obs::emit_run_failed(&format!("{e:#}"));
    }
    result.with_context(|| format!("{} run failed", variant.name()))
}

async fn run(config: &FillConfig) -> Result<RunSummary, FillError> {
    ensure_git_repo(&config.repo_dir).await?;

    let git: Arc<dyn GitOps> = Arc::new(GitCli::new(&config.repo_dir));
    let marker = MarkerFile::new(&config.repo_dir, &config.marker_file);
    let mut controller = RunController::new(config.scheduler(), config.range, config.zone);

    match config.variant {
        Variant::Commits => {
            let factory = CommitFactory::new(git.clone(), marker, CommitMode::Simple);
            controller.run_commits(git.as_ref(), &factory).await
        }
        Variant::PullRequests => {
            let settings = config
                .github
                .as_ref()
                .ok_or_else(|| FillError::MissingCredential {
                    name: chronofill_core::config::GITHUB_TOKEN_ENV.to_string(),
                })?;
            let api = Arc::new(GitHubClient::new(settings)?);
            let factory = CommitFactory::new(git.clone(), marker, CommitMode::PullRequest);
            let orchestrator =
                BranchPrOrchestrator::new(git.clone(), api, factory, config.base_branch.clone())
                    .with_merge_method(config.merge_method);
            let resolver = RepoContextResolver::new(git);
            controller.run_pull_requests(&resolver, &orchestrator).await
        }
    }
}

async fn ensure_git_repo(dir: &Path) -> Result<(), FillError> {
    if is_git_repo(dir).await {
        Ok(())
    } else {
        Err(FillError::InvalidConfig(format!(
            "not a git repository: {}",
            dir.display()
        )))
    }
}

fn print_summary(summary: &RunSummary, variant: Variant, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Created {} commits over {} days",
        summary.commits,
        summary.days()
    );
    match variant {
        Variant::Commits => {
            if summary.pushed {
                println!("Pushed current branch");
            }
        }
        Variant::PullRequests => {
            println!(
                "Opened {} pull requests, merged {}",
                summary.pull_requests.len(),
                summary.merged.len()
            );
        }
    }
    Ok(())
}
