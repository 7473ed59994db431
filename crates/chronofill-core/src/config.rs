//! Run configuration, read once at process start.
//!
//! Values come from command-line arguments plus the environment. A `.env`
//! file in the working directory is loaded first (see [`load_dotenv`]).

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::DateRange;
use crate::domain::{FillError, FillResult};
use crate::marker::DEFAULT_MARKER_FILE;
use crate::pull_request::MergeMethod;
use crate::schedule::{RandomScheduler, ScheduleZone, StdRandom};

/// Base branch for the pull-request variant.
pub const BASE_BRANCH_ENV: &str = "BASE_BRANCH";
/// Token for the code-hosting API.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
/// API root, for GitHub Enterprise installations.
pub const GITHUB_API_URL_ENV: &str = "GITHUB_API_URL";

pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Load `.env` from the working directory if present. Existing variables win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }
}

/// Which pipeline a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Commits on the current branch, pushed once at the end.
    Commits,
    /// One branch and pull request per commit, merged at the end.
    PullRequests,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Commits => "commits",
            Variant::PullRequests => "prs",
        }
    }

    /// Date range used when none is given.
    pub fn default_range(&self) -> DateRange {
        let (start, end) = match self {
            Variant::Commits => ((2025, 9, 27), (2025, 9, 28)),
            Variant::PullRequests => ((2023, 1, 1), (2025, 4, 24)),
        };
        DateRange::new(ymd(start), ymd(end))
    }
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Credentials and endpoint of the code-hosting API. Not serializable, and
/// `Debug` redacts the token.
#[derive(Clone)]
pub struct GitHubSettings {
    pub token: String,
    pub api_url: String,
}

impl std::fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl GitHubSettings {
    /// Read `GITHUB_TOKEN` and `GITHUB_API_URL` from the process environment.
    pub fn from_env() -> FillResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. A missing or blank token is a
    /// [`FillError::MissingCredential`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> FillResult<Self> {
        let token = lookup(GITHUB_TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FillError::MissingCredential {
                name: GITHUB_TOKEN_ENV.to_string(),
            })?;
        let api_url = lookup(GITHUB_API_URL_ENV)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());

        Ok(Self {
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Resolve the base branch: explicit value, then `BASE_BRANCH`, then `main`.
pub fn base_branch(explicit: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> String {
    explicit
        .or_else(|| lookup(BASE_BRANCH_ENV))
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string())
}

/// Everything a run needs, fixed for its duration.
#[derive(Debug, Clone)]
pub struct FillConfig {
    pub variant: Variant,
    pub repo_dir: PathBuf,
    pub range: DateRange,
    pub marker_file: PathBuf,
    pub base_branch: String,
    pub zone: ScheduleZone,
    pub seed: Option<u64>,
    pub merge_method: MergeMethod,
    /// Present for the pull-request variant only.
    pub github: Option<GitHubSettings>,
}

impl FillConfig {
    /// Defaults for `variant`, working on the current directory.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            repo_dir: PathBuf::from("."),
            range: variant.default_range(),
            marker_file: PathBuf::from(DEFAULT_MARKER_FILE),
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            zone: ScheduleZone::Local,
            seed: None,
            merge_method: MergeMethod::Merge,
            github: None,
        }
    }

    /// Check preconditions that must hold before anything is mutated.
    pub fn validate(&self) -> FillResult<()> {
        if self.variant == Variant::PullRequests && self.github.is_none() {
            return Err(FillError::MissingCredential {
                name: GITHUB_TOKEN_ENV.to_string(),
            });
        }
        if self.marker_file.is_absolute() {
            return Err(FillError::InvalidConfig(format!(
                "marker file must be relative to the repository: {}",
                self.marker_file.display()
            )));
        }
        if self.base_branch.trim().is_empty() {
            return Err(FillError::InvalidConfig("base branch is empty".to_string()));
        }
        Ok(())
    }

    /// Scheduler over a seeded RNG if a seed is configured, else entropy.
    pub fn scheduler(&self) -> RandomScheduler {
        match self.seed {
            Some(seed) => RandomScheduler::new(StdRandom::seeded(seed)),
            None => RandomScheduler::new(StdRandom::from_entropy()),
        }
    }
}
