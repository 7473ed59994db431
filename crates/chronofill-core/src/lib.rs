//! chronofill core library
//!
//! Generates backdated commit history over a date range, either as plain
//! commits on the current branch or as one branch and pull request per
//! commit.
//!
//! ## Pipeline
//!
//! - [`calendar`]: inclusive day ranges
//! - [`schedule`]: random commit counts, times and delays
//! - [`commit`]: marker write + stage + dated commit
//! - [`pull_request`]: branch/commit/push/PR per event and the merge pass
//! - [`remote`]: owner/repo from the `origin` remote
//! - [`controller`]: ties the above together

pub mod calendar;
pub mod commit;
pub mod config;
pub mod controller;
pub mod domain;
pub mod fakes;
pub mod git;
pub mod marker;
pub mod obs;
pub mod pull_request;
pub mod remote;
pub mod schedule;
pub mod telemetry;

pub use calendar::{walk, DateRange};
pub use commit::{CommitFactory, CommitMode};
pub use config::{FillConfig, GitHubSettings, Variant};
pub use controller::RunController;
pub use domain::{
    CommitEvent, DayPlan, FillError, FillResult, PullRequestRecord, RepoIdentity, RunSummary,
};
pub use git::{is_git_repo, CommitDates, GitCli, GitOps, Remote};
pub use marker::{MarkerFile, MarkerPayload};
pub use obs::RunSpan;
pub use pull_request::{
    branch_name, BranchPrOrchestrator, CreatedPullRequest, MergeMethod, NewPullRequest, PrStage,
    PullRequestApi,
};
pub use remote::{parse_remote_url, RepoContextResolver};
pub use schedule::{RandomScheduler, RandomSource, ScheduleZone, StdRandom};
pub use telemetry::init_tracing;

/// chronofill version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
