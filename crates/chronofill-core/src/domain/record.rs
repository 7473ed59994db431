//! Records produced by the pull-request pipeline and run summaries.

use serde::{Deserialize, Serialize};

use super::event::DayPlan;

/// A pull request opened for a single synthetic commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Head branch; unique within a run.
    pub branch_name: String,

    /// Number assigned by the hosting service.
    pub pr_number: u64,

    /// Browser URL of the pull request.
    pub pr_url: String,
}

/// Owner and repository name of the origin remote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoIdentity {
    pub owner: String,
    pub repo_name: String,
}

impl RepoIdentity {
    pub fn new(owner: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
        }
    }
}

impl std::fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo_name)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// One plan per walked day, in day order.
    pub day_plans: Vec<DayPlan>,

    /// Commits created across all days.
    pub commits: u32,

    /// Pull requests opened, in creation order (PR variant only).
    pub pull_requests: Vec<PullRequestRecord>,

    /// Pull request numbers merged, in merge order.
    pub merged: Vec<u64>,

    /// Whether the simple variant pushed the current branch.
    pub pushed: bool,
}

impl RunSummary {
    pub fn days(&self) -> usize {
        self.day_plans.len()
    }
}
