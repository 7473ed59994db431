//! One branch, one commit, one pull request per event, then a merge pass.
//!
//! [`BranchPrOrchestrator::commit_and_open_pr`] walks a single event through
//! [`PrStage`]s:
//!
//! 1. `BaseSynced`: fetch, check out the base branch, pull it
//! 2. `Branched`: create `commit-<utc stamp>-<suffix>` off the base
//! 3. `Committed`: marker commit with author and committer date pinned
//! 4. `Pushed`: push the branch to `origin`
//! 5. `PrCreated`: open a pull request into the base branch
//!
//! [`BranchPrOrchestrator::merge_all`] later merges every recorded pull
//! request in creation order and stops at the first failure.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commit::CommitFactory;
use crate::domain::{CommitEvent, FillError, FillResult, PullRequestRecord, RepoIdentity};
use crate::git::GitOps;
use crate::obs;
use crate::remote::ORIGIN;

/// Merge strategy requested from the hosting service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    #[default]
    Merge,
    Squash,
    Rebase,
}

impl MergeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MergeMethod {
    type Err = FillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "merge" => Ok(MergeMethod::Merge),
            "squash" => Ok(MergeMethod::Squash),
            "rebase" => Ok(MergeMethod::Rebase),
            other => Err(FillError::InvalidConfig(format!(
                "unknown merge method: {other} (expected merge, squash or rebase)"
            ))),
        }
    }
}

/// Request body for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub repo: RepoIdentity,
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

/// What the hosting service returns for a newly opened pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Remote code-hosting operations. Implementations do not retry.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    async fn create_pull_request(&self, request: &NewPullRequest) -> FillResult<CreatedPullRequest>;

    async fn merge_pull_request(
        &self,
        repo: &RepoIdentity,
        number: u64,
        method: MergeMethod,
    ) -> FillResult<()>;
}

/// Progress of a single event through the pull-request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrStage {
    BaseSynced,
    Branched,
    Committed,
    Pushed,
    PrCreated,
}

impl std::fmt::Display for PrStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PrStage::BaseSynced => "base_synced",
            PrStage::Branched => "branched",
            PrStage::Committed => "committed",
            PrStage::Pushed => "pushed",
            PrStage::PrCreated => "pr_created",
        };
        f.write_str(s)
    }
}

/// Branch name for an event: `commit-YYYYMMDD-HHMMSS-<suffix>`, stamp in UTC.
pub fn branch_name(timestamp: &DateTime<FixedOffset>, suffix: u32) -> String {
    format!(
        "commit-{}-{}",
        timestamp.with_timezone(&Utc).format("%Y%m%d-%H%M%S"),
        suffix
    )
}

/// Drives the per-event branch/commit/PR pipeline and the merge pass.
pub struct BranchPrOrchestrator {
    git: Arc<dyn GitOps>,
    api: Arc<dyn PullRequestApi>,
    factory: CommitFactory,
    base_branch: String,
    merge_method: MergeMethod,
}

impl BranchPrOrchestrator {
    pub fn new(
        git: Arc<dyn GitOps>,
        api: Arc<dyn PullRequestApi>,
        factory: CommitFactory,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            git,
            api,
            factory,
            base_branch: base_branch.into(),
            merge_method: MergeMethod::default(),
        }
    }

    pub fn with_merge_method(mut self, method: MergeMethod) -> Self {
        self.merge_method = method;
        self
    }

    pub fn base_branch(&self) -> &str {
        &self.base_branch
    }

    /// Fetch, check out the base branch and pull its latest tip.
    ///
    /// Runs before every event so each branch forks from the current tip.
    async fn sync_base(&self) -> FillResult<()> {
        self.git.fetch().await?;
        self.git.checkout(&self.base_branch).await?;
        self.git.pull(ORIGIN, &self.base_branch).await
    }

    /// Branch, commit, push and open a pull request for one event.
    pub async fn commit_and_open_pr(
        &self,
        repo: &RepoIdentity,
        event: &CommitEvent,
        branch_suffix: u32,
    ) -> FillResult<PullRequestRecord> {
        let branch = branch_name(&event.timestamp, branch_suffix);
        let date = self.factory.date_for(event);

        self.sync_base()
            .await
            .map_err(|e| e.at_stage(PrStage::BaseSynced))?;
        debug!(stage = %PrStage::BaseSynced, base = %self.base_branch);

        self.git
            .checkout_new_branch(&branch, &self.base_branch)
            .await
            .map_err(|e| e.at_stage(PrStage::Branched))?;
        debug!(stage = %PrStage::Branched, branch = %branch);

        let message = self.factory.message_for(event);
        self.factory
            .commit(event, &message)
            .await
            .map_err(|e| e.at_stage(PrStage::Committed))?;
        debug!(stage = %PrStage::Committed, branch = %branch, date = %date);

        self.git
            .push(Some(ORIGIN), Some(&branch))
            .await
            .map_err(|e| e.at_stage(PrStage::Pushed))?;
        debug!(stage = %PrStage::Pushed, branch = %branch);

        let request = NewPullRequest {
            repo: repo.clone(),
            title: format!("chore: PR for commit {}", event.sequence_label),
            head: branch.clone(),
            base: self.base_branch.clone(),
            body: format!("This PR corresponds to a single automated commit on {date}."),
        };
        let created = self
            .api
            .create_pull_request(&request)
            .await
            .map_err(|e| e.at_stage(PrStage::PrCreated))?;
        debug!(stage = %PrStage::PrCreated, pr = created.number);

        obs::emit_pr_opened(created.number, &branch, &created.html_url);
        Ok(PullRequestRecord {
            branch_name: branch,
            pr_number: created.number,
            pr_url: created.html_url,
        })
    }

    /// Merge `records` one at a time, in order.
    ///
    /// Returns the merged PR numbers. The first failure ends the pass with
    /// [`FillError::MergeAborted`], which still lists what was merged before
    /// it; nothing is rolled back.
    pub async fn merge_all(
        &self,
        repo: &RepoIdentity,
        records: &[PullRequestRecord],
    ) -> FillResult<Vec<u64>> {
        let mut merged = Vec::with_capacity(records.len());

        for record in records {
            info!(pr = record.pr_number, "Merging PR #{}...", record.pr_number);
            if let Err(e) = self
                .api
                .merge_pull_request(repo, record.pr_number, self.merge_method)
                .await
            {
                return Err(FillError::MergeAborted {
                    merged,
                    failed: record.pr_number,
                    source: Box::new(e),
                });
            }
            obs::emit_pr_merged(record.pr_number, self.merge_method.as_str());
            merged.push(record.pr_number);
        }

        Ok(merged)
    }
}
