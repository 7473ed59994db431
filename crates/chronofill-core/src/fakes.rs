//! In-memory fakes for the pipeline seams (testing only)
//!
//! Provides `RecordingGit`, `RecordingPullRequestApi` and `ScriptedRandom`,
//! which satisfy the trait contracts without touching a repository, the
//! network, or an RNG.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{FillError, FillResult, RepoIdentity};
use crate::git::{CommitDates, GitOps, Remote};
use crate::pull_request::{CreatedPullRequest, MergeMethod, NewPullRequest, PullRequestApi};
use crate::schedule::RandomSource;

// ---------------------------------------------------------------------------
// RecordingGit
// ---------------------------------------------------------------------------

/// A git operation as seen by [`RecordingGit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Add(Vec<String>),
    Commit { message: String, dates: CommitDates },
    Push(Option<String>, Option<String>),
    Checkout(String),
    CheckoutNewBranch(String, String),
    Fetch,
    Pull(String, String),
    Remotes,
}

impl GitCall {
    fn op(&self) -> &'static str {
        match self {
            GitCall::Add(_) => "add",
            GitCall::Commit { .. } => "commit",
            GitCall::Push(..) => "push",
            GitCall::Checkout(_) | GitCall::CheckoutNewBranch(..) => "checkout",
            GitCall::Fetch => "fetch",
            GitCall::Pull(..) => "pull",
            GitCall::Remotes => "remote",
        }
    }
}

/// [`GitOps`] fake that records every call and can be told to fail an op.
#[derive(Debug)]
pub struct RecordingGit {
    calls: Mutex<Vec<GitCall>>,
    failing: Mutex<HashSet<&'static str>>,
    remotes: Vec<Remote>,
}

impl Default for RecordingGit {
    fn default() -> Self {
        Self::with_remotes(vec![Remote {
            name: "origin".to_string(),
            fetch_url: Some("git@github.com:acme/widgets.git".to_string()),
            push_url: Some("git@github.com:acme/widgets.git".to_string()),
        }])
    }
}

impl RecordingGit {
    /// Fake with a single `origin` pointing at `acme/widgets`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remotes(remotes: Vec<Remote>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            remotes,
        }
    }

    /// Make every later call of `op` (`"push"`, `"commit"`, ...) fail.
    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of commits recorded so far.
    pub fn commit_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, GitCall::Commit { .. }))
            .count()
    }

    fn record(&self, call: GitCall) -> FillResult<()> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(op) {
            return Err(FillError::Transaction {
                op: op.to_string(),
                detail: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GitOps for RecordingGit {
    async fn add(&self, paths: &[&Path]) -> FillResult<()> {
        let paths = paths.iter().map(|p| p.display().to_string()).collect();
        self.record(GitCall::Add(paths))
    }

    async fn commit(&self, message: &str, dates: &CommitDates) -> FillResult<String> {
        self.record(GitCall::Commit {
            message: message.to_string(),
            dates: dates.clone(),
        })?;
        Ok(format!("{:040x}", self.commit_count()))
    }

    async fn push(&self, remote: Option<&str>, branch: Option<&str>) -> FillResult<()> {
        self.record(GitCall::Push(
            remote.map(str::to_string),
            branch.map(str::to_string),
        ))
    }

    async fn checkout(&self, branch: &str) -> FillResult<()> {
        self.record(GitCall::Checkout(branch.to_string()))
    }

    async fn checkout_new_branch(&self, name: &str, from: &str) -> FillResult<()> {
        self.record(GitCall::CheckoutNewBranch(name.to_string(), from.to_string()))
    }

    async fn fetch(&self) -> FillResult<()> {
        self.record(GitCall::Fetch)
    }

    async fn pull(&self, remote: &str, branch: &str) -> FillResult<()> {
        self.record(GitCall::Pull(remote.to_string(), branch.to_string()))
    }

    async fn remotes(&self) -> FillResult<Vec<Remote>> {
        self.record(GitCall::Remotes)?;
        Ok(self.remotes.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingPullRequestApi
// ---------------------------------------------------------------------------

/// A remote call as seen by [`RecordingPullRequestApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Create(NewPullRequest),
    Merge(u64, MergeMethod),
}

/// [`PullRequestApi`] fake numbering pull requests 1, 2, 3, ...
#[derive(Debug, Default)]
pub struct RecordingPullRequestApi {
    calls: Mutex<Vec<ApiCall>>,
    next_number: Mutex<u64>,
    fail_create: Mutex<bool>,
    failing_merges: Mutex<HashSet<u64>>,
}

impl RecordingPullRequestApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self) {
        *self.fail_create.lock().unwrap() = true;
    }

    /// Make the merge of pull request `number` fail.
    pub fn fail_merge_of(&self, number: u64) {
        self.failing_merges.lock().unwrap().insert(number);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestApi for RecordingPullRequestApi {
    async fn create_pull_request(&self, request: &NewPullRequest) -> FillResult<CreatedPullRequest> {
        self.calls
            .lock()
            .unwrap()
            .push(ApiCall::Create(request.clone()));
        if *self.fail_create.lock().unwrap() {
            return Err(FillError::RemoteApi("injected create failure".to_string()));
        }

        let mut next = self.next_number.lock().unwrap();
        *next += 1;
        let RepoIdentity { owner, repo_name } = &request.repo;
        Ok(CreatedPullRequest {
            number: *next,
            html_url: format!("https://github.com/{owner}/{repo_name}/pull/{}", *next),
        })
    }

    async fn merge_pull_request(
        &self,
        _repo: &RepoIdentity,
        number: u64,
        method: MergeMethod,
    ) -> FillResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(ApiCall::Merge(number, method));
        if self.failing_merges.lock().unwrap().contains(&number) {
            return Err(FillError::RemoteApi(format!(
                "injected merge failure for #{number}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedRandom
// ---------------------------------------------------------------------------

/// [`RandomSource`] that replays a fixed script, cycling when exhausted.
///
/// Each value is clamped into the requested range.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    script: Vec<u32>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(script: Vec<u32>) -> Self {
        Self { script, pos: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        if self.script.is_empty() {
            return low;
        }
        let value = self.script[self.pos % self.script.len()];
        self.pos += 1;
        value.clamp(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_random_cycles_and_clamps() {
        let mut r = ScriptedRandom::new(vec![1, 99]);
        assert_eq!(r.int_inclusive(5, 10), 5);
        assert_eq!(r.int_inclusive(5, 10), 10);
        assert_eq!(r.int_inclusive(0, 200), 1);
    }

    #[tokio::test]
    async fn test_recording_git_injected_failure_is_still_recorded() {
        let git = RecordingGit::new();
        git.fail_on("push");
        assert!(git.push(None, None).await.is_err());
        assert_eq!(git.calls(), vec![GitCall::Push(None, None)]);
    }

    #[tokio::test]
    async fn test_recording_api_numbers_sequentially() {
        let api = RecordingPullRequestApi::new();
        let req = NewPullRequest {
            repo: RepoIdentity::new("acme", "widgets"),
            title: "t".to_string(),
            head: "h".to_string(),
            base: "main".to_string(),
            body: "b".to_string(),
        };
        assert_eq!(api.create_pull_request(&req).await.unwrap().number, 1);
        let second = api.create_pull_request(&req).await.unwrap();
        assert_eq!(second.number, 2);
        assert_eq!(second.html_url, "https://github.com/acme/widgets/pull/2");
    }
}
