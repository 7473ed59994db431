//! Commits pinned to a chosen timestamp.

use std::sync::Arc;

use crate::domain::{CommitEvent, FillResult};
use crate::git::{CommitDates, GitOps};
use crate::marker::{MarkerFile, MarkerPayload};
use crate::obs;

/// How the factory renders dates and which dates it pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Author date only, rendered with the scheduling offset; the marker
    /// carries the per-day sequence.
    Simple,
    /// Author and committer date, rendered in UTC; the marker carries the
    /// per-day sequence and a note.
    PullRequest,
}

/// Turns a [`CommitEvent`] into a real commit: marker write, stage, commit.
#[derive(Clone)]
pub struct CommitFactory {
    git: Arc<dyn GitOps>,
    marker: MarkerFile,
    mode: CommitMode,
}

impl CommitFactory {
    pub fn new(git: Arc<dyn GitOps>, marker: MarkerFile, mode: CommitMode) -> Self {
        Self { git, marker, mode }
    }

    pub fn mode(&self) -> CommitMode {
        self.mode
    }

    /// The date string handed to git for `event`.
    pub fn date_for(&self, event: &CommitEvent) -> String {
        match self.mode {
            CommitMode::Simple => event.local_rfc3339(),
            CommitMode::PullRequest => event.utc_rfc3339(),
        }
    }

    /// Default commit message for `event`.
    pub fn message_for(&self, event: &CommitEvent) -> String {
        let date = self.date_for(event);
        match self.mode {
            CommitMode::Simple => format!("Commit on {date}"),
            CommitMode::PullRequest => format!("chore: commit on {date}"),
        }
    }

    /// Rewrite the marker, stage it and commit with the event's date.
    ///
    /// Returns the new commit id. Failures propagate without retry.
    pub async fn commit(&self, event: &CommitEvent, message: &str) -> FillResult<String> {
        let date = self.date_for(event);
        let (payload, dates) = match self.mode {
            CommitMode::Simple => (
                MarkerPayload::sequenced(&date, event.sequence),
                CommitDates::author(&date),
            ),
            CommitMode::PullRequest => (
                MarkerPayload::for_pull_request(&date, event.sequence),
                CommitDates::pinned(&date),
            ),
        };

        self.marker.write(&payload).await?;
        self.git.add(&[self.marker.relative_path()]).await?;
        let sha = self.git.commit(message, &dates).await?;

        obs::emit_commit_created(&sha, &date, event.day_index, event.sequence);
        Ok(sha)
    }
}
