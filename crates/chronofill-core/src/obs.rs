//! Structured run lifecycle events.
//!
//! Every generated commit and pull request is reported through one of the
//! `emit_*` functions so that JSON logs (`--json`) can be filtered by the
//! `event` field.

use tracing::info;

use crate::domain::RunSummary;

/// RAII guard that keeps a run-scoped span entered.
///
/// ```ignore
/// let _span = RunSpan::enter("prs");
/// // events below carry run_id and variant
/// ```
pub struct RunSpan {
    run_id: uuid::Uuid,
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Enter a `chronofill.run` span with a fresh run id.
    pub fn enter(variant: &str) -> Self {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("chronofill.run", run_id = %run_id, variant = %variant);
        Self {
            run_id,
            _span: span.entered(),
        }
    }

    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }
}

pub fn emit_run_started(variant: &str, start: &str, end: &str, days: usize) {
    info!(event = "run.started", variant = %variant, start = %start, end = %end, days = days);
}

/// Emit event: a day has been planned.
pub fn emit_day_planned(date: &str, day_index: u32, commit_count: u32) {
    tracing::debug!(
        event = "day.planned",
        date = %date,
        day_index = day_index,
        commit_count = commit_count,
    );
}

/// Emit event: one commit created at its pinned date.
pub fn emit_commit_created(sha: &str, date: &str, day_index: u32, sequence: u32) {
    info!(
        event = "commit.created",
        sha = %sha,
        date = %date,
        day_index = day_index,
        sequence = sequence,
    );
}

pub fn emit_pr_opened(number: u64, branch: &str, url: &str) {
    info!(event = "pr.opened", pr = number, branch = %branch, url = %url);
}

pub fn emit_pr_merged(number: u64, method: &str) {
    info!(event = "pr.merged", pr = number, method = %method, "PR #{} merged successfully.", number);
}

/// Emit event: run finished, with the totals from `summary`.
pub fn emit_run_finished(summary: &RunSummary, duration_ms: u64) {
    info!(
        event = "run.finished",
        days = summary.days(),
        commits = summary.commits,
        pull_requests = summary.pull_requests.len(),
        merged = summary.merged.len(),
        pushed = summary.pushed,
        duration_ms = duration_ms,
    );
}

/// Emit event: run aborted (error level).
pub fn emit_run_failed(error: &dyn std::fmt::Display) {
    tracing::error!(event = "run.failed", error = %error);
}
