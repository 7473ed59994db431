//! Top-level driver: walk days, generate events, finish with a push or a
//! merge pass.
//!
//! Events run strictly one after another. They share one working tree, so
//! nothing is ever executed concurrently.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::info;

use crate::calendar::DateRange;
use crate::commit::CommitFactory;
use crate::domain::{CommitEvent, DayPlan, FillResult, RunSummary};
use crate::git::GitOps;
use crate::obs;
use crate::pull_request::BranchPrOrchestrator;
use crate::remote::RepoContextResolver;
use crate::schedule::{RandomScheduler, ScheduleZone};

/// Sequential driver for both pipeline variants.
pub struct RunController {
    scheduler: RandomScheduler,
    range: DateRange,
    zone: ScheduleZone,
}

impl RunController {
    pub fn new(scheduler: RandomScheduler, range: DateRange, zone: ScheduleZone) -> Self {
        Self {
            scheduler,
            range,
            zone,
        }
    }

    fn plan_day(&mut self, date: NaiveDate, day_index: u32) -> DayPlan {
        let plan = DayPlan {
            date,
            day_index,
            commit_count: self.scheduler.plan_day(),
        };
        obs::emit_day_planned(&date.to_string(), day_index, plan.commit_count);
        plan
    }

    fn next_event(&mut self, plan: &DayPlan, sequence: u32) -> CommitEvent {
        let timestamp = self.scheduler.plan_event_time(plan.date, self.zone);
        CommitEvent::new(timestamp, plan.day_index, sequence)
    }

    /// Simple variant: commit every event on the current branch, then push
    /// once.
    pub async fn run_commits(
        &mut self,
        git: &dyn GitOps,
        factory: &CommitFactory,
    ) -> FillResult<RunSummary> {
        let started = Instant::now();
        obs::emit_run_started(
            "commits",
            &self.range.start().to_string(),
            &self.range.end().to_string(),
            self.range.len(),
        );

        let mut summary = RunSummary::default();
        for (day_index, date) in self.range.days().enumerate() {
            let plan = self.plan_day(date, day_index as u32);
            for sequence in 1..=plan.commit_count {
                let event = self.next_event(&plan, sequence);
                factory.commit(&event, &factory.message_for(&event)).await?;
                summary.commits += 1;
            }
            summary.day_plans.push(plan);
        }

        git.push(None, None).await?;
        summary.pushed = true;
        info!(commits = summary.commits, "pushed generated commits");

        obs::emit_run_finished(&summary, started.elapsed().as_millis() as u64);
        Ok(summary)
    }

    /// Pull-request variant: one branch and pull request per event, a random
    /// pause after each, then merge everything in creation order.
    ///
    /// The repository identity is resolved before the first mutation.
    pub async fn run_pull_requests(
        &mut self,
        resolver: &RepoContextResolver,
        orchestrator: &BranchPrOrchestrator,
    ) -> FillResult<RunSummary> {
        let started = Instant::now();
        let repo = resolver.resolve().await?;
        obs::emit_run_started(
            "prs",
            &self.range.start().to_string(),
            &self.range.end().to_string(),
            self.range.len(),
        );
        info!(repo = %repo, base = %orchestrator.base_branch(), "opening one pull request per commit");

        let mut summary = RunSummary::default();
        for (day_index, date) in self.range.days().enumerate() {
            let plan = self.plan_day(date, day_index as u32);
            for sequence in 1..=plan.commit_count {
                let event = self.next_event(&plan, sequence);
                let suffix = self.scheduler.plan_branch_suffix();
                let record = orchestrator
                    .commit_and_open_pr(&repo, &event, suffix)
                    .await?;
                summary.commits += 1;
                summary.pull_requests.push(record);

                tokio::time::sleep(self.scheduler.plan_delay()).await;
            }
            summary.day_plans.push(plan);
        }

        info!(
            pull_requests = summary.pull_requests.len(),
            "Done! Created PRs, now merging them..."
        );
        summary.merged = orchestrator
            .merge_all(&repo, &summary.pull_requests)
            .await?;
        info!("All PRs have been merged.");

        obs::emit_run_finished(&summary, started.elapsed().as_millis() as u64);
        Ok(summary)
    }
}
