//! Pipeline scenarios driven entirely through the in-memory fakes.

use std::sync::Arc;

use chrono::{NaiveDate, Timelike};
use chronofill_core::fakes::{ApiCall, GitCall, RecordingGit, RecordingPullRequestApi};
use chronofill_core::{
    walk, BranchPrOrchestrator, CommitFactory, CommitMode, FillError, MarkerFile, MergeMethod,
    PrStage, PullRequestRecord, RandomScheduler, RepoContextResolver, RepoIdentity,
    RunController, ScheduleZone, StdRandom,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn simple_factory(git: Arc<RecordingGit>, dir: &tempfile::TempDir) -> CommitFactory {
    CommitFactory::new(git, MarkerFile::new(dir.path(), "data.json"), CommitMode::Simple)
}

fn pr_orchestrator(
    git: Arc<RecordingGit>,
    api: Arc<RecordingPullRequestApi>,
    dir: &tempfile::TempDir,
) -> BranchPrOrchestrator {
    let factory = CommitFactory::new(
        git.clone(),
        MarkerFile::new(dir.path(), "data.json"),
        CommitMode::PullRequest,
    );
    BranchPrOrchestrator::new(git, api, factory, "main")
}

fn commit_dates(git: &RecordingGit) -> Vec<String> {
    git.calls()
        .into_iter()
        .filter_map(|c| match c {
            GitCall::Commit { dates, .. } => Some(dates.author),
            _ => None,
        })
        .collect()
}

// ---- Scenario A: two days, simple variant ----

#[tokio::test]
async fn two_day_range_plans_two_days_and_pushes_once_at_the_end() {
    let dir = tempfile::tempdir().unwrap();
    let git = Arc::new(RecordingGit::new());
    let factory = simple_factory(git.clone(), &dir);
    let mut controller = RunController::new(
        RandomScheduler::new(StdRandom::seeded(2025)),
        walk(d(2025, 9, 27), d(2025, 9, 28)),
        ScheduleZone::Utc,
    );

    let summary = controller.run_commits(git.as_ref(), &factory).await.unwrap();

    assert_eq!(summary.days(), 2);
    assert_eq!(summary.day_plans[0].date, d(2025, 9, 27));
    assert_eq!(summary.day_plans[1].date, d(2025, 9, 28));
    for plan in &summary.day_plans {
        assert!((5..=10).contains(&plan.commit_count));
    }
    let planned: u32 = summary.day_plans.iter().map(|p| p.commit_count).sum();
    assert_eq!(summary.commits, planned);
    assert_eq!(git.commit_count() as u32, planned);

    let calls = git.calls();
    let pushes: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, GitCall::Push(..)))
        .collect();
    assert_eq!(pushes.len(), 1);
    assert_eq!(calls.last(), Some(&GitCall::Push(None, None)));
    assert!(summary.pushed);
}

#[tokio::test]
async fn commit_dates_stay_inside_their_day_in_generation_order() {
    let dir = tempfile::tempdir().unwrap();
    let git = Arc::new(RecordingGit::new());
    let factory = simple_factory(git.clone(), &dir);
    let mut controller = RunController::new(
        RandomScheduler::new(StdRandom::seeded(77)),
        walk(d(2024, 2, 27), d(2024, 3, 2)),
        ScheduleZone::Utc,
    );

    let summary = controller.run_commits(git.as_ref(), &factory).await.unwrap();
    let dates = commit_dates(&git);

    let mut idx = 0;
    for plan in &summary.day_plans {
        for _ in 0..plan.commit_count {
            let ts = chrono::DateTime::parse_from_rfc3339(&dates[idx]).unwrap();
            assert_eq!(ts.date_naive(), plan.date);
            assert!(ts.hour() <= 23 && ts.minute() <= 59 && ts.second() <= 59);
            idx += 1;
        }
    }
    assert_eq!(idx, dates.len());
    assert_eq!(summary.days(), 5); // 2024 is a leap year
}

#[tokio::test]
async fn same_seed_replays_identical_counts_and_timestamps() {
    async fn run(seed: u64) -> (Vec<u32>, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        let git = Arc::new(RecordingGit::new());
        let factory = simple_factory(git.clone(), &dir);
        let mut controller = RunController::new(
            RandomScheduler::new(StdRandom::seeded(seed)),
            walk(d(2025, 1, 1), d(2025, 1, 10)),
            ScheduleZone::Utc,
        );
        let summary = controller.run_commits(git.as_ref(), &factory).await.unwrap();
        let counts = summary.day_plans.iter().map(|p| p.commit_count).collect();
        (counts, commit_dates(&git))
    }

    let first = run(4242).await;
    let second = run(4242).await;
    assert_eq!(first, second);

    let other = run(4243).await;
    assert_ne!(first, other);
}

#[tokio::test]
async fn commit_failure_aborts_before_push() {
    let dir = tempfile::tempdir().unwrap();
    let git = Arc::new(RecordingGit::new());
    git.fail_on("commit");
    let factory = simple_factory(git.clone(), &dir);
    let mut controller = RunController::new(
        RandomScheduler::new(StdRandom::seeded(1)),
        walk(d(2025, 9, 27), d(2025, 9, 28)),
        ScheduleZone::Utc,
    );

    let err = controller
        .run_commits(git.as_ref(), &factory)
        .await
        .unwrap_err();
    assert!(matches!(err, FillError::Transaction { .. }));
    assert_eq!(git.commit_count(), 1);
    assert!(!git.calls().iter().any(|c| matches!(c, GitCall::Push(..))));
}

// ---- Scenario B: merge pass ----

fn three_records() -> Vec<PullRequestRecord> {
    (1..=3)
        .map(|n| PullRequestRecord {
            branch_name: format!("commit-20250927-00000{n}-{n}"),
            pr_number: 100 + n,
            pr_url: format!("https://github.com/acme/widgets/pull/{}", 100 + n),
        })
        .collect()
}

#[tokio::test]
async fn merge_pass_merges_in_list_order() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingPullRequestApi::new());
    let orchestrator = pr_orchestrator(Arc::new(RecordingGit::new()), api.clone(), &dir);

    let merged = orchestrator
        .merge_all(&RepoIdentity::new("acme", "widgets"), &three_records())
        .await
        .unwrap();

    assert_eq!(merged, vec![101, 102, 103]);
    assert_eq!(
        api.calls(),
        vec![
            ApiCall::Merge(101, MergeMethod::Merge),
            ApiCall::Merge(102, MergeMethod::Merge),
            ApiCall::Merge(103, MergeMethod::Merge),
        ]
    );
}

#[tokio::test]
async fn second_merge_failure_skips_third_and_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingPullRequestApi::new());
    api.fail_merge_of(102);
    let orchestrator = pr_orchestrator(Arc::new(RecordingGit::new()), api.clone(), &dir);

    let err = orchestrator
        .merge_all(&RepoIdentity::new("acme", "widgets"), &three_records())
        .await
        .unwrap_err();

    let FillError::MergeAborted {
        merged,
        failed,
        source,
    } = err
    else {
        panic!("expected MergeAborted");
    };
    assert_eq!(merged, vec![101]);
    assert_eq!(failed, 102);
    assert!(matches!(*source, FillError::RemoteApi(_)));
    assert!(!api.calls().contains(&ApiCall::Merge(103, MergeMethod::Merge)));
}

// ---- Pull-request variant end to end ----

#[tokio::test(start_paused = true)]
async fn pull_request_variant_opens_one_pr_per_commit_then_merges_all() {
    let dir = tempfile::tempdir().unwrap();
    let git = Arc::new(RecordingGit::new());
    let api = Arc::new(RecordingPullRequestApi::new());
    let orchestrator = pr_orchestrator(git.clone(), api.clone(), &dir);
    let resolver = RepoContextResolver::new(git.clone());
    let mut controller = RunController::new(
        RandomScheduler::new(StdRandom::seeded(8)),
        walk(d(2025, 9, 27), d(2025, 9, 28)),
        ScheduleZone::Utc,
    );

    let summary = controller
        .run_pull_requests(&resolver, &orchestrator)
        .await
        .unwrap();

    assert_eq!(summary.pull_requests.len() as u32, summary.commits);
    let numbers: Vec<u64> = summary.pull_requests.iter().map(|r| r.pr_number).collect();
    assert_eq!(summary.merged, numbers);

    let branches: std::collections::HashSet<_> = summary
        .pull_requests
        .iter()
        .map(|r| r.branch_name.as_str())
        .collect();
    assert_eq!(branches.len(), summary.pull_requests.len());

    // Every create precedes every merge.
    let calls = api.calls();
    let first_merge = calls
        .iter()
        .position(|c| matches!(c, ApiCall::Merge(..)))
        .unwrap();
    assert!(calls[..first_merge]
        .iter()
        .all(|c| matches!(c, ApiCall::Create(_))));
    assert_eq!(calls.len() - first_merge, numbers.len());

    // The base is re-synced once per event.
    let fetches = git.calls().iter().filter(|c| **c == GitCall::Fetch).count();
    assert_eq!(fetches as u32, summary.commits);
}

#[tokio::test(start_paused = true)]
async fn pr_creation_failure_aborts_without_merging() {
    let dir = tempfile::tempdir().unwrap();
    let git = Arc::new(RecordingGit::new());
    let api = Arc::new(RecordingPullRequestApi::new());
    api.fail_create();
    let orchestrator = pr_orchestrator(git.clone(), api.clone(), &dir);
    let resolver = RepoContextResolver::new(git.clone());
    let mut controller = RunController::new(
        RandomScheduler::new(StdRandom::seeded(8)),
        walk(d(2025, 9, 27), d(2025, 9, 28)),
        ScheduleZone::Utc,
    );

    let err = controller
        .run_pull_requests(&resolver, &orchestrator)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FillError::Stage {
            stage: PrStage::PrCreated,
            ..
        }
    ));
    assert_eq!(api.calls().len(), 1);
    // The pushed branch is left in place.
    assert!(git
        .calls()
        .iter()
        .any(|c| matches!(c, GitCall::Push(Some(_), Some(_)))));
}

#[tokio::test]
async fn missing_origin_aborts_before_any_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let git = Arc::new(RecordingGit::with_remotes(Vec::new()));
    let api = Arc::new(RecordingPullRequestApi::new());
    let orchestrator = pr_orchestrator(git.clone(), api.clone(), &dir);
    let resolver = RepoContextResolver::new(git.clone());
    let mut controller = RunController::new(
        RandomScheduler::new(StdRandom::seeded(8)),
        walk(d(2025, 9, 27), d(2025, 9, 28)),
        ScheduleZone::Utc,
    );

    let err = controller
        .run_pull_requests(&resolver, &orchestrator)
        .await
        .unwrap_err();
    assert!(matches!(err, FillError::NoOriginRemote));
    assert_eq!(git.calls(), vec![GitCall::Remotes]);
    assert!(api.calls().is_empty());
}
