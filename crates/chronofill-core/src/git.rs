//! Transactional git operations.
//!
//! [`GitOps`] is the seam between the pipeline and version control. Each
//! call either fully succeeds or returns [`FillError::Transaction`].
//! [`GitCli`] implements it by spawning the `git` binary inside a working
//! tree.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::error::{FillError, FillResult};

/// Environment variable git reads the committer date from.
pub const COMMITTER_DATE_ENV: &str = "GIT_COMMITTER_DATE";

/// Date overrides applied to a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDates {
    /// Passed to `git commit --date`.
    pub author: String,

    /// Committer date for this commit only; `None` leaves git's default.
    pub committer: Option<String>,
}

impl CommitDates {
    /// Pin only the author date.
    pub fn author(date: impl Into<String>) -> Self {
        Self {
            author: date.into(),
            committer: None,
        }
    }

    /// Pin author and committer date to the same value.
    pub fn pinned(date: impl Into<String>) -> Self {
        let date = date.into();
        Self {
            committer: Some(date.clone()),
            author: date,
        }
    }
}

/// A configured remote with its fetch and push URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub fetch_url: Option<String>,
    pub push_url: Option<String>,
}

impl Remote {
    /// Push URL, falling back to the fetch URL.
    pub fn url(&self) -> Option<&str> {
        self.push_url.as_deref().or(self.fetch_url.as_deref())
    }
}

/// Version-control operations used by the pipeline.
#[async_trait]
pub trait GitOps: Send + Sync {
    /// Stage the given paths.
    async fn add(&self, paths: &[&Path]) -> FillResult<()>;

    /// Commit the index and return the new commit id.
    async fn commit(&self, message: &str, dates: &CommitDates) -> FillResult<String>;

    /// Push; `None` arguments fall back to git's upstream configuration.
    async fn push(&self, remote: Option<&str>, branch: Option<&str>) -> FillResult<()>;

    async fn checkout(&self, branch: &str) -> FillResult<()>;

    /// Create `name` at `from` and check it out.
    async fn checkout_new_branch(&self, name: &str, from: &str) -> FillResult<()>;

    async fn fetch(&self) -> FillResult<()>;

    async fn pull(&self, remote: &str, branch: &str) -> FillResult<()>;

    async fn remotes(&self) -> FillResult<Vec<Remote>>;
}

/// [`GitOps`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Current HEAD commit id.
    pub async fn head_sha(&self) -> FillResult<String> {
        let sha = self.run("rev-parse", &["rev-parse", "HEAD"], &[]).await?;
        let sha = sha.trim().to_string();
        if sha.is_empty() {
            return Err(FillError::transaction(
                "rev-parse",
                "git rev-parse HEAD returned empty output",
            ));
        }
        Ok(sha)
    }

    async fn run(&self, op: &str, args: &[&str], envs: &[(&str, &str)]) -> FillResult<String> {
        debug!(op = op, args = ?args, "running git");

        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| FillError::transaction(op, format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(FillError::transaction(op, detail));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl GitOps for GitCli {
    async fn add(&self, paths: &[&Path]) -> FillResult<()> {
        let mut args: Vec<&str> = vec!["add", "--"];
        for path in paths {
            args.push(path.to_str().ok_or_else(|| {
                FillError::transaction("add", format!("non-utf8 path: {}", path.display()))
            })?);
        }
        self.run("add", &args, &[]).await.map(|_| ())
    }

    async fn commit(&self, message: &str, dates: &CommitDates) -> FillResult<String> {
        let args = ["commit", "-m", message, "--date", dates.author.as_str()];
        // The committer date only reaches the child process.
        let envs: Vec<(&str, &str)> = dates
            .committer
            .as_deref()
            .map(|date| vec![(COMMITTER_DATE_ENV, date)])
            .unwrap_or_default();

        self.run("commit", &args, &envs).await?;
        self.head_sha().await
    }

    async fn push(&self, remote: Option<&str>, branch: Option<&str>) -> FillResult<()> {
        let mut args = vec!["push"];
        args.extend(remote);
        args.extend(branch);
        self.run("push", &args, &[]).await.map(|_| ())
    }

    async fn checkout(&self, branch: &str) -> FillResult<()> {
        self.run("checkout", &["checkout", branch], &[]).await.map(|_| ())
    }

    async fn checkout_new_branch(&self, name: &str, from: &str) -> FillResult<()> {
        self.run("checkout", &["checkout", "-b", name, from], &[])
            .await
            .map(|_| ())
    }

    async fn fetch(&self) -> FillResult<()> {
        self.run("fetch", &["fetch"], &[]).await.map(|_| ())
    }

    async fn pull(&self, remote: &str, branch: &str) -> FillResult<()> {
        self.run("pull", &["pull", remote, branch], &[])
            .await
            .map(|_| ())
    }

    async fn remotes(&self) -> FillResult<Vec<Remote>> {
        let out = self.run("remote", &["remote", "-v"], &[]).await?;
        Ok(parse_remote_listing(&out))
    }
}

/// Parse `git remote -v` output, preserving first-seen remote order.
fn parse_remote_listing(listing: &str) -> Vec<Remote> {
    let mut remotes: Vec<Remote> = Vec::new();

    for line in listing.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        let kind = parts.next().unwrap_or("(fetch)");

        let idx = match remotes.iter().position(|r| r.name == name) {
            Some(idx) => idx,
            None => {
                remotes.push(Remote {
                    name: name.to_string(),
                    ..Default::default()
                });
                remotes.len() - 1
            }
        };

        let remote = &mut remotes[idx];
        if kind == "(push)" {
            remote.push_url = Some(url.to_string());
        } else {
            remote.fetch_url = Some(url.to_string());
        }
    }

    remotes
}

/// Check whether a directory is inside a git work tree.
pub async fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn test_parse_remote_listing() {
        let listing = "origin\tgit@github.com:acme/widgets.git (fetch)\n\
                       origin\thttps://github.com/acme/widgets (push)\n\
                       upstream\thttps://github.com/up/widgets.git (fetch)\n\
                       upstream\thttps://github.com/up/widgets.git (push)\n";
        let remotes = parse_remote_listing(listing);
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[0].name, "origin");
        assert_eq!(remotes[0].url(), Some("https://github.com/acme/widgets"));
        assert_eq!(
            remotes[0].fetch_url.as_deref(),
            Some("git@github.com:acme/widgets.git")
        );
        assert_eq!(remotes[1].name, "upstream");
    }

    #[test]
    fn test_remote_url_falls_back_to_fetch() {
        let remote = Remote {
            name: "origin".to_string(),
            fetch_url: Some("https://example.com/a/b".to_string()),
            push_url: None,
        };
        assert_eq!(remote.url(), Some("https://example.com/a/b"));
    }

    #[tokio::test]
    async fn test_commit_pins_author_and_committer_dates() {
        let repo = make_git_repo();
        let git = GitCli::new(repo.path());
        std::fs::write(repo.path().join("data.json"), "{}").unwrap();

        git.add(&[Path::new("data.json")]).await.unwrap();
        let sha = git
            .commit("pinned", &CommitDates::pinned("2025-09-27T12:03:09Z"))
            .await
            .unwrap();

        assert_eq!(sha.len(), 40);
        let dates = run_git(repo.path(), &["log", "-1", "--format=%aI %cI"]);
        assert_eq!(dates, "2025-09-27T12:03:09+00:00 2025-09-27T12:03:09+00:00");
    }

    #[tokio::test]
    async fn test_author_only_commit_keeps_offset() {
        let repo = make_git_repo();
        let git = GitCli::new(repo.path());
        std::fs::write(repo.path().join("data.json"), "{\"a\":1}").unwrap();

        git.add(&[Path::new("data.json")]).await.unwrap();
        git.commit("author", &CommitDates::author("2025-09-27T14:03:09+02:00"))
            .await
            .unwrap();

        let author = run_git(repo.path(), &["log", "-1", "--format=%aI"]);
        assert_eq!(author, "2025-09-27T14:03:09+02:00");
    }

    #[tokio::test]
    async fn test_committer_override_never_touches_process_env() {
        let before = std::env::var_os(COMMITTER_DATE_ENV);
        let repo = make_git_repo();
        let git = GitCli::new(repo.path());

        // Nothing staged: the commit fails.
        let failed = git
            .commit("empty", &CommitDates::pinned("2025-09-27T00:00:00Z"))
            .await;
        assert!(matches!(failed, Err(FillError::Transaction { .. })));
        assert_eq!(std::env::var_os(COMMITTER_DATE_ENV), before);

        std::fs::write(repo.path().join("data.json"), "{}").unwrap();
        git.add(&[Path::new("data.json")]).await.unwrap();
        git.commit("ok", &CommitDates::pinned("2025-09-27T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(std::env::var_os(COMMITTER_DATE_ENV), before);
    }

    #[tokio::test]
    async fn test_checkout_new_branch_and_back() {
        let repo = make_git_repo();
        let git = GitCli::new(repo.path());

        git.checkout_new_branch("commit-20250927-120309-42", "main")
            .await
            .unwrap();
        assert_eq!(
            run_git(repo.path(), &["rev-parse", "--abbrev-ref", "HEAD"]),
            "commit-20250927-120309-42"
        );

        git.checkout("main").await.unwrap();
        assert_eq!(
            run_git(repo.path(), &["rev-parse", "--abbrev-ref", "HEAD"]),
            "main"
        );
    }

    #[tokio::test]
    async fn test_checkout_unknown_branch_fails() {
        let repo = make_git_repo();
        let git = GitCli::new(repo.path());
        let err = git.checkout("does-not-exist").await.unwrap_err();
        assert!(err.to_string().contains("git checkout failed"));
    }

    #[tokio::test]
    async fn test_push_fetch_pull_against_bare_remote() {
        let remote = tempfile::tempdir().unwrap();
        run_git(remote.path(), &["init", "--bare"]);
        let repo = make_git_repo();
        let remote_path = remote.path().to_str().unwrap();
        run_git(repo.path(), &["remote", "add", "origin", remote_path]);

        let git = GitCli::new(repo.path());
        git.push(Some("origin"), Some("main")).await.unwrap();
        git.fetch().await.unwrap();
        git.pull("origin", "main").await.unwrap();

        let remotes = git.remotes().await.unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].url(), Some(remote_path));
        assert_eq!(
            run_git(remote.path(), &["rev-parse", "main"]),
            git.head_sha().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_is_git_repo() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()).await);
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()).await);
    }
}
