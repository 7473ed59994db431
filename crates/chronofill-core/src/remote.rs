//! Owner/repository resolution from the `origin` remote.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::domain::{FillError, FillResult, RepoIdentity};
use crate::git::GitOps;

/// Remote the pipeline pushes to and resolves its identity from.
pub const ORIGIN: &str = "origin";

/// One accepted remote URL shape.
struct RemotePattern {
    name: &'static str,
    regex: &'static OnceLock<Regex>,
    source: &'static str,
}

impl RemotePattern {
    fn match_url(&self, url: &str) -> Option<RepoIdentity> {
        let regex = self
            .regex
            .get_or_init(|| Regex::new(self.source).expect("remote pattern is a valid regex"));
        let caps = regex.captures(url)?;
        Some(RepoIdentity::new(&caps["owner"], &caps["repo"]))
    }
}

static SCP_LIKE: OnceLock<Regex> = OnceLock::new();
static URL_LIKE: OnceLock<Regex> = OnceLock::new();

/// Tried in order; the first match wins.
static REMOTE_PATTERNS: [RemotePattern; 2] = [
    RemotePattern {
        name: "ssh",
        regex: &SCP_LIKE,
        source: r"^(?:[^@/:]+@)?[^/:]+:(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$",
    },
    RemotePattern {
        name: "url",
        regex: &URL_LIKE,
        source: r"^[a-z][a-z0-9+.-]*://(?:[^@/]+@)?[^/]+/(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$",
    },
];

/// Parse `owner/repo` out of an SSH (`git@host:owner/repo.git`) or URL
/// (`https://host/owner/repo`) remote.
pub fn parse_remote_url(url: &str) -> FillResult<RepoIdentity> {
    let url = url.trim();
    REMOTE_PATTERNS
        .iter()
        .find_map(|pattern| {
            let identity = pattern.match_url(url)?;
            debug!(pattern = pattern.name, url = %url, "remote url matched");
            Some(identity)
        })
        .ok_or_else(|| FillError::UnparseableRemote {
            url: url.to_string(),
        })
}

/// Derives the [`RepoIdentity`] of the working tree from its `origin` remote.
#[derive(Clone)]
pub struct RepoContextResolver {
    git: Arc<dyn GitOps>,
}

impl RepoContextResolver {
    pub fn new(git: Arc<dyn GitOps>) -> Self {
        Self { git }
    }

    /// Look up `origin` and parse its push (or fetch) URL.
    pub async fn resolve(&self) -> FillResult<RepoIdentity> {
        let remotes = self.git.remotes().await?;
        let origin = remotes
            .iter()
            .find(|r| r.name == ORIGIN)
            .ok_or(FillError::NoOriginRemote)?;
        let url = origin.url().ok_or(FillError::NoOriginRemote)?;

        let identity = parse_remote_url(url)?;
        debug!(url = %url, owner = %identity.owner, repo = %identity.repo_name, "resolved repository");
        Ok(identity)
    }
}
