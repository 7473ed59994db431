//! The marker file rewritten before every commit.
//!
//! Its content only has to differ between commits so that every commit has a
//! distinct tree.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Note stored in the marker by the pull-request variant.
pub const PR_NOTE: &str = "Automated commit for per-PR workflow";

/// Default marker location, relative to the repository root.
pub const DEFAULT_MARKER_FILE: &str = "data.json";

/// JSON body of the marker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPayload {
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MarkerPayload {
    /// Payload carrying only the commit date.
    pub fn dated(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            sequence: None,
            note: None,
        }
    }

    /// Payload carrying the commit date and the event's position in its day.
    ///
    /// Two events of the same day always differ in `sequence`, so the marker
    /// changes even when their timestamps collide.
    pub fn sequenced(date: impl Into<String>, sequence: u32) -> Self {
        Self {
            date: date.into(),
            sequence: Some(sequence),
            note: None,
        }
    }

    /// Payload used by the pull-request variant.
    pub fn for_pull_request(date: impl Into<String>, sequence: u32) -> Self {
        Self {
            date: date.into(),
            sequence: Some(sequence),
            note: Some(PR_NOTE.to_string()),
        }
    }
}

/// Location of the marker file inside a working tree.
#[derive(Debug, Clone)]
pub struct MarkerFile {
    repo_dir: PathBuf,
    relative: PathBuf,
}

impl MarkerFile {
    pub fn new(repo_dir: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            relative: relative.into(),
        }
    }

    /// Path relative to the repository root, as handed to `git add`.
    pub fn relative_path(&self) -> &Path {
        &self.relative
    }

    /// Absolute (or cwd-relative) path on disk.
    pub fn full_path(&self) -> PathBuf {
        self.repo_dir.join(&self.relative)
    }

    /// Overwrite the marker with `payload` as two-space-indented JSON.
    pub async fn write(&self, payload: &MarkerPayload) -> crate::FillResult<()> {
        let mut body = serde_json::to_string_pretty(payload)?;
        body.push('\n');
        tokio::fs::write(self.full_path(), body).await?;
        Ok(())
    }
}
