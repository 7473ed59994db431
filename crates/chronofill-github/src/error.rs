//! Error types for chronofill-github

use chronofill_core::FillError;
use thiserror::Error;

/// Errors talking to the GitHub REST API
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Transport-level failure (DNS, TLS, connection reset, bad body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status returned by the API
    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Merge endpoint answered but did not merge
    #[error("pull request #{number} was not merged: {message}")]
    NotMerged { number: u64, message: String },

    /// Client could not be built from the given settings
    #[error("invalid GitHub settings: {0}")]
    InvalidSettings(String),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}

impl From<GitHubError> for FillError {
    fn from(err: GitHubError) -> Self {
        FillError::RemoteApi(err.to_string())
    }
}

/// Result type for GitHub calls
pub type Result<T> = std::result::Result<T, GitHubError>;
