//! chronofill-github: GitHub REST integration for chronofill
//!
//! Implements [`chronofill_core::PullRequestApi`] on top of the GitHub v3
//! REST API (`POST /repos/{owner}/{repo}/pulls` and
//! `PUT /repos/{owner}/{repo}/pulls/{number}/merge`).

pub mod client;
pub mod error;

pub use client::GitHubClient;
pub use error::{GitHubError, Result};
