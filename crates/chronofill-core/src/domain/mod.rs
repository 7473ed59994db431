//! Domain models for chronofill.
//!
//! - `DayPlan`: how many events a single calendar day receives
//! - `CommitEvent`: one synthetic commit at a concrete timestamp
//! - `PullRequestRecord`: a pull request opened for one event
//! - `RepoIdentity`: owner/repository pair derived from the origin remote
//! - `RunSummary`: what a finished run produced

pub mod error;
pub mod event;
pub mod record;

pub use error::{FillError, FillResult};
pub use event::{CommitEvent, DayPlan};
pub use record::{PullRequestRecord, RepoIdentity, RunSummary};
