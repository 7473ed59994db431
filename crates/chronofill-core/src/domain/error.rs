//! Error taxonomy for the generation pipeline.

use crate::pull_request::PrStage;

/// Errors produced anywhere in a chronofill run.
///
/// None of these are recovered from: every variant aborts the run and
/// surfaces at the top level.
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("missing required credential: {name}")]
    MissingCredential { name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no \"origin\" remote found")]
    NoOriginRemote,

    #[error("cannot parse owner/repo from remote url: {url}")]
    UnparseableRemote { url: String },

    #[error("git {op} failed: {detail}")]
    Transaction { op: String, detail: String },

    #[error("remote api error: {0}")]
    RemoteApi(String),

    #[error("pull request pipeline failed at {stage}: {source}")]
    Stage {
        stage: PrStage,
        #[source]
        source: Box<FillError>,
    },

    #[error("merge pass aborted at PR #{failed} after merging {merged:?}: {source}")]
    MergeAborted {
        merged: Vec<u64>,
        failed: u64,
        #[source]
        source: Box<FillError>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FillError {
    pub(crate) fn transaction(op: impl Into<String>, detail: impl Into<String>) -> Self {
        FillError::Transaction {
            op: op.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn at_stage(self, stage: PrStage) -> Self {
        FillError::Stage {
            stage,
            source: Box::new(self),
        }
    }
}

/// Result type for chronofill operations.
pub type FillResult<T> = std::result::Result<T, FillError>;
