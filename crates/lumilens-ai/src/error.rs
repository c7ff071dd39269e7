use std::time::Duration;

use lumilens_core::{EmptyCategoryError, SchemaError};
use thiserror::Error;

use crate::stage::StageId;

/// The oracle could not produce a reply: transport, auth, quota, or deadline.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("oracle call exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("oracle reply has no content")]
    EmptyResponse,

    #[error("malformed oracle reply: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Why a single stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("schema validation failed: {0}")]
    SchemaValidation(#[from] SchemaError),

    #[error("oracle service error: {0}")]
    OracleService(#[from] OracleError),

    #[error(transparent)]
    EmptyCategory(#[from] EmptyCategoryError),
}

/// A pipeline invocation failed; `stage` names the node that failed.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {source}")]
pub struct PipelineError {
    pub stage: StageId,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: StageId, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
