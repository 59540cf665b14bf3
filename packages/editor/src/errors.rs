//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record has no id")]
    MissingId,
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}
