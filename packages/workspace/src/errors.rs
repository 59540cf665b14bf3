use campaign_editor::{EditorError, MutationError, RecordError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid document id: {0}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),
}

impl From<MutationError> for SyncError {
    fn from(err: MutationError) -> Self {
        SyncError::Editor(EditorError::Mutation(err))
    }
}

impl From<RecordError> for SyncError {
    fn from(err: RecordError) -> Self {
        SyncError::Editor(EditorError::Record(err))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
