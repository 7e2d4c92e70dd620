//! Queue error types.

use filedrop_protocol::FileStatus;

/// Requests the queue refuses. State is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("cannot {action} file {id} while it is {status}")]
    InvalidState {
        id: String,
        status: FileStatus,
        action: &'static str,
    },

    #[error("an upload run is already in progress")]
    AlreadyUploading,
}
