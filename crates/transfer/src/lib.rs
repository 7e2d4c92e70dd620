//! Upload transport contract, validation and the simulated backend.
//!
//! The queue only talks to [`UploadTransport`]; [`SimulatedTransport`]
//! is the in-process implementation that emits progress on a timer and
//! injects occasional network failures.

mod simulated;
mod thumbnail;
mod transport;
mod validation;

pub use simulated::{SimulatedTransport, SimulationConfig};
pub use thumbnail::{build_thumbnail, data_url};
pub use transport::{ProgressCallback, TransferFuture, UploadTransport};
pub use validation::{ACCEPTED_TYPES, MAX_FILE_SIZE, ValidationError, validate_file};

/// Errors produced by transports.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transient failure of a single attempt; the upload may be retried.
    #[error("Network error occurred")]
    Network,

    #[error("upload not found: {0}")]
    NotFound(String),

    #[error("Failed to delete file")]
    DeleteFailed,
}
