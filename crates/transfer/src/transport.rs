//! Transport trait.
//!
//! Front-ends wire the queue to a transport at construction time.

use std::future::Future;
use std::pin::Pin;

use filedrop_protocol::{RawFile, UploadResult};

use crate::TransferError;

/// Progress sink: `(progress_percent, speed_bytes_per_sec)`.
pub type ProgressCallback<'a> = &'a (dyn Fn(f64, f64) + Send + Sync);

/// Boxed future returned by transport operations.
pub type TransferFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransferError>> + Send + 'a>>;

/// Moves files to a storage backend.
pub trait UploadTransport: Send + Sync {
    /// Uploads one file.
    ///
    /// `on_progress` is called periodically with strictly increasing
    /// progress. The future resolves with the stored file's descriptor
    /// or a transient error.
    fn upload<'a>(
        &'a self,
        file: &'a RawFile,
        on_progress: ProgressCallback<'a>,
    ) -> TransferFuture<'a, UploadResult>;

    /// Files uploaded through this transport, oldest first.
    fn history(&self) -> TransferFuture<'_, Vec<UploadResult>>;

    /// Deletes a previously uploaded file by its server-assigned id.
    fn delete<'a>(&'a self, upload_id: &'a str) -> TransferFuture<'a, ()>;
}
