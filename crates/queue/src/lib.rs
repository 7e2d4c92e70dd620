//! Client-side upload queue.
//!
//! The queue owns every [`FileItem`](filedrop_protocol::FileItem) and the
//! [`Session`](filedrop_protocol::Session) aggregate. Front-ends issue
//! intents (add, remove, retry, upload all, clear) and read snapshots;
//! uploads go through an injected
//! [`UploadTransport`](filedrop_transfer::UploadTransport).
//!
//! # Lifecycle of a file
//!
//! 1. **Add**: validated, wrapped as `pending`, thumbnail task spawned
//! 2. **Dispatch**: `pending → uploading`, progress streamed from the transport
//! 3. **Outcome**: `completed` with the stored file's descriptor, or `error`
//! 4. **Retry**: `error → pending`, dispatched again right away

pub mod error;
pub mod queue;
pub mod state;
pub mod types;

pub use error::QueueError;
pub use queue::UploadQueue;
pub use types::{
    AddOutcome, DispatchMode, FileOutcome, QueueConfig, QueueEvent, Rejection, UploadSummary,
};
