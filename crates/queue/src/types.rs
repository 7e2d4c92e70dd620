//! Data types for the upload queue.

use filedrop_protocol::{FileItem, UploadResult};
use filedrop_transfer::ValidationError;
use serde::{Deserialize, Serialize};

/// How `upload_all` spreads work over the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Worker pool: a finished upload frees its slot for the next file.
    #[default]
    Pool,
    /// Fixed batches: the next batch starts once the whole previous one settled.
    Batched,
}

/// Queue tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Files taken from one selection; extra files are dropped. 0 disables the cap.
    pub max_files_per_batch: usize,
    /// Uploads in flight at once.
    pub concurrency: usize,
    pub dispatch: DispatchMode,
    /// Capacity of the event channel.
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_files_per_batch: 10,
            concurrency: 3,
            dispatch: DispatchMode::Pool,
            event_capacity: 256,
        }
    }
}

/// A file refused at intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub name: String,
    pub reason: ValidationError,
}

/// Result of [`UploadQueue::add_files`](crate::UploadQueue::add_files).
#[derive(Debug, Clone, Default)]
pub struct AddOutcome {
    /// Snapshots of the new queue entries, in selection order.
    pub accepted: Vec<FileItem>,
    pub rejected: Vec<Rejection>,
    /// Files beyond `max_files_per_batch` that were not looked at.
    pub truncated: usize,
}

/// How a single dispatched file ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Completed(UploadResult),
    Failed(String),
    /// The file was no longer pending when its turn came (removed or cleared).
    Skipped,
}

/// Tally of one `upload_all` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl UploadSummary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut s, o| {
            match o {
                FileOutcome::Completed(_) => s.completed += 1,
                FileOutcome::Failed(_) => s.failed += 1,
                FileOutcome::Skipped => s.skipped += 1,
            }
            s
        })
    }

    pub fn dispatched(&self) -> usize {
        self.completed + self.failed
    }
}

/// Notification published by the queue after a state change.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    FilesAdded { ids: Vec<String> },
    FilesRejected { rejected: Vec<Rejection> },
    Progress { id: String, progress: f64, speed: f64 },
    Completed { id: String, name: String, result: UploadResult },
    Failed { id: String, name: String, error: String },
    Removed { id: String, name: String },
    RetryRequested { id: String },
    ThumbnailReady { id: String },
    UploadAllFinished { summary: UploadSummary },
    Cleared,
}
