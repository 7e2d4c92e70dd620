use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a queued file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Uploading,
    Completed,
    Error,
}

impl FileStatus {
    /// Returns `true` for states that may be removed from the queue.
    pub fn is_removable(self) -> bool {
        matches!(self, FileStatus::Pending | FileStatus::Error)
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Pending => "pending",
            FileStatus::Uploading => "uploading",
            FileStatus::Completed => "completed",
            FileStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Where the bytes of a file can be read from.
///
/// Validation and the simulated transport only look at the declared
/// size and type; the source is needed for thumbnails and real
/// transports.
#[derive(Debug, Clone, Default)]
pub enum FileSource {
    /// Declared metadata only.
    #[default]
    None,
    /// File contents held in memory.
    Bytes(Arc<[u8]>),
    /// File on local disk.
    Path(PathBuf),
}

/// A file descriptor as delivered by a picker or a drop event.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Declared MIME type.
    pub mime_type: String,
    pub source: FileSource,
}

impl RawFile {
    /// Creates a descriptor without any readable contents.
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            source: FileSource::None,
        }
    }

    /// Creates a descriptor backed by in-memory bytes. The size is taken from the data.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Bytes(data),
        }
    }

    /// Attaches a source to the descriptor.
    pub fn with_source(mut self, source: FileSource) -> Self {
        self.source = source;
        self
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// An entry of the upload queue.
///
/// Owned by the queue; callers only ever see clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub status: FileStatus,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    /// Bytes per second while uploading, 0 otherwise.
    pub upload_speed: f64,
    /// `data:` URL preview for images, filled in asynchronously.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provenance of the successful upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<UploadResult>,
    #[serde(skip)]
    pub source: FileSource,
}

impl FileItem {
    /// Wraps an accepted file into a fresh `pending` entry with a new id.
    pub fn from_raw(file: &RawFile) -> Self {
        Self {
            id: generate_file_id(),
            name: file.name.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
            status: FileStatus::Pending,
            progress: 0.0,
            upload_speed: 0.0,
            thumbnail: None,
            error: None,
            result: None,
            source: file.source.clone(),
        }
    }

    /// Rebuilds the descriptor handed to a transport.
    pub fn to_raw(&self) -> RawFile {
        RawFile {
            name: self.name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            source: self.source.clone(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

fn generate_file_id() -> String {
    format!("file_{}", uuid::Uuid::new_v4().simple())
}

/// Aggregate statistics for the current queue lifetime.
///
/// `completed_files` and `failed_files` count the items currently in
/// those states, so `completed_files + failed_files <= total_files`
/// holds at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub total_files: usize,
    pub completed_files: usize,
    pub failed_files: usize,
    pub total_size: u64,
    pub start_time: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session starting now.
    pub fn new() -> Self {
        Self {
            total_files: 0,
            completed_files: 0,
            failed_files: 0,
            total_size: 0,
            start_time: Utc::now(),
        }
    }

    /// Completed files as a percentage of all files (0 for an empty session).
    pub fn completion_rate(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.completed_files as f64 / self.total_files as f64 * 100.0
    }

    /// Files that have not reached a terminal state.
    pub fn outstanding_files(&self) -> usize {
        self.total_files
            .saturating_sub(self.completed_files + self.failed_files)
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files > 0
    }

    /// Every file completed and none failed.
    pub fn is_complete(&self) -> bool {
        self.total_files > 0 && self.completed_files == self.total_files
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor returned by a transport for a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
    pub checksum: String,
}
