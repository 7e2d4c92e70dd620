//! The upload queue: intake, dispatch and retry.
//!
//! Uploads run as futures on the caller's task; the queue state sits
//! behind one mutex that is never held across an `.await`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use filedrop_protocol::{FileItem, FileSource, RawFile, Session};
use filedrop_transfer::{UploadTransport, build_thumbnail, validate_file};
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, trace, warn};

use crate::error::QueueError;
use crate::state::QueueState;
use crate::types::{
    AddOutcome, DispatchMode, FileOutcome, QueueConfig, QueueEvent, Rejection, UploadSummary,
};

/// Handle to an upload queue. Clones share the same queue.
#[derive(Clone)]
pub struct UploadQueue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<QueueState>,
    transport: Arc<dyn UploadTransport>,
    config: QueueConfig,
    events_tx: mpsc::Sender<QueueEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<QueueEvent>>>,
    uploading: AtomicBool,
    /// Bumped by `clear_all`; runs started before a clear are stale.
    generation: AtomicU64,
}

/// Clears the "upload run active" flag when the run ends, even if the
/// `upload_all` future is dropped early. A run made stale by
/// `clear_all` leaves the flag to whoever owns it now.
struct RunGuard<'a> {
    inner: &'a Inner,
    generation: u64,
}

impl RunGuard<'_> {
    fn is_current(&self) -> bool {
        self.inner.generation.load(Ordering::Acquire) == self.generation
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.is_current() {
            self.inner.uploading.store(false, Ordering::Release);
        }
    }
}

impl UploadQueue {
    /// Creates an empty queue that uploads through `transport`.
    pub fn new(transport: Arc<dyn UploadTransport>, config: QueueConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::new()),
                transport,
                config,
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                uploading: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::Receiver<QueueEvent>> {
        self.inner
            .events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: QueueEvent) {
        match self.inner.events_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => {
                debug!(?event, "event channel full, dropping event");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Read model
    // -----------------------------------------------------------------------

    /// Snapshot of every file in queue order.
    pub fn files(&self) -> Vec<FileItem> {
        self.state().files().to_vec()
    }

    pub fn file(&self, id: &str) -> Option<FileItem> {
        self.state().get(id).cloned()
    }

    /// Snapshot of the session, `None` until files are first added.
    pub fn session(&self) -> Option<Session> {
        self.state().session().cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending_ids().len()
    }

    /// Whether an `upload_all` run is in progress.
    pub fn is_uploading(&self) -> bool {
        self.inner.uploading.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Validates a selection and appends the accepted files as `pending`.
    ///
    /// Only the first `max_files_per_batch` files are considered. Image
    /// files with readable contents get a thumbnail task when a tokio
    /// runtime is available.
    pub fn add_files(&self, files: Vec<RawFile>) -> AddOutcome {
        let cap = match self.inner.config.max_files_per_batch {
            0 => usize::MAX,
            n => n,
        };
        let truncated = files.len().saturating_sub(cap);
        if truncated > 0 {
            debug!(truncated, cap, "selection truncated");
        }

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for file in files.into_iter().take(cap) {
            match validate_file(&file) {
                Ok(()) => accepted.push(FileItem::from_raw(&file)),
                Err(reason) => {
                    debug!(file = %file.name, %reason, "file rejected");
                    rejected.push(Rejection {
                        name: file.name,
                        reason,
                    });
                }
            }
        }

        if !accepted.is_empty() {
            self.state().add(accepted.clone());
            info!(files = accepted.len(), "files added to queue");
            self.spawn_thumbnails(&accepted);
            self.emit(QueueEvent::FilesAdded {
                ids: accepted.iter().map(|f| f.id.clone()).collect(),
            });
        }

        if !rejected.is_empty() {
            warn!(files = rejected.len(), "files rejected");
            self.emit(QueueEvent::FilesRejected {
                rejected: rejected.clone(),
            });
        }

        AddOutcome {
            accepted,
            rejected,
            truncated,
        }
    }

    /// Removes a `pending` or `error` file.
    pub fn remove(&self, id: &str) -> Result<FileItem, QueueError> {
        let item = self.state().remove(id)?;
        info!(file = %item.name, "file removed from queue");
        self.emit(QueueEvent::Removed {
            id: item.id.clone(),
            name: item.name.clone(),
        });
        Ok(item)
    }

    /// Resets a failed file to `pending` and uploads it again.
    ///
    /// The upload runs on the caller's task, outside any `upload_all`
    /// pool, so a retry during a run can put `concurrency + 1` uploads
    /// in flight.
    pub async fn retry(&self, id: &str) -> Result<FileOutcome, QueueError> {
        self.state().reset_for_retry(id)?;
        debug!(id, "retry requested");
        self.emit(QueueEvent::RetryRequested { id: id.to_string() });
        Ok(self.upload_one(id).await)
    }

    /// Uploads every file that is `pending` at call time.
    ///
    /// At most `concurrency` uploads are in flight. Resolves once each
    /// selected file has completed, failed, or left the queue.
    pub async fn upload_all(&self) -> Result<UploadSummary, QueueError> {
        if self.inner.uploading.swap(true, Ordering::AcqRel) {
            return Err(QueueError::AlreadyUploading);
        }
        // Snapshot and generation are read under the state lock, which
        // `clear_all` also holds while bumping the generation.
        let (generation, ids) = {
            let state = self.state();
            (
                self.inner.generation.load(Ordering::Acquire),
                state.pending_ids(),
            )
        };
        let run = RunGuard {
            inner: &self.inner,
            generation,
        };
        if ids.is_empty() {
            return Ok(UploadSummary::default());
        }

        let concurrency = self.inner.config.concurrency.max(1);
        let mode = self.inner.config.dispatch;
        info!(files = ids.len(), concurrency, ?mode, "upload started");

        let outcomes: Vec<FileOutcome> = match mode {
            DispatchMode::Pool => {
                stream::iter(ids.iter().cloned())
                    .map(|id| async move { self.upload_one(&id).await })
                    .buffer_unordered(concurrency)
                    .collect()
                    .await
            }
            DispatchMode::Batched => {
                let mut outcomes = Vec::with_capacity(ids.len());
                for batch in ids.chunks(concurrency) {
                    let batch = batch
                        .iter()
                        .cloned()
                        .map(|id| async move { self.upload_one(&id).await });
                    outcomes.extend(join_all(batch).await);
                }
                outcomes
            }
        };

        let summary = UploadSummary::from_outcomes(&outcomes);
        info!(
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            "upload finished"
        );
        if run.is_current() {
            self.emit(QueueEvent::UploadAllFinished { summary });
        } else {
            debug!("queue cleared during run, finish event suppressed");
        }
        Ok(summary)
    }

    /// Drops every file and the session. In-flight uploads keep running
    /// but their callbacks no longer find their files, and the queue is
    /// free to start a new run right away.
    pub fn clear_all(&self) {
        {
            let mut state = self.state();
            state.clear();
            self.inner.generation.fetch_add(1, Ordering::AcqRel);
            self.inner.uploading.store(false, Ordering::Release);
        }
        info!("queue cleared");
        self.emit(QueueEvent::Cleared);
    }

    /// Attaches a preview to a file. Returns `false` if the file is gone.
    pub fn set_thumbnail(&self, id: &str, thumbnail: String) -> bool {
        let stored = self.state().set_thumbnail(id, thumbnail);
        if stored {
            self.emit(QueueEvent::ThumbnailReady { id: id.to_string() });
        } else {
            trace!(id, "thumbnail for missing file ignored");
        }
        stored
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Single-file upload path shared by `upload_all` and `retry`.
    async fn upload_one(&self, id: &str) -> FileOutcome {
        let Some(file) = self.state().begin_upload(id) else {
            debug!(id, "file no longer pending, skipped");
            return FileOutcome::Skipped;
        };
        debug!(file = %file.name, size = file.size, "upload dispatched");

        let on_progress = |progress: f64, speed: f64| {
            let progress = progress.clamp(0.0, 100.0);
            if self.state().update_progress(id, progress, speed) {
                self.emit(QueueEvent::Progress {
                    id: id.to_string(),
                    progress,
                    speed,
                });
            }
        };

        match self.inner.transport.upload(&file, &on_progress).await {
            Ok(result) => {
                if self.state().complete(id, result.clone()) {
                    info!(file = %file.name, url = %result.url, "upload completed");
                    self.emit(QueueEvent::Completed {
                        id: id.to_string(),
                        name: file.name.clone(),
                        result: result.clone(),
                    });
                } else {
                    debug!(file = %file.name, "completion for missing file ignored");
                }
                FileOutcome::Completed(result)
            }
            Err(e) => {
                let error = e.to_string();
                if self.state().fail(id, &error) {
                    warn!(file = %file.name, %error, "upload failed");
                    self.emit(QueueEvent::Failed {
                        id: id.to_string(),
                        name: file.name.clone(),
                        error: error.clone(),
                    });
                } else {
                    debug!(file = %file.name, "failure for missing file ignored");
                }
                FileOutcome::Failed(error)
            }
        }
    }

    fn spawn_thumbnails(&self, items: &[FileItem]) {
        let mut wanted = items
            .iter()
            .filter(|f| f.is_image() && !matches!(f.source, FileSource::None))
            .peekable();
        if wanted.peek().is_none() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no tokio runtime, thumbnails skipped");
            return;
        };

        for item in wanted {
            let queue = self.clone();
            let id = item.id.clone();
            let file = item.to_raw();
            runtime.spawn(async move {
                match build_thumbnail(&file).await {
                    Ok(Some(thumbnail)) => {
                        queue.set_thumbnail(&id, thumbnail);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(file = %file.name, error = %e, "thumbnail failed"),
                }
            });
        }
    }
}
