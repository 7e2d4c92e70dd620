//! Maps queue events to toasts.

use filedrop_queue::QueueEvent;
use tracing::trace;

use crate::toast::{Toast, ToastQueue, ToastType};

/// Toast content for an event, or `None` for events the user is not
/// told about (progress, thumbnails, retry requests).
pub fn toast_for_event(event: &QueueEvent) -> Option<(ToastType, String, Option<String>)> {
    let toast = match event {
        QueueEvent::FilesAdded { ids } => (
            ToastType::Success,
            format!("{} file(s) added to queue", ids.len()),
            None,
        ),
        QueueEvent::FilesRejected { rejected } => {
            let reasons = rejected
                .iter()
                .map(|r| format!("{}: {}", r.name, r.reason))
                .collect::<Vec<_>>()
                .join(", ");
            (
                ToastType::Error,
                format!("Some files were rejected: {reasons}"),
                None,
            )
        }
        QueueEvent::Completed { name, .. } => (
            ToastType::Success,
            format!("{name} uploaded successfully"),
            None,
        ),
        QueueEvent::Failed { name, error, .. } => (
            ToastType::Error,
            format!("Failed to upload {name}: {error}"),
            None,
        ),
        QueueEvent::UploadAllFinished { summary } if summary.dispatched() > 0 => {
            if summary.failed > 0 {
                (
                    ToastType::Warning,
                    "Upload completed!".to_string(),
                    Some(format!("{} file(s) failed", summary.failed)),
                )
            } else {
                (ToastType::Success, "Upload completed!".to_string(), None)
            }
        }
        QueueEvent::Removed { .. } => (ToastType::Info, "File removed from queue".to_string(), None),
        QueueEvent::Cleared => (ToastType::Info, "All files cleared".to_string(), None),
        QueueEvent::UploadAllFinished { .. }
        | QueueEvent::Progress { .. }
        | QueueEvent::RetryRequested { .. }
        | QueueEvent::ThumbnailReady { .. } => return None,
    };
    Some(toast)
}

/// Pushes the toast for `event`, if any, and returns it.
pub fn notify<'q>(toasts: &'q mut ToastQueue, event: &QueueEvent) -> Option<&'q Toast> {
    let Some((toast_type, title, message)) = toast_for_event(event) else {
        trace!(?event, "no toast for event");
        return None;
    };
    let id = toasts.push(toast_type, title, message, toast_type.duration_ms());
    toasts.get(id)
}
