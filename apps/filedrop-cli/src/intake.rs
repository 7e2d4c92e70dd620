//! Turns paths given on the command line into queue descriptors.

use std::path::Path;

use filedrop_protocol::{FileSource, RawFile};

/// Fallback type for unknown extensions; the queue rejects it.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Detects a MIME type from the file extension.
pub fn detect_content_type(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("pdf") => Some("application/pdf"),
        Some("doc") => Some("application/msword"),
        Some("docx") => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        Some("xls") => Some("application/vnd.ms-excel"),
        Some("xlsx") => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        Some("mp4") => Some("video/mp4"),
        Some("mov") => Some("video/mov"),
        Some("avi") => Some("video/avi"),
        Some("wmv") => Some("video/wmv"),
        Some("txt") => Some("text/plain"),
        Some("csv") => Some("text/csv"),
        _ => None,
    }
}

/// Reads metadata for `path` and builds a descriptor backed by the file.
pub fn raw_file(path: &Path) -> std::io::Result<RawFile> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a regular file: {}", path.display()),
        ));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = detect_content_type(path).unwrap_or(UNKNOWN_MIME);

    Ok(RawFile::new(name, meta.len(), mime).with_source(FileSource::Path(path.to_path_buf())))
}

/// Collects descriptors for every readable path. Unreadable paths are
/// logged and skipped.
pub fn collect(paths: &[impl AsRef<Path>]) -> Vec<RawFile> {
    paths
        .iter()
        .filter_map(|p| {
            let path = p.as_ref();
            match raw_file(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping path");
                    None
                }
            }
        })
        .collect()
}
