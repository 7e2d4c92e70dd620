//! Human-readable sizes and coarse file classification.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a byte count with base-1024 units and one decimal.
///
/// A trailing `.0` is dropped, so `1024` becomes `"1 KB"` and `1536`
/// becomes `"1.5 KB"`. Sizes beyond the largest unit stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{rounded:.1} {}", UNITS[unit])
    }
}

/// Broad family a MIME type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl FileCategory {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            FileCategory::Image
        } else if mime_type.starts_with("video/") {
            FileCategory::Video
        } else if mime_type.starts_with("audio/") {
            FileCategory::Audio
        } else if mime_type.contains("pdf")
            || mime_type.contains("document")
            || mime_type.contains("word")
        {
            FileCategory::Document
        } else {
            FileCategory::Other
        }
    }

    /// Lowercase label used in logs and listings.
    pub fn label(self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Document => "document",
            FileCategory::Other => "other",
        }
    }
}
