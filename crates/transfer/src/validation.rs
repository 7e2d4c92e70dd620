use filedrop_protocol::RawFile;

/// Largest accepted file: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// MIME types accepted for upload.
pub const ACCEPTED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "video/mp4",
    "video/mov",
    "video/avi",
    "video/wmv",
    "text/plain",
    "text/csv",
];

/// Reason a file was refused at intake. `Display` is the user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large (max 10MB)")]
    TooLarge,

    #[error("File type not supported")]
    UnsupportedType,
}

/// Checks a file's declared size and type.
///
/// Rules apply in order and the first failure wins:
/// - size above [`MAX_FILE_SIZE`]
/// - MIME type outside [`ACCEPTED_TYPES`]
pub fn validate_file(file: &RawFile) -> Result<(), ValidationError> {
    if file.size > MAX_FILE_SIZE {
        return Err(ValidationError::TooLarge);
    }

    if !ACCEPTED_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ValidationError::UnsupportedType);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_type_within_limit() {
        assert!(validate_file(&RawFile::new("a.png", 1024, "image/png")).is_ok());
        assert!(validate_file(&RawFile::new("b.csv", 0, "text/csv")).is_ok());
    }

    #[test]
    fn accepts_exactly_max_size() {
        let file = RawFile::new("edge.pdf", MAX_FILE_SIZE, "application/pdf");
        assert!(validate_file(&file).is_ok());
    }

    #[test]
    fn rejects_one_byte_over_max() {
        let file = RawFile::new("big.pdf", MAX_FILE_SIZE + 1, "application/pdf");
        assert_eq!(validate_file(&file), Err(ValidationError::TooLarge));
    }

    #[test]
    fn rejects_unsupported_type() {
        let file = RawFile::new("tool", 100, "application/x-executable");
        let err = validate_file(&file).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedType);
        assert_eq!(err.to_string(), "File type not supported");
    }

    #[test]
    fn size_checked_before_type() {
        let file = RawFile::new("huge.exe", MAX_FILE_SIZE * 2, "application/x-executable");
        let err = validate_file(&file).unwrap_err();
        assert_eq!(err.to_string(), "File too large (max 10MB)");
    }

    #[test]
    fn type_match_is_exact() {
        assert!(validate_file(&RawFile::new("a.PNG", 1, "IMAGE/PNG")).is_err());
        assert!(validate_file(&RawFile::new("a.png", 1, "image/png; q=1")).is_err());
    }
}
