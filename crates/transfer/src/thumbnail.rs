use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use filedrop_protocol::{FileSource, RawFile};

use crate::TransferError;

/// Encodes bytes as a `data:` URL.
pub fn data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(data))
}

/// Builds a preview for an image file.
///
/// Returns `Ok(None)` for non-images and for descriptors without
/// readable contents.
pub async fn build_thumbnail(file: &RawFile) -> Result<Option<String>, TransferError> {
    if !file.is_image() {
        return Ok(None);
    }

    let url = match &file.source {
        FileSource::None => return Ok(None),
        FileSource::Bytes(data) => data_url(&file.mime_type, data),
        FileSource::Path(path) => {
            let data = tokio::fs::read(path).await?;
            data_url(&file.mime_type, &data)
        }
    };
    Ok(Some(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_data_url() {
        assert_eq!(data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn image_bytes_produce_thumbnail() {
        let file = RawFile::from_bytes("a.png", "image/png", b"abc".to_vec());
        let thumb = build_thumbnail(&file).await.unwrap();
        assert_eq!(thumb.as_deref(), Some("data:image/png;base64,YWJj"));
    }

    #[tokio::test]
    async fn image_path_produces_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let file = RawFile::new("pic.gif", 6, "image/gif").with_source(FileSource::Path(path));
        let thumb = build_thumbnail(&file).await.unwrap().unwrap();
        assert!(thumb.starts_with("data:image/gif;base64,"));
    }

    #[tokio::test]
    async fn non_image_has_no_thumbnail() {
        let file = RawFile::from_bytes("a.txt", "text/plain", b"abc".to_vec());
        assert!(build_thumbnail(&file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn image_without_source_has_no_thumbnail() {
        let file = RawFile::new("a.png", 10, "image/png");
        assert!(build_thumbnail(&file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let file = RawFile::new("gone.png", 10, "image/png")
            .with_source(FileSource::Path("/nonexistent/gone.png".into()));
        let err = build_thumbnail(&file).await.unwrap_err();
        assert!(matches!(err, TransferError::Io(_)));
    }
}
