//! Data model shared by the filedrop crates.
//!
//! Everything the presentation layer reads (queue entries, the session
//! aggregate, upload results) is defined here so that transports and
//! front-ends can depend on the model without pulling in the queue.

pub mod format;
pub mod types;

pub use format::{FileCategory, format_file_size};
pub use types::{FileItem, FileSource, FileStatus, RawFile, Session, UploadResult};
