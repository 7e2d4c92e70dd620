//! Queue contents and session bookkeeping.
//!
//! Every mutation of a [`FileItem`] and the [`Session`] goes through
//! [`QueueState`]. Methods driven by transport or thumbnail callbacks
//! return `false` when the target is gone or no longer in the expected
//! state, so late callbacks after a removal or a clear are no-ops.

use filedrop_protocol::{FileItem, FileStatus, RawFile, Session, UploadResult};

use crate::error::QueueError;

#[derive(Debug, Default)]
pub struct QueueState {
    items: Vec<FileItem>,
    session: Option<Session>,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileItem] {
        &self.items
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn get(&self, id: &str) -> Option<&FileItem> {
        self.items.iter().find(|f| f.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut FileItem> {
        self.items.iter_mut().find(|f| f.id == id)
    }

    /// Ids of pending files in queue order.
    pub fn pending_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|f| f.status == FileStatus::Pending)
            .map(|f| f.id.clone())
            .collect()
    }

    /// Appends accepted files, creating the session on first use.
    pub fn add(&mut self, files: Vec<FileItem>) {
        if files.is_empty() {
            return;
        }
        let session = self.session.get_or_insert_with(Session::new);
        session.total_files += files.len();
        session.total_size += files.iter().map(|f| f.size).sum::<u64>();
        self.items.extend(files);
    }

    /// Removes a `pending` or `error` file and takes it out of the totals.
    pub fn remove(&mut self, id: &str) -> Result<FileItem, QueueError> {
        let index = self
            .items
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;

        let status = self.items[index].status;
        if !status.is_removable() {
            return Err(QueueError::InvalidState {
                id: id.to_string(),
                status,
                action: "remove",
            });
        }

        let item = self.items.remove(index);
        if let Some(session) = self.session.as_mut() {
            session.total_files = session.total_files.saturating_sub(1);
            session.total_size = session.total_size.saturating_sub(item.size);
            if status == FileStatus::Error {
                session.failed_files = session.failed_files.saturating_sub(1);
            }
        }
        Ok(item)
    }

    /// `pending → uploading`. Returns the descriptor to hand to the
    /// transport, or `None` if the file is gone or not pending.
    pub fn begin_upload(&mut self, id: &str) -> Option<RawFile> {
        let item = self.get_mut(id)?;
        if item.status != FileStatus::Pending {
            return None;
        }
        item.status = FileStatus::Uploading;
        item.progress = 0.0;
        item.upload_speed = 0.0;
        Some(item.to_raw())
    }

    pub fn update_progress(&mut self, id: &str, progress: f64, speed: f64) -> bool {
        match self.get_mut(id) {
            Some(item) if item.status == FileStatus::Uploading => {
                item.progress = progress.clamp(0.0, 100.0);
                item.upload_speed = speed;
                true
            }
            _ => false,
        }
    }

    /// `uploading → completed`.
    pub fn complete(&mut self, id: &str, result: UploadResult) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        if item.status != FileStatus::Uploading {
            return false;
        }
        item.status = FileStatus::Completed;
        item.progress = 100.0;
        item.upload_speed = 0.0;
        item.error = None;
        item.result = Some(result);
        if let Some(session) = self.session.as_mut() {
            session.completed_files += 1;
        }
        true
    }

    /// `uploading → error`.
    pub fn fail(&mut self, id: &str, error: &str) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        if item.status != FileStatus::Uploading {
            return false;
        }
        item.status = FileStatus::Error;
        item.progress = 0.0;
        item.upload_speed = 0.0;
        item.error = Some(error.to_string());
        if let Some(session) = self.session.as_mut() {
            session.failed_files += 1;
        }
        true
    }

    /// `error → pending`.
    pub fn reset_for_retry(&mut self, id: &str) -> Result<(), QueueError> {
        let item = self
            .get_mut(id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        if item.status != FileStatus::Error {
            return Err(QueueError::InvalidState {
                id: id.to_string(),
                status: item.status,
                action: "retry",
            });
        }
        item.status = FileStatus::Pending;
        item.progress = 0.0;
        item.error = None;
        if let Some(session) = self.session.as_mut() {
            session.failed_files = session.failed_files.saturating_sub(1);
        }
        Ok(())
    }

    pub fn set_thumbnail(&mut self, id: &str, thumbnail: String) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.thumbnail = Some(thumbnail);
                true
            }
            None => false,
        }
    }

    /// Drops every file and the session.
    pub fn clear(&mut self) {
        self.items.clear();
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str) -> UploadResult {
        UploadResult {
            id: format!("uploaded_{name}"),
            original_name: name.into(),
            size: 1,
            mime_type: "text/plain".into(),
            uploaded_at: Default::default(),
            url: format!("https://example.com/files/{name}"),
            checksum: "abc".into(),
        }
    }

    fn item(name: &str, size: u64) -> FileItem {
        FileItem::from_raw(&RawFile::new(name, size, "text/plain"))
    }

    fn state_with(names: &[(&str, u64)]) -> (QueueState, Vec<String>) {
        let items: Vec<FileItem> = names.iter().map(|(n, s)| item(n, *s)).collect();
        let ids = items.iter().map(|f| f.id.clone()).collect();
        let mut state = QueueState::new();
        state.add(items);
        (state, ids)
    }

    #[test]
    fn empty_add_keeps_session_absent() {
        let mut state = QueueState::new();
        state.add(Vec::new());
        assert!(state.session().is_none());
    }

    #[test]
    fn add_extends_existing_session() {
        let (mut state, _) = state_with(&[("a", 10)]);
        let start = state.session().unwrap().start_time;
        state.add(vec![item("b", 5), item("c", 7)]);

        let session = state.session().unwrap();
        assert_eq!(session.total_files, 3);
        assert_eq!(session.total_size, 22);
        assert_eq!(session.start_time, start);
    }

    #[test]
    fn full_success_path() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        let raw = state.begin_upload(&ids[0]).unwrap();
        assert_eq!(raw.name, "a");
        assert_eq!(state.get(&ids[0]).unwrap().status, FileStatus::Uploading);

        assert!(state.update_progress(&ids[0], 40.0, 123.0));
        assert_eq!(state.get(&ids[0]).unwrap().upload_speed, 123.0);

        assert!(state.complete(&ids[0], result("a")));
        let f = state.get(&ids[0]).unwrap();
        assert_eq!(f.status, FileStatus::Completed);
        assert_eq!(f.progress, 100.0);
        assert_eq!(f.upload_speed, 0.0);
        assert!(f.result.is_some());
        assert_eq!(state.session().unwrap().completed_files, 1);
    }

    #[test]
    fn begin_upload_requires_pending() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        assert!(state.begin_upload(&ids[0]).is_some());
        assert!(state.begin_upload(&ids[0]).is_none());
        assert!(state.begin_upload("missing").is_none());
    }

    #[test]
    fn failure_then_retry_adjusts_failed_count() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        state.begin_upload(&ids[0]);
        state.update_progress(&ids[0], 35.0, 10.0);
        assert!(state.fail(&ids[0], "Network error occurred"));

        let f = state.get(&ids[0]).unwrap();
        assert_eq!(f.status, FileStatus::Error);
        assert_eq!(f.progress, 0.0);
        assert_eq!(f.error.as_deref(), Some("Network error occurred"));
        assert_eq!(state.session().unwrap().failed_files, 1);

        state.reset_for_retry(&ids[0]).unwrap();
        let f = state.get(&ids[0]).unwrap();
        assert_eq!(f.status, FileStatus::Pending);
        assert!(f.error.is_none());
        assert_eq!(state.session().unwrap().failed_files, 0);
    }

    #[test]
    fn repeated_failures_keep_invariant() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        for _ in 0..3 {
            state.begin_upload(&ids[0]);
            state.fail(&ids[0], "boom");
            let s = state.session().unwrap();
            assert!(s.completed_files + s.failed_files <= s.total_files);
            state.reset_for_retry(&ids[0]).unwrap();
        }
    }

    #[test]
    fn retry_rejects_non_error_states() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        let err = state.reset_for_retry(&ids[0]).unwrap_err();
        assert!(matches!(
            err,
            QueueError::InvalidState { status: FileStatus::Pending, action: "retry", .. }
        ));
        assert!(matches!(
            state.reset_for_retry("missing"),
            Err(QueueError::NotFound(_))
        ));
    }

    #[test]
    fn remove_error_item_releases_failed_count() {
        let (mut state, ids) = state_with(&[("a", 10), ("b", 20)]);
        state.begin_upload(&ids[0]);
        state.fail(&ids[0], "boom");

        let removed = state.remove(&ids[0]).unwrap();
        assert_eq!(removed.name, "a");
        let s = state.session().unwrap();
        assert_eq!(s.total_files, 1);
        assert_eq!(s.total_size, 20);
        assert_eq!(s.failed_files, 0);
    }

    #[test]
    fn remove_refuses_uploading_and_completed() {
        let (mut state, ids) = state_with(&[("a", 10), ("b", 20)]);
        state.begin_upload(&ids[0]);
        assert!(matches!(
            state.remove(&ids[0]),
            Err(QueueError::InvalidState { status: FileStatus::Uploading, .. })
        ));

        state.complete(&ids[0], result("a"));
        assert!(matches!(
            state.remove(&ids[0]),
            Err(QueueError::InvalidState { status: FileStatus::Completed, .. })
        ));
        assert_eq!(state.files().len(), 2);
    }

    #[test]
    fn late_callbacks_after_clear_are_ignored() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        state.begin_upload(&ids[0]);
        state.clear();

        assert!(!state.update_progress(&ids[0], 50.0, 1.0));
        assert!(!state.complete(&ids[0], result("a")));
        assert!(!state.fail(&ids[0], "boom"));
        assert!(!state.set_thumbnail(&ids[0], "data:".into()));
        assert!(state.files().is_empty());
        assert!(state.session().is_none());
    }

    #[test]
    fn progress_ignored_unless_uploading() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        assert!(!state.update_progress(&ids[0], 10.0, 1.0));
        assert_eq!(state.get(&ids[0]).unwrap().progress, 0.0);
    }

    #[test]
    fn session_survives_removing_every_file() {
        let (mut state, ids) = state_with(&[("a", 10)]);
        state.remove(&ids[0]).unwrap();
        let s = state.session().unwrap();
        assert_eq!(s.total_files, 0);
        assert_eq!(s.total_size, 0);
    }
}
