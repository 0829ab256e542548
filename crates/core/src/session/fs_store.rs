//! Filesystem-backed session store implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::SessionsConfig;

use super::{CleanupOutcome, SessionRecord, SessionStore, SessionStoreError};

/// Filename of the record sidecar inside each session's output directory.
pub const SESSION_RECORD_FILE: &str = "session.json";

/// Session store rooted at a local data directory.
///
/// Layout: `<data_dir>/sessions/<session_id>/` for outputs and
/// `<data_dir>/uploads/<session_id>/` for transient uploads.
pub struct FsSessionStore {
    sessions_root: PathBuf,
    uploads_root: PathBuf,
}

impl FsSessionStore {
    /// Create a store from the sessions config.
    pub fn new(config: &SessionsConfig) -> Self {
        Self {
            sessions_root: config.sessions_root(),
            uploads_root: config.uploads_root(),
        }
    }

    /// Create a store with explicit roots.
    pub fn with_roots(sessions_root: impl Into<PathBuf>, uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            sessions_root: sessions_root.into(),
            uploads_root: uploads_root.into(),
        }
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        self.output_dir(session_id).join(SESSION_RECORD_FILE)
    }
}

async fn remove_dir_outcome(path: &Path) -> CleanupOutcome {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => CleanupOutcome::Cleaned,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CleanupOutcome::NotFound,
        Err(e) => CleanupOutcome::PartiallyCleaned {
            errors: vec![format!("{}: {}", path.display(), e)],
        },
    }
}

async fn list_dir_names(root: &Path) -> Result<Vec<String>, SessionStoreError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SessionStoreError::Io(e.to_string())),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SessionStoreError::Io(e.to_string()))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;
        if file_type.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

#[async_trait]
impl SessionStore for FsSessionStore {
    fn output_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_root.join(session_id)
    }

    fn upload_dir(&self, session_id: &str) -> PathBuf {
        self.uploads_root.join(session_id)
    }

    fn stem_path(&self, session_id: &str, stem: &str) -> PathBuf {
        self.output_dir(session_id).join(format!("{}.wav", stem))
    }

    async fn create_dirs(&self, session_id: &str) -> Result<(), SessionStoreError> {
        tokio::fs::create_dir_all(self.output_dir(session_id))
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;
        tokio::fs::create_dir_all(self.upload_dir(session_id))
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;
        Ok(())
    }

    async fn write_upload(
        &self,
        session_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, SessionStoreError> {
        let dir = self.upload_dir(session_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;

        let path = dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;

        Ok(path)
    }

    async fn write_record(&self, record: &SessionRecord) -> Result<(), SessionStoreError> {
        let dir = self.output_dir(&record.session_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;

        tokio::fs::write(self.record_path(&record.session_id), json)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;

        Ok(())
    }

    async fn load_record(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, SessionStoreError> {
        let raw = match tokio::fs::read_to_string(self.record_path(session_id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::Io(e.to_string())),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))
    }

    async fn delete_session_dir(&self, session_id: &str) -> CleanupOutcome {
        remove_dir_outcome(&self.output_dir(session_id)).await
    }

    async fn delete_upload_dir(&self, session_id: &str) -> CleanupOutcome {
        remove_dir_outcome(&self.upload_dir(session_id)).await
    }

    async fn list_session_dirs(&self) -> Result<Vec<String>, SessionStoreError> {
        list_dir_names(&self.sessions_root).await
    }

    async fn list_upload_dirs(&self) -> Result<Vec<String>, SessionStoreError> {
        list_dir_names(&self.uploads_root).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_store(temp: &tempfile::TempDir) -> FsSessionStore {
        FsSessionStore::with_roots(
            temp.path().join("sessions"),
            temp.path().join("uploads"),
        )
    }

    fn create_test_record(store: &FsSessionStore, session_id: &str) -> SessionRecord {
        SessionRecord {
            session_id: session_id.to_string(),
            user_id: "user-1".to_string(),
            created_at: Utc::now(),
            available_stems: vec!["drums".to_string(), "vocals".to_string()],
            output_path: store.output_dir(session_id),
            storage_prefix: Some(session_id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        store.create_dirs("s1").await.unwrap();

        assert!(store.output_dir("s1").is_dir());
        assert!(store.upload_dir("s1").is_dir());
    }

    #[tokio::test]
    async fn test_write_and_load_record() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);
        let record = create_test_record(&store, "s1");

        store.write_record(&record).await.unwrap();
        let loaded = store.load_record("s1").await.unwrap();

        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn test_load_record_missing_returns_none() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        let loaded = store.load_record("nope").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_record_corrupt_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        store.create_dirs("s1").await.unwrap();
        tokio::fs::write(store.output_dir("s1").join(SESSION_RECORD_FILE), b"not json")
            .await
            .unwrap();

        let result = store.load_record("s1").await;
        assert!(matches!(result, Err(SessionStoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_stem_path_layout() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        let path = store.stem_path("s1", "vocals");
        assert!(path.ends_with("sessions/s1/vocals.wav"));
    }

    #[tokio::test]
    async fn test_write_upload() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        let path = store
            .write_upload("s1", "input.wav", b"RIFF fake wav")
            .await
            .unwrap();

        assert!(path.ends_with("uploads/s1/input.wav"));
        let bytes = tokio::fs::read(&path).await.unwrap();
        assert_eq!(bytes, b"RIFF fake wav");
    }

    #[tokio::test]
    async fn test_delete_session_dir() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);
        store.create_dirs("s1").await.unwrap();

        assert_eq!(store.delete_session_dir("s1").await, CleanupOutcome::Cleaned);
        assert!(!store.output_dir("s1").exists());

        // Deleting again is a no-op.
        assert_eq!(store.delete_session_dir("s1").await, CleanupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_delete_upload_dir() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);
        store.create_dirs("s1").await.unwrap();

        assert_eq!(store.delete_upload_dir("s1").await, CleanupOutcome::Cleaned);
        assert_eq!(store.delete_upload_dir("s1").await, CleanupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_list_session_dirs_sorted() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        store.create_dirs("charlie").await.unwrap();
        store.create_dirs("alpha").await.unwrap();
        store.create_dirs("bravo").await.unwrap();

        let dirs = store.list_session_dirs().await.unwrap();
        assert_eq!(dirs, vec!["alpha", "bravo", "charlie"]);
    }

    #[tokio::test]
    async fn test_list_session_dirs_ignores_files() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        store.create_dirs("s1").await.unwrap();
        tokio::fs::write(temp.path().join("sessions/stray.txt"), b"x")
            .await
            .unwrap();

        let dirs = store.list_session_dirs().await.unwrap();
        assert_eq!(dirs, vec!["s1"]);
    }

    #[tokio::test]
    async fn test_list_session_dirs_missing_root_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        let dirs = store.list_session_dirs().await.unwrap();
        assert!(dirs.is_empty());
    }

    #[tokio::test]
    async fn test_list_upload_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let store = create_test_store(&temp);

        store.create_dirs("s1").await.unwrap();
        store.delete_session_dir("s1").await;

        let uploads = store.list_upload_dirs().await.unwrap();
        assert_eq!(uploads, vec!["s1"]);
    }
}
