//! In-memory mock store for tests
//!
//! Seeded with files by id; uploads are recorded so tests can inspect
//! what would have landed in Drive. Failures can be scripted per file id.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::DriveFile;

use super::{FileStore, StoredDocument, UploadedCsv};

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub filename: String,
    pub content: String,
    pub folder_id: Option<String>,
}

#[derive(Clone)]
pub struct MockStore {
    files: Arc<Mutex<HashMap<String, StoredDocument>>>,
    folders: Arc<Mutex<HashMap<String, Vec<DriveFile>>>>,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    failing_ids: Arc<Mutex<HashSet<String>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            folders: Arc::new(Mutex::new(HashMap::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            failing_ids: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Seed a downloadable file
    pub fn seed_file(&self, id: impl Into<String>, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.lock().expect("mock lock").insert(
            id.into(),
            StoredDocument {
                name: name.into(),
                bytes,
            },
        );
    }

    /// Seed a folder listing entry
    pub fn seed_folder_entry(&self, folder_id: impl Into<String>, file: DriveFile) {
        self.folders
            .lock()
            .expect("mock lock")
            .entry(folder_id.into())
            .or_default()
            .push(file);
    }

    /// Make download fail for a specific file id
    pub fn fail_download(&self, id: impl Into<String>) {
        self.failing_ids.lock().expect("mock lock").insert(id.into());
    }

    /// Uploads recorded so far, in order
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().expect("mock lock").clone()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStore for MockStore {
    async fn download(&self, file_id: &str) -> Result<StoredDocument> {
        if self.failing_ids.lock().expect("mock lock").contains(file_id) {
            return Err(Error::Drive(format!("Download failed for {}", file_id)));
        }
        self.files
            .lock()
            .expect("mock lock")
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::Drive(format!("File not found: {}", file_id)))
    }

    async fn upload_csv(
        &self,
        filename: &str,
        content: &str,
        folder_id: Option<&str>,
    ) -> Result<UploadedCsv> {
        let mut uploads = self.uploads.lock().expect("mock lock");
        uploads.push(RecordedUpload {
            filename: filename.to_string(),
            content: content.to_string(),
            folder_id: folder_id.map(str::to_string),
        });
        let id = format!("mock-upload-{}", uploads.len());
        let url = format!("https://drive.google.com/file/d/{}/view", id);
        Ok(UploadedCsv { id, url })
    }

    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        Ok(self
            .folders
            .lock()
            .expect("mock lock")
            .get(folder_id)
            .cloned()
            .unwrap_or_default())
    }
}
