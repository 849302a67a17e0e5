//! File storage abstraction over Google Drive
//!
//! The pipeline only needs three operations against storage: fetch a
//! document, publish a CSV, and list a folder. `StoreClient` mirrors the
//! model-client shape, with a mock variant for tests.

mod drive;
mod mock;

pub use drive::{DriveStore, ServiceAccountKey};
pub use mock::MockStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::DriveFile;
use crate::settings::DriveSettings;

/// A downloaded document: original filename plus raw bytes
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// An uploaded CSV: file id plus a browser link
#[derive(Debug, Clone)]
pub struct UploadedCsv {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Download a file by id, returning its name and content
    async fn download(&self, file_id: &str) -> Result<StoredDocument>;

    /// Upload CSV content into a folder, returning id and link
    async fn upload_csv(
        &self,
        filename: &str,
        content: &str,
        folder_id: Option<&str>,
    ) -> Result<UploadedCsv>;

    /// List the files in a folder
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>>;
}

/// Concrete store client enum
#[derive(Clone)]
pub enum StoreClient {
    Drive(DriveStore),
    Mock(MockStore),
}

impl StoreClient {
    /// Build a Drive client from settings; `None` when no credentials
    /// path is configured
    pub fn from_settings(settings: &DriveSettings) -> Option<Result<Self>> {
        let path = settings.credentials_path.as_ref()?;
        Some(DriveStore::from_credentials_file(path).map(StoreClient::Drive))
    }

    pub fn mock() -> Self {
        StoreClient::Mock(MockStore::new())
    }
}

#[async_trait]
impl FileStore for StoreClient {
    async fn download(&self, file_id: &str) -> Result<StoredDocument> {
        match self {
            StoreClient::Drive(s) => s.download(file_id).await,
            StoreClient::Mock(s) => s.download(file_id).await,
        }
    }

    async fn upload_csv(
        &self,
        filename: &str,
        content: &str,
        folder_id: Option<&str>,
    ) -> Result<UploadedCsv> {
        match self {
            StoreClient::Drive(s) => s.upload_csv(filename, content, folder_id).await,
            StoreClient::Mock(s) => s.upload_csv(filename, content, folder_id).await,
        }
    }

    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        match self {
            StoreClient::Drive(s) => s.list_folder(folder_id).await,
            StoreClient::Mock(s) => s.list_folder(folder_id).await,
        }
    }
}
