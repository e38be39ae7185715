//! Media store integration
//!
//! Wraps the remote media service: list resources under the application
//! namespace, upload a prepared page into it and delete pages by id.

pub mod client;
pub mod mock;

pub use client::S3MediaStore;
pub use mock::MockMediaStore;

use crate::image::PreparedImage;
use crate::models::ImageResource;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Folder every resource of this application lives under.
    fn namespace(&self) -> &str;

    async fn list(&self, prefix: &str) -> Result<Vec<ImageResource>>;
    async fn upload(&self, folder: &str, image: &PreparedImage) -> Result<ImageResource>;
    async fn delete(&self, ids: &[String]) -> Result<Vec<String>>;
}

/// Build a fresh object key `folder/<uuid>.<ext>`.
pub(crate) fn new_object_key(folder: &str, content_type: &str) -> String {
    format!(
        "{}/{}.{}",
        folder.trim_matches('/'),
        uuid::Uuid::new_v4(),
        crate::mime::extension_for(content_type)
    )
}

/// Listing prefix for a folder, always ending in `/`.
pub(crate) fn folder_prefix(folder: &str) -> String {
    format!("{}/", folder.trim_matches('/'))
}
