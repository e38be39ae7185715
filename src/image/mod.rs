//! Image preparation for upload
//!
//! Normalises whatever the renderer produced into a flat PNG page and
//! measures it, so the store can record the page dimensions.

pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn prepare(&self, image_data: &[u8]) -> Result<PreparedImage>;
}
