//! Handwriting renderer integration
//!
//! Sends submitted text and style options to an external renderer that
//! draws it as a handwritten page and hands back the image bytes.

pub mod client;
pub mod mock;

pub use client::HttpRenderer;
pub use mock::MockRenderer;

use crate::models::RenderOptions;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait HandwritingRenderer: Send + Sync {
    async fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<u8>>;
}
