//! inkpage - turns submitted text into handwritten-looking pages
//!
//! Text is sent to a handwriting renderer, the resulting page is normalised
//! to PNG and published to an S3-compatible media store. A small JSON API
//! lists, creates and deletes the stored pages.

pub mod error;
pub mod gallery;
pub mod image;
pub mod mime;
pub mod models;
pub mod render;
pub mod server;
pub mod store;

pub use error::{Error, Result};
