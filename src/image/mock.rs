use super::{ImageService, PreparedImage};
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Passes bytes through untouched and reports fixed dimensions.
#[derive(Clone)]
pub struct MockImageProcessor {
    process_count: Arc<Mutex<usize>>,
    dimensions: (u32, u32),
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            process_count: Arc::new(Mutex::new(0)),
            dimensions: (800, 1100),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = (width, height);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_process_count(&self) -> usize {
        *self.process_count.lock().unwrap()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn prepare(&self, image_data: &[u8]) -> Result<PreparedImage> {
        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        *self.process_count.lock().unwrap() += 1;

        Ok(PreparedImage {
            data: image_data.to_vec(),
            width: self.dimensions.0,
            height: self.dimensions.1,
            content_type: "image/png",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_image_processor() {
        let processor = MockImageProcessor::new().with_dimensions(10, 20);

        let prepared = processor.prepare(b"fake image data").await.unwrap();

        assert_eq!(prepared.data, b"fake image data".to_vec());
        assert_eq!((prepared.width, prepared.height), (10, 20));
        assert_eq!(processor.get_process_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_failure() {
        let processor = MockImageProcessor::new().with_failure(true);

        let result = processor.prepare(b"data").await;
        assert!(result.is_err());
        assert_eq!(processor.get_process_count(), 0);
    }
}
