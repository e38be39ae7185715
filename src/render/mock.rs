use super::HandwritingRenderer;
use crate::models::RenderOptions;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Encode a plain white page, returned when no image response is configured.
pub fn blank_page_png(width: u32, height: u32) -> Result<Vec<u8>> {
    let page = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    page.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

#[derive(Clone)]
pub struct MockRenderer {
    image_response: Arc<Mutex<Option<Vec<u8>>>>,
    calls: Arc<Mutex<Vec<(String, RenderOptions)>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            image_response: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        *self.image_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<(String, RenderOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HandwritingRenderer for MockRenderer {
    async fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), *options));

        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Render("Mock failure".to_string()));
        }

        let configured = self.image_response.lock().unwrap().clone();
        match configured {
            Some(bytes) => Ok(bytes),
            None => blank_page_png(4, 6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InkColor;

    #[tokio::test]
    async fn test_mock_renderer_defaults_to_png() {
        let renderer = MockRenderer::new();

        let bytes = renderer
            .render("hello", &RenderOptions::default())
            .await
            .unwrap();

        assert_eq!(bytes, blank_page_png(4, 6).unwrap());
        assert_eq!(crate::mime::detect_image_mime(&bytes), "image/png");
        assert_eq!(renderer.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_renderer_records_calls() {
        let renderer = MockRenderer::new().with_image_response(vec![1, 2, 3]);
        let options = RenderOptions {
            color: InkColor::Red,
            ruled: true,
        };

        let bytes = renderer.render("note", &options).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        let calls = renderer.get_calls();
        assert_eq!(calls, vec![("note".to_string(), options)]);
    }

    #[tokio::test]
    async fn test_mock_renderer_with_failure() {
        let renderer = MockRenderer::new().with_failure(true);

        let result = renderer.render("note", &RenderOptions::default()).await;
        assert!(matches!(result, Err(crate::Error::Render(_))));
    }
}
