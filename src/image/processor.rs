use super::{ImageService, PreparedImage};
use crate::mime::detect_image_mime;
use crate::{Error, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

const PAPER: u32 = 255;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Composite any transparency onto white paper.
    fn flatten(image: &DynamicImage) -> RgbImage {
        let rgba = image.to_rgba8();
        let mut page = RgbImage::new(rgba.width(), rgba.height());

        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = pixel[3] as u32;
            let blend = |channel: u8| -> u8 {
                ((channel as u32 * alpha + PAPER * (255 - alpha)) / 255) as u8
            };
            page.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
        }

        page
    }

    fn prepare_sync(image_data: Vec<u8>) -> Result<PreparedImage> {
        let image = image::load_from_memory(&image_data)?;
        let page = Self::flatten(&image);

        let mut data = Vec::new();
        page.write_to(&mut std::io::Cursor::new(&mut data), ImageFormat::Png)?;

        Ok(PreparedImage {
            data,
            width: page.width(),
            height: page.height(),
            content_type: "image/png",
        })
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn prepare(&self, image_data: &[u8]) -> Result<PreparedImage> {
        tracing::debug!(
            "Preparing rendered page ({} bytes, {})",
            image_data.len(),
            detect_image_mime(image_data)
        );

        let image_data = image_data.to_vec();
        tokio::task::spawn_blocking(move || Self::prepare_sync(image_data))
            .await
            .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_prepare_reports_dimensions_and_png() {
        let source = RgbaImage::from_pixel(12, 30, Rgba([0, 0, 255, 255]));
        let bytes = encode(DynamicImage::ImageRgba8(source), ImageFormat::Png);

        let prepared = ImageProcessor::new().prepare(&bytes).await.unwrap();

        assert_eq!(prepared.width, 12);
        assert_eq!(prepared.height, 30);
        assert_eq!(prepared.content_type, "image/png");
        assert_eq!(detect_image_mime(&prepared.data), "image/png");
    }

    #[tokio::test]
    async fn test_prepare_flattens_transparency_onto_white() {
        let mut source = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        source.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        let bytes = encode(DynamicImage::ImageRgba8(source), ImageFormat::Png);

        let prepared = ImageProcessor::new().prepare(&bytes).await.unwrap();
        let page = image::load_from_memory(&prepared.data).unwrap().to_rgb8();

        assert_eq!(page.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(page.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[tokio::test]
    async fn test_prepare_converts_jpeg_input() {
        let source = RgbImage::from_pixel(8, 8, Rgb([10, 10, 10]));
        let bytes = encode(DynamicImage::ImageRgb8(source), ImageFormat::Jpeg);

        let prepared = ImageProcessor::new().prepare(&bytes).await.unwrap();

        assert_eq!((prepared.width, prepared.height), (8, 8));
        assert_eq!(detect_image_mime(&prepared.data), "image/png");
    }

    #[tokio::test]
    async fn test_prepare_rejects_garbage() {
        let result = ImageProcessor::new().prepare(b"definitely not an image").await;
        assert!(matches!(result, Err(Error::Image(_))));
    }
}
