//! Orchestration of the list/create/delete workflow.

use crate::image::{ImageProcessor, ImageService};
use crate::models::{Config, CreateImageRequest, DeleteOutcome, ImageResource, RenderOptions};
use crate::render::{HandwritingRenderer, HttpRenderer};
use crate::store::client::S3Settings;
use crate::store::{MediaStore, MockMediaStore, S3MediaStore};
use crate::{Error, Result};
use std::time::Duration;
use tracing::info;

/// Renders submitted text and manages the resulting pages in the media store.
pub struct Gallery {
    renderer: Box<dyn HandwritingRenderer>,
    image: Box<dyn ImageService>,
    store: Box<dyn MediaStore>,
}

/// Injectable service bundle used to construct [`Gallery`] in tests/harnesses.
pub struct GalleryServices {
    pub renderer: Box<dyn HandwritingRenderer>,
    pub image: Box<dyn ImageService>,
    pub store: Box<dyn MediaStore>,
}

impl Gallery {
    pub fn with_services(services: GalleryServices) -> Self {
        Self {
            renderer: services.renderer,
            image: services.image,
            store: services.store,
        }
    }

    /// Construct a gallery from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let renderer = HttpRenderer::new(
            config.renderer_url.clone(),
            Duration::from_secs(config.renderer_timeout_secs),
        )?;
        info!("Renderer: {}", config.renderer_url);

        let store: Box<dyn MediaStore> = if config.dry_run {
            info!("DRY_RUN enabled: pages are kept in memory only");
            Box::new(
                MockMediaStore::new()
                    .with_base_url(config.cdn_base_url.clone())
                    .with_namespace(config.media_folder.clone()),
            )
        } else {
            let (Some(access_key_id), Some(secret_access_key)) = (
                config.cdn_access_key_id.clone(),
                config.cdn_secret_access_key.clone(),
            ) else {
                return Err(Error::Config(
                    "CDN credentials are required unless DRY_RUN is set".to_string(),
                ));
            };

            info!(
                "Media store: bucket {} at {} (folder {})",
                config.cdn_bucket, config.cdn_endpoint, config.media_folder
            );
            Box::new(
                S3MediaStore::new(S3Settings {
                    access_key_id,
                    secret_access_key,
                    endpoint: config.cdn_endpoint.clone(),
                    region: config.cdn_region.clone(),
                    bucket: config.cdn_bucket.clone(),
                    base_url: config.cdn_base_url.clone(),
                    namespace: config.media_folder.clone(),
                })
                .await?,
            )
        };

        Ok(Self::with_services(GalleryServices {
            renderer: Box::new(renderer),
            image: Box::new(ImageProcessor::new()),
            store,
        }))
    }

    pub async fn list(&self) -> Result<Vec<ImageResource>> {
        let resources = self.store.list(self.store.namespace()).await?;
        info!("Listed {} pages", resources.len());
        Ok(resources)
    }

    pub async fn create(&self, request: CreateImageRequest) -> Result<ImageResource> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(Error::Validation("Text must not be empty".to_string()));
        }
        let options = RenderOptions {
            color: request.color.parse()?,
            ruled: request.ruled,
        };

        let rendered = self.renderer.render(text, &options).await?;
        info!(
            "Rendered {} chars in {} ink ({} bytes)",
            text.chars().count(),
            options.color,
            rendered.len()
        );

        let page = self.image.prepare(&rendered).await?;
        let resource = self.store.upload(self.store.namespace(), &page).await?;
        info!(
            "Stored page {} ({}x{})",
            resource.id, resource.width, resource.height
        );

        Ok(resource)
    }

    pub async fn delete<S: AsRef<str>>(&self, segments: &[S]) -> Result<DeleteOutcome> {
        let id = join_identifier(segments);
        if id.is_empty() {
            return Err(Error::Validation("Missing image identifier".to_string()));
        }

        let namespace = self.store.namespace();
        if !id.starts_with(&format!("{}/", namespace)) {
            return Err(Error::Validation(format!(
                "Identifier '{}' is outside the '{}' folder",
                id, namespace
            )));
        }

        let deleted = self.store.delete(&[id]).await?;
        info!("Deleted {:?}", deleted);
        Ok(DeleteOutcome { deleted })
    }
}

/// Reassemble an identifier from path components, dropping empty segments.
pub fn join_identifier<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .flat_map(|segment| segment.as_ref().split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::{join_identifier, Gallery, GalleryServices};
    use crate::image::MockImageProcessor;
    use crate::models::{CreateImageRequest, InkColor};
    use crate::render::MockRenderer;
    use crate::store::MockMediaStore;
    use crate::Error;

    const TEST_CDN_BASE_URL: &str = "https://cdn.test";

    fn build_test_gallery(renderer: MockRenderer, store: MockMediaStore) -> Gallery {
        Gallery::with_services(GalleryServices {
            renderer: Box::new(renderer),
            image: Box::new(MockImageProcessor::new().with_dimensions(640, 900)),
            store: Box::new(store),
        })
    }

    fn request(text: &str, color: &str, ruled: bool) -> CreateImageRequest {
        CreateImageRequest {
            text: text.to_string(),
            color: color.to_string(),
            ruled,
        }
    }

    #[tokio::test]
    async fn test_create_then_list_includes_new_page() {
        let store = MockMediaStore::new().with_base_url(TEST_CDN_BASE_URL.to_string());
        let gallery = build_test_gallery(MockRenderer::new(), store.clone());

        let created = gallery
            .create(request("Dear diary", "blue", true))
            .await
            .unwrap();

        assert!(created.id.starts_with("handwritten/"));
        assert!(created.url.starts_with("https://cdn.test/handwritten/"));
        assert_eq!((created.width, created.height), (640, 900));

        let listed = gallery.list().await.unwrap();
        assert_eq!(listed, vec![created]);
        assert_eq!(store.get_upload_count(), 1);
    }

    #[tokio::test]
    async fn test_create_passes_trimmed_text_and_style() {
        let renderer = MockRenderer::new();
        let recorded = renderer.clone();
        let gallery = build_test_gallery(renderer, MockMediaStore::new());

        gallery
            .create(request("  shopping list \n", "RED", false))
            .await
            .unwrap();

        let calls = recorded.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "shopping list");
        assert_eq!(calls[0].1.color, InkColor::Red);
        assert!(!calls[0].1.ruled);
    }

    #[tokio::test]
    async fn test_invalid_color_rejected_before_rendering() {
        let renderer = MockRenderer::new();
        let recorded = renderer.clone();
        let gallery = build_test_gallery(renderer, MockMediaStore::new());

        let err = gallery
            .create(request("hello", "green", false))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(recorded.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_rendering() {
        let renderer = MockRenderer::new();
        let recorded = renderer.clone();
        let gallery = build_test_gallery(renderer, MockMediaStore::new());

        let err = gallery.create(request("   ", "black", false)).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(recorded.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_render_failure_skips_upload() {
        let store = MockMediaStore::new();
        let gallery = build_test_gallery(MockRenderer::new().with_failure(true), store.clone());

        let err = gallery
            .create(request("hello", "black", false))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Render(_)));
        assert_eq!(store.get_upload_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_page_from_listing() {
        let gallery = build_test_gallery(MockRenderer::new(), MockMediaStore::new());
        let created = gallery
            .create(request("to be removed", "black", false))
            .await
            .unwrap();

        let segments: Vec<&str> = created.id.split('/').collect();
        let outcome = gallery.delete(&segments).await.unwrap();

        assert_eq!(outcome.deleted, vec![created.id]);
        assert!(gallery.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_identifier() {
        let gallery = build_test_gallery(MockRenderer::new(), MockMediaStore::new());

        let err = gallery.delete(&["", "/"]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_rejects_identifier_outside_folder() {
        let gallery = build_test_gallery(MockRenderer::new(), MockMediaStore::new());

        let err = gallery.delete(&["other", "a.png"]).await.unwrap_err();
        assert!(err.to_string().contains("outside"));

        let err = gallery.delete(&["handwritten"]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_as_storage_error() {
        let store = MockMediaStore::new();
        store.set_failure(true);
        let gallery = build_test_gallery(MockRenderer::new(), store);

        assert!(matches!(gallery.list().await, Err(Error::Storage(_))));
    }

    #[test]
    fn test_join_identifier() {
        assert_eq!(join_identifier(&["handwritten", "a.png"]), "handwritten/a.png");
        assert_eq!(join_identifier(&["handwritten//a.png/"]), "handwritten/a.png");
        assert_eq!(join_identifier::<&str>(&[]), "");
        assert_eq!(
            join_identifier(&["handwritten/ spaced page .png"]),
            "handwritten/ spaced page .png"
        );
    }
}
