use super::HandwritingRenderer;
use crate::mime::sniff_image_mime;
use crate::models::{RenderOptions, RenderRequest, RenderResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Talks to a handwriting renderer over HTTP (`POST {base_url}/render`).
pub struct HttpRenderer {
    client: Client,
    base_url: String,
}

impl HttpRenderer {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Render(format!(
                "Failed to fetch rendered image (status {})",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode a base64 payload, accepting a `data:image/...;base64,` prefix.
fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };

    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Render(format!("Failed to decode base64 image: {}", e)))
}

#[async_trait]
impl HandwritingRenderer for HttpRenderer {
    async fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let url = format!("{}/render", self.base_url);
        let request = RenderRequest {
            text: text.to_string(),
            color: options.color,
            ruled: options.ruled,
        };

        tracing::debug!(
            chars = text.chars().count(),
            color = %options.color,
            ruled = options.ruled,
            "Sending render request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to renderer: {}", e);
                Error::Render(format!("Renderer unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Renderer error (status {}): {}", status, error_text);
            return Err(Error::Render(format!(
                "Renderer error (status {}): {}",
                status, error_text
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = response.bytes().await?;

        if content_type.starts_with("image/") || sniff_image_mime(&body).is_some() {
            return Ok(body.to_vec());
        }

        let parsed: RenderResponse = serde_json::from_slice(&body).inspect_err(|e| {
            tracing::error!("Failed to parse renderer response: {}", e);
        })?;

        if let Some(image) = &parsed.image {
            decode_image_payload(image)
        } else if let Some(url) = &parsed.url {
            self.fetch_url(url).await
        } else {
            Err(Error::Render(
                "No image data (neither base64 nor URL) in response".to_string(),
            ))
        }
    }
}
