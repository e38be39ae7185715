//! Data models and structures
//!
//! Defines the stored image resource, request/response payloads for the
//! HTTP API and the renderer, and environment configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A rendered page held by the remote media store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResource {
    pub id: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InkColor {
    #[default]
    Black,
    Red,
    Blue,
}

impl InkColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            InkColor::Black => "black",
            InkColor::Red => "red",
            InkColor::Blue => "blue",
        }
    }
}

impl fmt::Display for InkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InkColor {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(InkColor::Black),
            "red" => Ok(InkColor::Red),
            "blue" => Ok(InkColor::Blue),
            other => Err(crate::Error::Validation(format!(
                "Unsupported color '{}'. Expected one of: black, red, blue",
                other
            ))),
        }
    }
}

fn default_color() -> String {
    InkColor::default().as_str().to_string()
}

/// Body of `POST /api/images`.
///
/// `color` stays a string here so unknown values reach validation instead of
/// failing JSON extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateImageRequest {
    pub text: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub ruled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub color: InkColor,
    pub ruled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
}

/// Success envelope shared by every API route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub result: T,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            message: "Success".to_string(),
            result,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub error: String,
}

impl ApiErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            message: "Error".to_string(),
            error: error.into(),
        }
    }
}

// Renderer API Request/Response models
#[derive(Debug, Serialize)]
pub struct RenderRequest {
    pub text: String,
    pub color: InkColor,
    pub ruled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenderResponse {
    /// Base64 payload, optionally wrapped in a `data:` URL.
    pub image: Option<String>,
    pub url: Option<String>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub renderer_url: String,
    pub renderer_timeout_secs: u64,
    pub media_folder: String,
    pub cdn_access_key_id: Option<String>,
    pub cdn_secret_access_key: Option<String>,
    pub cdn_endpoint: String,
    pub cdn_region: String,
    pub cdn_bucket: String,
    pub cdn_base_url: String,
    pub dry_run: bool,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let dry_run = lookup("DRY_RUN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let renderer_url = lookup("RENDERER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| crate::Error::Config("RENDERER_URL not set".to_string()))?;

        let renderer_timeout_secs = parse_number(&lookup, "RENDERER_TIMEOUT_SECS", 60)?;
        let max_body_bytes = parse_number(&lookup, "MAX_BODY_BYTES", 64 * 1024)?;

        let media_folder = var_or("MEDIA_FOLDER", "handwritten")
            .trim_matches('/')
            .to_string();
        if media_folder.is_empty() {
            return Err(crate::Error::Config(
                "MEDIA_FOLDER must not be empty".to_string(),
            ));
        }

        let cdn_access_key_id = lookup("CDN_ACCESS_KEY_ID");
        let cdn_secret_access_key = lookup("CDN_SECRET_ACCESS_KEY");
        if !dry_run {
            if cdn_access_key_id.is_none() {
                return Err(crate::Error::Config(
                    "CDN_ACCESS_KEY_ID not set".to_string(),
                ));
            }
            if cdn_secret_access_key.is_none() {
                return Err(crate::Error::Config(
                    "CDN_SECRET_ACCESS_KEY not set".to_string(),
                ));
            }
        }

        Ok(Self {
            bind_addr: var_or("BIND_ADDR", "127.0.0.1:3000"),
            renderer_url,
            renderer_timeout_secs,
            media_folder,
            cdn_access_key_id,
            cdn_secret_access_key,
            cdn_endpoint: var_or("CDN_ENDPOINT", "https://nyc3.digitaloceanspaces.com"),
            cdn_region: var_or("CDN_REGION", "us-east-1"),
            cdn_bucket: var_or("CDN_BUCKET", "inkpage"),
            cdn_base_url: var_or("CDN_BASE_URL", "https://cdn.inkpage.app")
                .trim_end_matches('/')
                .to_string(),
            dry_run,
            max_body_bytes,
        })
    }
}

fn parse_number<F, N>(lookup: &F, key: &str, default: N) -> crate::Result<N>
where
    F: Fn(&str) -> Option<String>,
    N: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::Config(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}
