use super::{folder_prefix, new_object_key, MediaStore};
use crate::image::PreparedImage;
use crate::models::ImageResource;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::{ByteStream, DateTime as S3DateTime};
use aws_sdk_s3::types::{Delete, Object, ObjectCannedAcl, ObjectIdentifier};
use aws_sdk_s3::{config::Region, Client as S3Client};
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::time::Instant;

const WIDTH_KEY: &str = "width";
const HEIGHT_KEY: &str = "height";
/// Upper bound on in-flight `HeadObject` calls during a listing.
const METADATA_CONCURRENCY: usize = 16;

/// S3-compatible store (DigitalOcean Spaces, MinIO, AWS) for rendered pages.
pub struct S3MediaStore {
    client: S3Client,
    bucket: String,
    base_url: String,
    namespace: String,
}

pub struct S3Settings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub base_url: String,
    pub namespace: String,
}

impl S3MediaStore {
    pub async fn new(settings: S3Settings) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            settings.access_key_id,
            settings.secret_access_key,
            None,
            None,
            "inkpage-media-store",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(settings.region))
            .endpoint_url(settings.endpoint)
            .load()
            .await;

        Ok(Self {
            client: S3Client::new(&config),
            bucket: settings.bucket,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            namespace: settings.namespace.trim_matches('/').to_string(),
        })
    }

    fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<(String, Option<DateTime<Utc>>)>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        prefix = %prefix,
                        "S3 list failed"
                    );
                    Error::Storage(format!("Failed to list resources: {}", e))
                })?;

            keys.extend(output.contents().iter().filter_map(listed_key));

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    /// Read the stored dimensions of `key`. `None` when the object vanished
    /// between listing and this call.
    async fn describe(
        &self,
        key: String,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Option<ImageResource>> {
        let head = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(head) => head,
            Err(e) if e.as_service_error().is_some_and(is_missing) => {
                tracing::warn!(
                    bucket = %self.bucket,
                    key = %key,
                    "S3 object gone before head, skipping"
                );
                return Ok(None);
            }
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 head failed");
                return Err(Error::Storage(format!(
                    "Failed to read metadata for {}: {}",
                    key, e
                )));
            }
        };

        let (width, height) = head
            .metadata()
            .map(dimensions_from_metadata)
            .unwrap_or((0, 0));

        Ok(Some(ImageResource {
            url: self.get_public_url(&key),
            id: key,
            width,
            height,
            created_at,
        }))
    }
}

fn is_missing(err: &HeadObjectError) -> bool {
    matches!(err, HeadObjectError::NotFound(_))
}

/// Drop objects that disappeared mid-listing; newest first, untimestamped last.
fn newest_first(described: Vec<Option<ImageResource>>) -> Vec<ImageResource> {
    let mut resources: Vec<ImageResource> = described.into_iter().flatten().collect();
    resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    resources
}

fn listed_key(object: &Object) -> Option<(String, Option<DateTime<Utc>>)> {
    let key = object.key()?;
    // Zero-byte "folder" placeholders some consoles create.
    if key.ends_with('/') {
        return None;
    }
    Some((key.to_string(), object.last_modified().and_then(to_chrono)))
}

fn to_chrono(timestamp: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

fn dimensions_from_metadata(metadata: &HashMap<String, String>) -> (u32, u32) {
    let read = |key: &str| {
        metadata
            .get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    };
    (read(WIDTH_KEY), read(HEIGHT_KEY))
}

#[async_trait]
impl MediaStore for S3MediaStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ImageResource>> {
        let start = Instant::now();
        let listing_prefix = folder_prefix(prefix);
        let keys = self.list_keys(&listing_prefix).await?;

        let described: Vec<Option<ImageResource>> = futures::stream::iter(keys)
            .map(|(key, created_at)| self.describe(key, created_at))
            .buffer_unordered(METADATA_CONCURRENCY)
            .try_collect()
            .await?;
        let resources = newest_first(described);

        tracing::info!(
            bucket = %self.bucket,
            prefix = %listing_prefix,
            count = resources.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(resources)
    }

    async fn upload(&self, folder: &str, image: &PreparedImage) -> Result<ImageResource> {
        let start = Instant::now();
        let key = new_object_key(folder, image.content_type);
        let size = image.data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(image.data.clone()))
            .content_type(image.content_type)
            .metadata(WIDTH_KEY, image.width.to_string())
            .metadata(HEIGHT_KEY, image.height.to_string())
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    "S3 upload failed"
                );
                Error::Storage(format!("Failed to upload file: {}", e))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(ImageResource {
            url: self.get_public_url(&key),
            id: key,
            width: image.width,
            height: image.height,
            created_at: Some(Utc::now()),
        })
    }

    async fn delete(&self, ids: &[String]) -> Result<Vec<String>> {
        let start = Instant::now();
        let objects = ids
            .iter()
            .map(|id| ObjectIdentifier::builder().key(id).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Storage(format!("Invalid object identifier: {}", e)))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| Error::Storage(format!("Invalid delete request: {}", e)))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, "S3 delete failed");
                Error::Storage(format!("Failed to delete resources: {}", e))
            })?;

        if let Some(failure) = output.errors().first() {
            return Err(Error::Storage(format!(
                "Failed to delete {}: {}",
                failure.key().unwrap_or("<unknown>"),
                failure.message().unwrap_or("unknown error")
            )));
        }

        let deleted: Vec<String> = output
            .deleted()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        tracing::info!(
            bucket = %self.bucket,
            count = deleted.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(deleted)
    }
}
