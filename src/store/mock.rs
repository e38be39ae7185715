use super::{folder_prefix, new_object_key, MediaStore};
use crate::image::PreparedImage;
use crate::models::ImageResource;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

/// In-memory media store, used by tests and by dry runs.
#[derive(Clone)]
pub struct MockMediaStore {
    resources: Arc<Mutex<Vec<(ImageResource, Vec<u8>)>>>,
    base_url: String,
    namespace: String,
    upload_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self {
            resources: Arc::new(Mutex::new(Vec::new())),
            base_url: "https://mock-cdn.example.com".to_string(),
            namespace: "handwritten".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_namespace(mut self, namespace: String) -> Self {
        self.namespace = namespace.trim_matches('/').to_string();
        self
    }

    pub fn with_resource(self, resource: ImageResource) -> Self {
        self.resources.lock().unwrap().push((resource, Vec::new()));
        self
    }

    /// Make every following call fail as if the remote service were down.
    pub fn set_failure(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_data(&self, id: &str) -> Option<Vec<u8>> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .find(|(resource, _)| resource.id == id)
            .map(|(_, data)| data.clone())
    }

    fn check_available(&self) -> Result<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Storage("Mock store unavailable".to_string()));
        }
        Ok(())
    }
}

impl Default for MockMediaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ImageResource>> {
        self.check_available()?;

        let prefix = folder_prefix(prefix);
        let mut listed: Vec<ImageResource> = self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|(resource, _)| resource.id.starts_with(&prefix))
            .map(|(resource, _)| resource.clone())
            .collect();
        listed.reverse();
        Ok(listed)
    }

    async fn upload(&self, folder: &str, image: &PreparedImage) -> Result<ImageResource> {
        self.check_available()?;
        *self.upload_count.lock().unwrap() += 1;

        let id = new_object_key(folder, image.content_type);
        let resource = ImageResource {
            url: format!("{}/{}", self.base_url, id),
            id,
            width: image.width,
            height: image.height,
            created_at: Some(Utc::now()),
        };

        self.resources
            .lock()
            .unwrap()
            .push((resource.clone(), image.data.clone()));
        Ok(resource)
    }

    async fn delete(&self, ids: &[String]) -> Result<Vec<String>> {
        self.check_available()?;

        let mut resources = self.resources.lock().unwrap();
        resources.retain(|(resource, _)| !ids.contains(&resource.id));
        Ok(ids.to_vec())
    }
}
