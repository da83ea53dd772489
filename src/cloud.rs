//! Object-storage boundary.
//!
//! The pipeline only needs "given bytes, get back a URL or nothing" to
//! publish rendered page images. The actual provider lives outside the
//! crate; callers inject an implementation through [`crate::PipelineServices`].

use async_trait::async_trait;

/// Cloud upload configuration from the caller's options bag.
#[derive(Debug, Clone)]
pub struct CloudUploadOptions {
    /// Key prefix (bucket path, folder) for uploaded page images.
    pub prefix: String,
    /// Render scale for uploaded page images.
    pub image_scale: f32,
}

impl Default for CloudUploadOptions {
    fn default() -> Self {
        Self {
            prefix: "pages".to_string(),
            image_scale: 2.0,
        }
    }
}

/// Minimal object-storage capability.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return a retrievable URL, or `None`
    /// when the store declined (quota, outage, misconfiguration).
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Option<String>;
}

/// Store for deployments without object storage; uploads never happen.
#[derive(Debug, Clone, Default)]
pub struct NullObjectStore;

#[async_trait]
impl ObjectStore for NullObjectStore {
    async fn put(&self, _key: &str, _data: &[u8], _content_type: &str) -> Option<String> {
        None
    }
}
