//! Remote extraction fallback.
//!
//! When local strategies come up empty, the pipeline can delegate to an
//! external extraction service: one HTTP endpoint taking a multipart file
//! upload and answering `{ text, meta? }`. Anything that goes wrong here —
//! non-2xx status, timeout, malformed body — means "fallback unavailable",
//! never a hard error; the orchestrator records it and moves on.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default bound on one remote extraction call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Response shape of the remote extraction service.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteResponse {
    /// Extracted document text.
    pub text: String,
    /// Optional extras the service may supply.
    #[serde(default)]
    pub meta: Option<RemoteMeta>,
}

/// Optional metadata in a remote response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteMeta {
    /// Per-page text, when the service segments pages.
    #[serde(default)]
    pub pages: Option<Vec<String>>,
    /// Name of the extractor the service used.
    #[serde(default)]
    pub extractor: Option<String>,
}

/// Remote extraction capability, behind a trait so tests inject fakes.
#[async_trait]
pub trait RemoteExtractor: Send + Sync {
    /// Upload `data` to `endpoint` and return the service's extraction.
    async fn extract(&self, endpoint: &str, filename: &str, data: &[u8])
        -> Result<RemoteResponse>;
}

/// reqwest-backed remote extractor with a bounded per-call timeout.
pub struct HttpRemoteExtractor {
    client: reqwest::Client,
}

impl HttpRemoteExtractor {
    /// Extractor with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REMOTE_TIMEOUT)
    }

    /// Extractor with a custom per-call timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with static config");
        Self { client }
    }
}

impl Default for HttpRemoteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteExtractor for HttpRemoteExtractor {
    async fn extract(
        &self,
        endpoint: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<RemoteResponse> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| Error::Remote(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.client.post(endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Remote(format!("endpoint returned {}", status)));
        }

        response
            .json::<RemoteResponse>()
            .await
            .map_err(|e| Error::Remote(format!("malformed response: {}", e)))
    }
}
