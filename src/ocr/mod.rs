//! Optical character recognition.
//!
//! The recognition engine is a capability injected at startup, like the
//! page renderer. The stock implementation shells out to the `tesseract`
//! binary through a scoped temp directory; environments without the binary
//! report unavailability and the pipeline skips OCR strategies gracefully.

mod render;

pub use render::{PageRenderer, RenderedPage, UnavailableRenderer};

#[cfg(feature = "render-mupdf")]
pub use render::MupdfRenderer;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// OCR options from the caller's options bag.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Recognition languages, tesseract-style codes joined with `+`.
    pub languages: Vec<String>,
    /// Maximum number of pages to render for full-document OCR.
    pub page_limit: usize,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            languages: vec!["eng".to_string(), "rus".to_string()],
            page_limit: 20,
        }
    }
}

/// Capability of recognizing text in a raster image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Whether recognition can run in this environment.
    async fn is_available(&self) -> bool;

    /// Recognize text in a PNG image.
    async fn recognize(&self, image_png: &[u8], languages: &[String]) -> Result<String>;
}

/// Engine that shells out to the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractCliEngine {
    binary: String,
}

impl TesseractCliEngine {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }

    /// Use a specific tesseract binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractCliEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrEngine for TesseractCliEngine {
    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image_png: &[u8], languages: &[String]) -> Result<String> {
        // Scratch files live in a scoped temp dir that cleans up on every
        // exit path, including recognition failure.
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("page.png");
        let output_base = dir.path().join("out");

        tokio::fs::write(&input, image_png).await?;

        let lang = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        let output = Command::new(&self.binary)
            .arg(&input)
            .arg(&output_base)
            .arg("-l")
            .arg(&lang)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3")
            .output()
            .await
            .map_err(|e| Error::Ocr(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!("tesseract failed: {}", stderr.trim())));
        }

        let text_path = output_base.with_extension("txt");
        let text = tokio::fs::read_to_string(&text_path)
            .await
            .map_err(|e| Error::Ocr(format!("missing tesseract output: {}", e)))?;

        Ok(text.trim().to_string())
    }
}

/// Engine for environments without any recognition capability.
#[derive(Debug, Clone, Default)]
pub struct NullOcrEngine;

#[async_trait]
impl OcrEngine for NullOcrEngine {
    async fn is_available(&self) -> bool {
        false
    }

    async fn recognize(&self, _image_png: &[u8], _languages: &[String]) -> Result<String> {
        Err(Error::Unavailable("no OCR engine".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_engine_unavailable() {
        let engine = NullOcrEngine;
        assert!(!engine.is_available().await);
        let result = engine.recognize(b"png", &["eng".to_string()]).await;
        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_unavailable() {
        let engine = TesseractCliEngine::with_binary("definitely-not-a-real-binary");
        assert!(!engine.is_available().await);
    }

    #[test]
    fn test_default_options() {
        let options = OcrOptions::default();
        assert_eq!(options.languages, vec!["eng", "rus"]);
        assert_eq!(options.page_limit, 20);
    }
}
