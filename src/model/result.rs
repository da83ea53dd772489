//! Final pipeline output.

use serde::{Deserialize, Serialize};

use super::{DocumentLayout, TraceEntry};
use crate::detect::DocumentKind;

/// Everything the pipeline produced for one document. Constructed once and
/// returned to the caller; immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Full document text.
    pub text: String,

    /// Per-page text, `pages.len()` equals the page count when known.
    pub pages: Vec<String>,

    /// `pages` joined with per-page tags. Always derived from `pages` via
    /// [`page_tagged_text`], never stored independently.
    pub page_tagged_text: String,

    /// Structural layout, when a structural pass ran.
    pub layout: Option<DocumentLayout>,

    /// Extraction metadata and diagnostics.
    pub meta: ExtractionMeta,
}

impl ExtractionResult {
    /// Build a result, deriving `text` and `page_tagged_text` from `pages`.
    pub fn from_pages(pages: Vec<String>, layout: Option<DocumentLayout>, meta: ExtractionMeta) -> Self {
        let text = pages.join("\n\n").trim().to_string();
        let page_tagged_text = page_tagged_text(&pages);
        Self {
            text,
            pages,
            page_tagged_text,
            layout,
            meta,
        }
    }

    /// A structurally valid empty result for unreadable documents.
    pub fn empty(meta: ExtractionMeta) -> Self {
        Self {
            text: String::new(),
            pages: Vec::new(),
            page_tagged_text: String::new(),
            layout: None,
            meta,
        }
    }
}

/// Metadata attached to an [`ExtractionResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMeta {
    /// Strategy that produced the accepted text (e.g. `"pdf-text"`,
    /// `"pdf-ocr"`, `"docx"`).
    pub extractor: String,

    /// Whether OCR contributed any of the text.
    pub used_ocr: bool,

    /// Mean per-page quality score of the accepted text.
    pub quality: f64,

    /// Detected document kind.
    pub kind: DocumentKind,

    /// SHA-256 content digest of the input.
    pub digest: String,

    /// 1-indexed pages whose text was replaced by the adaptive OCR patch.
    pub ocr_patched_pages: Vec<u32>,

    /// Uploaded page images, when cloud upload was configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_images: Option<Vec<PageImage>>,

    /// Ordered diagnostics log.
    pub trace: Vec<TraceEntry>,
}

impl ExtractionMeta {
    /// Metadata with the given strategy tag and empty diagnostics.
    pub fn new(extractor: impl Into<String>, kind: DocumentKind, digest: impl Into<String>) -> Self {
        Self {
            extractor: extractor.into(),
            used_ocr: false,
            quality: 0.0,
            kind,
            digest: digest.into(),
            ocr_patched_pages: Vec::new(),
            page_images: None,
            trace: Vec::new(),
        }
    }
}

/// A rendered page image pushed to object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page: u32,
    /// Retrievable URL.
    pub url: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Canonical page-tagged join of per-page texts. This is the only place the
/// tag format lives; everything that needs tagged text derives it from the
/// page array through this function.
pub fn page_tagged_text(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[page {}]\n{}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
