//! # undoc
//!
//! Best-effort document text extraction for Rust.
//!
//! This library ingests an uploaded document — PDF, DOCX, plain text, or
//! image — and produces the best achievable plain-text reconstruction plus
//! structural metadata (pages, columns, headings, tables) for a downstream
//! text-analysis consumer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use undoc::{ExtractOptions, Pipeline, PipelineServices, RawDocument};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> undoc::Result<()> {
//!     let doc = RawDocument::from_file("document.pdf")?;
//!     let pipeline = Pipeline::new(PipelineServices::headless());
//!     let result = pipeline.extract(&doc, &ExtractOptions::default()).await?;
//!
//!     println!("extractor: {}", result.meta.extractor);
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Strategy order
//!
//! - **PDF**: structural content-stream extraction, then a remote
//!   extraction service (when configured), then full-document OCR. An
//!   accepted structural result still gets a per-page adaptive OCR patch
//!   for individual weak pages.
//! - **DOCX / text**: single-strategy, with a synthetic layout so all
//!   formats share one page shape.
//! - **Image**: straight to OCR.
//!
//! Every stage records its outcome in an ordered diagnostics trace shipped
//! with the result; the caller always receives a structurally valid
//! [`ExtractionResult`], even for unreadable documents.

pub mod cache;
pub mod cloud;
pub mod detect;
pub mod docx;
pub mod encoding;
pub mod error;
pub mod layout;
pub mod model;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod quality;
pub mod remote;
pub mod source;

// Re-export commonly used types
pub use cache::ArtifactCache;
pub use cloud::{CloudUploadOptions, NullObjectStore, ObjectStore};
pub use detect::{detect_kind, DocumentKind};
pub use encoding::{decode_text, DecodeConfig, DecodedText};
pub use error::{Error, Result};
pub use layout::{dominant_script, reconstruct_page, synthetic_layout, LayoutConfig};
pub use model::{
    page_tagged_text, BBox, Column, DocumentLayout, ExtractionMeta, ExtractionResult,
    LayoutSummary, Line, PageImage, PageLayout, TableCell, TableRegion, TextBlock, TraceBuilder,
    TraceEntry, TraceStatus,
};
pub use ocr::{
    NullOcrEngine, OcrEngine, OcrOptions, PageRenderer, RenderedPage, TesseractCliEngine,
    UnavailableRenderer,
};
pub use pdf::PdfExtractor;
pub use pipeline::{CancelFlag, ExtractOptions, Pipeline, PipelineConfig, PipelineServices};
pub use quality::{is_acceptable, page_score, QualityConfig};
pub use remote::{HttpRemoteExtractor, RemoteExtractor, RemoteResponse};
pub use source::{content_digest, RawDocument};

#[cfg(feature = "render-mupdf")]
pub use ocr::MupdfRenderer;

/// Extract a document from bytes using default services and options.
///
/// Convenience for one-off calls; construct a [`Pipeline`] once and reuse
/// it when processing many documents.
pub async fn extract_bytes(
    data: Vec<u8>,
    filename: Option<String>,
    mime: Option<String>,
) -> Result<ExtractionResult> {
    let doc = RawDocument::from_bytes(data, filename, mime)?;
    let pipeline = Pipeline::new(PipelineServices::headless());
    pipeline.extract(&doc, &ExtractOptions::default()).await
}

/// Extract a document from a file using default services and options.
pub async fn extract_file<P: AsRef<std::path::Path>>(path: P) -> Result<ExtractionResult> {
    let doc = RawDocument::from_file(path)?;
    let pipeline = Pipeline::new(PipelineServices::headless());
    pipeline.extract(&doc, &ExtractOptions::default()).await
}
