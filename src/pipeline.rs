//! Extraction orchestration.
//!
//! The pipeline runs strategies in priority order for each document kind,
//! accepts or rejects candidates through the quality assessor, and patches
//! individual low-quality pages with OCR. Stages execute strictly in
//! sequence for one document; every transition lands in the trace, and a
//! stage that produces nothing still advances the state machine with a
//! recorded reason. The caller always gets a structurally valid
//! [`ExtractionResult`] — only input acquisition can fail outright.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ArtifactCache;
use crate::cloud::{CloudUploadOptions, NullObjectStore, ObjectStore};
use crate::detect::{detect_kind, DocumentKind};
use crate::docx;
use crate::encoding::{decode_text, DecodeConfig};
use crate::error::Result;
use crate::layout::{self, LayoutConfig};
use crate::model::{
    DocumentLayout, ExtractionMeta, ExtractionResult, PageImage, TraceBuilder,
};
use crate::ocr::{NullOcrEngine, OcrEngine, OcrOptions, PageRenderer, UnavailableRenderer};
use crate::pdf::PdfExtractor;
use crate::quality::{self, QualityConfig};
use crate::remote::{HttpRemoteExtractor, RemoteExtractor};
use crate::source::{content_digest, RawDocument};

/// Tunable pipeline thresholds, with the layout/quality/decoder knobs
/// nested so one structure configures a whole run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Layout reconstruction thresholds.
    pub layout: LayoutConfig,
    /// Quality scoring weights and acceptance thresholds.
    pub quality: QualityConfig,
    /// Text decoder scoring weights.
    pub decode: DecodeConfig,
    /// Pages scoring below this are re-recognized by the adaptive patch.
    pub ocr_patch_threshold: f64,
    /// Full-document OCR yielding fewer usable characters than this is an
    /// unreadable document.
    pub min_ocr_text_len: usize,
    /// Render scale for OCR input rasters.
    pub ocr_render_scale: f32,
    /// Bound on rendering plus recognizing one page.
    pub ocr_page_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            quality: QualityConfig::default(),
            decode: DecodeConfig::default(),
            ocr_patch_threshold: 0.12,
            min_ocr_text_len: 40,
            ocr_render_scale: 2.0,
            ocr_page_timeout: Duration::from_secs(60),
        }
    }
}

/// Collaborating services, constructed once at application start and
/// injected into the pipeline. Keeps capability selection out of the
/// extraction code and makes every collaborator swappable in tests.
#[derive(Clone)]
pub struct PipelineServices {
    /// Page rasterization capability.
    pub renderer: Arc<dyn PageRenderer>,
    /// Recognition capability.
    pub ocr: Arc<dyn OcrEngine>,
    /// Remote extraction capability.
    pub remote: Arc<dyn RemoteExtractor>,
    /// Object storage for rendered page images.
    pub store: Arc<dyn ObjectStore>,
    /// Shared digest-keyed upload cache.
    pub cache: Arc<ArtifactCache>,
}

impl PipelineServices {
    /// Services for an environment without raster or OCR backends.
    pub fn headless() -> Self {
        Self {
            renderer: Arc::new(UnavailableRenderer),
            ocr: Arc::new(NullOcrEngine),
            remote: Arc::new(HttpRemoteExtractor::new()),
            store: Arc::new(NullObjectStore),
            cache: Arc::new(ArtifactCache::new()),
        }
    }

    /// Replace the renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the OCR engine.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    /// Replace the remote extractor.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteExtractor>) -> Self {
        self.remote = remote;
        self
    }

    /// Replace the object store.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = store;
        self
    }
}

/// Per-call options bag.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// OCR languages and page limit.
    pub ocr: OcrOptions,
    /// Remote extraction endpoint; fallback disabled when unset.
    pub remote_endpoint: Option<String>,
    /// Page-image upload configuration; uploads disabled when unset.
    pub cloud_upload: Option<CloudUploadOptions>,
}

/// Cooperative cancellation handle. Cancelling stops further page renders;
/// the trace accumulated so far survives intact and ships with the partial
/// result.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Fresh, uncancelled flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The extraction pipeline.
pub struct Pipeline {
    services: PipelineServices,
    config: PipelineConfig,
}

/// Text candidate produced by a strategy, kept around so a weak-but-nonempty
/// fallback can still win over "no text at all".
struct Candidate {
    extractor: String,
    pages: Vec<String>,
    used_ocr: bool,
}

impl Pipeline {
    /// Pipeline with default thresholds.
    pub fn new(services: PipelineServices) -> Self {
        Self::with_config(services, PipelineConfig::default())
    }

    /// Pipeline with custom thresholds.
    pub fn with_config(services: PipelineServices, config: PipelineConfig) -> Self {
        Self { services, config }
    }

    /// Extract a document.
    pub async fn extract(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
    ) -> Result<ExtractionResult> {
        self.extract_cancellable(doc, options, &CancelFlag::new())
            .await
    }

    /// Extract a document with cooperative cancellation.
    pub async fn extract_cancellable(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
        cancel: &CancelFlag,
    ) -> Result<ExtractionResult> {
        let mut trace = TraceBuilder::new();

        let kind = detect_kind(&doc.data, doc.mime.as_deref(), doc.filename.as_deref());
        trace.info(
            "detect",
            format!("kind: {}, {} bytes, digest {}", kind, doc.size(), &doc.digest[..12]),
        );
        log::debug!("extracting {} ({} bytes) as {}", &doc.digest[..12], doc.size(), kind);

        let result = match kind {
            DocumentKind::Pdf => self.extract_pdf(doc, options, cancel, &mut trace).await,
            DocumentKind::Docx => self.extract_docx(doc, &mut trace),
            DocumentKind::Text => self.extract_plain_text(doc, &mut trace),
            DocumentKind::Image => self.extract_image(doc, options, &mut trace).await,
            DocumentKind::Binary => {
                trace.warn("detect", "unsupported binary payload, nothing to extract");
                let meta = ExtractionMeta::new("binary", kind, &doc.digest);
                ExtractionResult::empty(meta)
            }
        };

        let mut result = result;
        result.meta.kind = kind;
        result.meta.trace = trace.finish();
        Ok(result)
    }

    // ---- PDF path --------------------------------------------------------

    async fn extract_pdf(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
        cancel: &CancelFlag,
        trace: &mut TraceBuilder,
    ) -> ExtractionResult {
        // Structural pass.
        let (structural_pages, layout_doc) = match PdfExtractor::from_bytes(&doc.data) {
            Ok(extractor) => {
                let (pdf_pages, delta) = extractor.extract_pages();
                trace.extend(delta);
                let layouts: Vec<_> = pdf_pages
                    .into_iter()
                    .map(|p| {
                        layout::reconstruct_page(
                            p.number,
                            p.width,
                            p.height,
                            p.blocks,
                            &self.config.layout,
                        )
                    })
                    .collect();
                let pages: Vec<String> = layouts.iter().map(|l| l.text()).collect();
                trace.info(
                    "pdf-text",
                    format!(
                        "{} pages, {} blocks",
                        layouts.len(),
                        layouts.iter().map(|l| l.blocks.len()).sum::<usize>()
                    ),
                );
                (pages, Some(DocumentLayout::from_pages(layouts)))
            }
            Err(e) => {
                trace.error("pdf-text", format!("document parse failed: {}", e));
                (Vec::new(), None)
            }
        };

        let structural_text = structural_pages.join("\n\n");
        let structural_ok = quality::is_acceptable(&structural_text, &self.config.quality);
        trace.info(
            "quality",
            format!(
                "structural score {:.2}, {}",
                quality::mean_score(&structural_pages, &self.config.quality),
                if structural_ok { "accepted" } else { "below threshold" }
            ),
        );

        if structural_ok {
            let mut result = self.finish(
                Candidate {
                    extractor: "pdf-text".to_string(),
                    pages: structural_pages,
                    used_ocr: false,
                },
                layout_doc,
                doc,
            );
            self.adaptive_patch(doc, options, cancel, &mut result, trace).await;
            self.upload_page_images(doc, options, cancel, &mut result, trace).await;
            return result;
        }

        // Remote fallback.
        let mut remote_candidate: Option<Candidate> = None;
        if let Some(endpoint) = &options.remote_endpoint {
            let filename = doc.filename.as_deref().unwrap_or("document.pdf");
            match self
                .services
                .remote
                .extract(endpoint, filename, &doc.data)
                .await
            {
                Ok(response) if !response.text.trim().is_empty() => {
                    let extractor = response
                        .meta
                        .as_ref()
                        .and_then(|m| m.extractor.clone())
                        .unwrap_or_else(|| "pdf-remote".to_string());
                    let pages = response
                        .meta
                        .and_then(|m| m.pages)
                        .filter(|p| !p.is_empty())
                        .unwrap_or_else(|| vec![response.text.clone()]);
                    trace.info(
                        "pdf-remote",
                        format!("{} pages from remote service ({})", pages.len(), extractor),
                    );
                    let candidate = Candidate {
                        extractor,
                        pages,
                        used_ocr: false,
                    };
                    if quality::is_acceptable(&response.text, &self.config.quality) {
                        trace.info("quality", "remote result accepted");
                        return self.finish(candidate, None, doc);
                    }
                    trace.warn("quality", "remote result below threshold, trying OCR");
                    remote_candidate = Some(candidate);
                }
                Ok(_) => trace.warn("pdf-remote", "remote service returned empty text"),
                Err(e) => trace.warn("pdf-remote", format!("fallback unavailable: {}", e)),
            }
        } else {
            trace.info("pdf-remote", "no endpoint configured, skipped");
        }

        // Full-document OCR.
        let page_count = layout_doc
            .as_ref()
            .map(|l| l.summary.page_count as usize)
            .unwrap_or(options.ocr.page_limit);
        if let Some(ocr_pages) = self
            .ocr_document(doc, options, cancel, page_count, trace)
            .await
        {
            let usable: usize = ocr_pages
                .iter()
                .map(|p| quality::collapse_whitespace(p).chars().count())
                .sum();
            if usable >= self.config.min_ocr_text_len {
                trace.info("pdf-ocr", format!("{} usable characters", usable));
                return self.finish(
                    Candidate {
                        extractor: "pdf-ocr".to_string(),
                        pages: ocr_pages,
                        used_ocr: true,
                    },
                    layout_doc.clone(),
                    doc,
                );
            }
            trace.warn(
                "pdf-ocr",
                format!("only {} usable characters, below minimum", usable),
            );
        }

        // Exhausted. Keep whatever text a strategy managed to produce.
        if let Some(candidate) = remote_candidate {
            trace.warn("pipeline", "accepting degraded remote result over empty output");
            return self.finish(candidate, None, doc);
        }
        if !structural_text.trim().is_empty() {
            trace.warn("pipeline", "accepting degraded structural result over empty output");
            return self.finish(
                Candidate {
                    extractor: "pdf-text".to_string(),
                    pages: structural_pages,
                    used_ocr: false,
                },
                layout_doc,
                doc,
            );
        }

        trace.warn("pipeline", "all strategies exhausted, document is unreadable");
        ExtractionResult::empty(ExtractionMeta::new("pdf-unreadable", DocumentKind::Pdf, &doc.digest))
    }

    /// Render and recognize up to the page limit. `None` means the strategy
    /// was unavailable or produced nothing.
    async fn ocr_document(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
        cancel: &CancelFlag,
        page_count: usize,
        trace: &mut TraceBuilder,
    ) -> Option<Vec<String>> {
        if !self.services.renderer.is_available() {
            trace.warn("pdf-ocr", "renderer unavailable, strategy skipped");
            return None;
        }
        if !self.services.ocr.is_available().await {
            trace.warn("pdf-ocr", "OCR engine unavailable, strategy skipped");
            return None;
        }

        let limit = page_count.min(options.ocr.page_limit).max(1);
        let mut pages = Vec::with_capacity(limit);
        for page_num in 1..=limit as u32 {
            if cancel.is_cancelled() {
                trace.warn("cancelled", format!("stopping before page {}", page_num));
                break;
            }
            let text = self.ocr_one_page(doc, options, page_num).await;
            match text {
                Ok(text) => pages.push(text),
                Err(e) => {
                    trace.warn("pdf-ocr", format!("page {} degraded: {}", page_num, e));
                    pages.push(String::new());
                }
            }
        }

        if pages.iter().all(|p| p.trim().is_empty()) {
            None
        } else {
            Some(pages)
        }
    }

    /// Render one page and recognize it under the page timeout. The
    /// rendered raster is dropped before this returns, on every path.
    async fn ocr_one_page(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
        page_num: u32,
    ) -> Result<String> {
        let work = async {
            let rendered = self
                .services
                .renderer
                .render_page(&doc.data, page_num, self.config.ocr_render_scale)
                .await?;
            self.services
                .ocr
                .recognize(&rendered.png, &options.ocr.languages)
                .await
        };
        match tokio::time::timeout(self.config.ocr_page_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(crate::error::Error::Ocr(format!(
                "page {} timed out",
                page_num
            ))),
        }
    }

    /// Re-recognize only the pages scoring below the patch threshold and
    /// splice the recognized text back in. Never shrinks the page array and
    /// never touches a page that already met the threshold.
    async fn adaptive_patch(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
        cancel: &CancelFlag,
        result: &mut ExtractionResult,
        trace: &mut TraceBuilder,
    ) {
        let page_count = result
            .layout
            .as_ref()
            .map(|l| l.summary.page_count as usize)
            .unwrap_or(result.pages.len());

        let mut weak: Vec<usize> = Vec::new();
        for index in 0..page_count.max(result.pages.len()) {
            let score = result
                .pages
                .get(index)
                .map(|p| quality::page_score(p, &self.config.quality))
                .unwrap_or(0.0);
            if score < self.config.ocr_patch_threshold {
                weak.push(index);
            }
        }

        if weak.is_empty() {
            return;
        }
        if !self.services.renderer.is_available() || !self.services.ocr.is_available().await {
            trace.warn(
                "adaptive-ocr",
                format!("{} weak pages but no OCR capability, skipped", weak.len()),
            );
            return;
        }

        let mut patched: Vec<u32> = Vec::new();
        for index in weak {
            if cancel.is_cancelled() {
                trace.warn("cancelled", "stopping adaptive patch");
                break;
            }
            let page_num = index as u32 + 1;
            match self.ocr_one_page(doc, options, page_num).await {
                Ok(text) if !text.trim().is_empty() => {
                    if result.pages.len() <= index {
                        result.pages.resize(index + 1, String::new());
                    }
                    result.pages[index] = text;
                    patched.push(page_num);
                }
                Ok(_) => {
                    log::debug!("adaptive patch: page {} recognized empty", page_num);
                }
                Err(e) => {
                    trace.warn("adaptive-ocr", format!("page {} degraded: {}", page_num, e));
                }
            }
        }

        if !patched.is_empty() {
            trace.info("adaptive-ocr", format!("patched pages {:?}", patched));
            result.meta.used_ocr = true;
            result.meta.ocr_patched_pages = patched;
            result.text = result.pages.join("\n\n").trim().to_string();
            result.page_tagged_text = crate::model::page_tagged_text(&result.pages);
            result.meta.quality = quality::mean_score(&result.pages, &self.config.quality);
        }
    }

    /// Upload rendered page images to object storage, deduplicating through
    /// the digest-keyed cache.
    async fn upload_page_images(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
        cancel: &CancelFlag,
        result: &mut ExtractionResult,
        trace: &mut TraceBuilder,
    ) {
        let Some(cloud) = &options.cloud_upload else {
            return;
        };
        if !self.services.renderer.is_available() {
            trace.warn("cloud", "renderer unavailable, page images skipped");
            return;
        }

        let page_count = result.pages.len().min(options.ocr.page_limit);
        let mut images = Vec::new();
        for page_num in 1..=page_count as u32 {
            if cancel.is_cancelled() {
                trace.warn("cancelled", "stopping page image upload");
                break;
            }
            let rendered = match self
                .services
                .renderer
                .render_page(&doc.data, page_num, cloud.image_scale)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    trace.warn("cloud", format!("page {} render failed: {}", page_num, e));
                    continue;
                }
            };

            let digest = content_digest(&rendered.png);
            let url = if let Some(cached) = self.services.cache.get(&digest) {
                Some(cached)
            } else {
                let key = format!("{}/{}-p{}.png", cloud.prefix, doc.digest, page_num);
                let uploaded = self.services.store.put(&key, &rendered.png, "image/png").await;
                if let Some(url) = &uploaded {
                    self.services.cache.insert(&digest, url);
                }
                uploaded
            };

            if let Some(url) = url {
                images.push(PageImage {
                    page: page_num,
                    url,
                    width: rendered.width,
                    height: rendered.height,
                });
            }
        }

        if !images.is_empty() {
            trace.info("cloud", format!("uploaded {} page images", images.len()));
            result.meta.page_images = Some(images);
        }
    }

    // ---- DOCX path -------------------------------------------------------

    fn extract_docx(&self, doc: &RawDocument, trace: &mut TraceBuilder) -> ExtractionResult {
        match docx::extract_paragraphs(&doc.data) {
            Ok(paragraphs) if !paragraphs.is_empty() => {
                trace.info("docx", format!("{} paragraphs", paragraphs.len()));
                let text = paragraphs.join("\n");
                let layout = layout::synthetic_layout(1, &text, &self.config.layout);
                self.finish(
                    Candidate {
                        extractor: "docx".to_string(),
                        pages: vec![text],
                        used_ocr: false,
                    },
                    Some(DocumentLayout::from_pages(vec![layout])),
                    doc,
                )
            }
            Ok(_) => {
                trace.warn("docx", "document contains no non-empty paragraphs");
                ExtractionResult::empty(ExtractionMeta::new("docx", DocumentKind::Docx, &doc.digest))
            }
            Err(e) => {
                trace.error("docx", format!("extraction failed: {}", e));
                ExtractionResult::empty(ExtractionMeta::new("docx", DocumentKind::Docx, &doc.digest))
            }
        }
    }

    // ---- plain text path -------------------------------------------------

    fn extract_plain_text(&self, doc: &RawDocument, trace: &mut TraceBuilder) -> ExtractionResult {
        let decoded = decode_text(&doc.data, &self.config.decode);
        trace.info("decode", format!("encoding: {}", decoded.encoding));

        if decoded.text.trim().is_empty() {
            trace.warn("text", "decoded to empty text");
            return ExtractionResult::empty(ExtractionMeta::new(
                "text",
                DocumentKind::Text,
                &doc.digest,
            ));
        }

        let layout = layout::synthetic_layout(1, &decoded.text, &self.config.layout);
        self.finish(
            Candidate {
                extractor: "text".to_string(),
                pages: vec![decoded.text],
                used_ocr: false,
            },
            Some(DocumentLayout::from_pages(vec![layout])),
            doc,
        )
    }

    // ---- image path ------------------------------------------------------

    async fn extract_image(
        &self,
        doc: &RawDocument,
        options: &ExtractOptions,
        trace: &mut TraceBuilder,
    ) -> ExtractionResult {
        if !self.services.ocr.is_available().await {
            trace.warn("image-ocr", "OCR engine unavailable, strategy skipped");
            return ExtractionResult::empty(ExtractionMeta::new(
                "image-ocr",
                DocumentKind::Image,
                &doc.digest,
            ));
        }

        // Normalize to PNG so the engine sees one input format.
        let png = match image::load_from_memory(&doc.data) {
            Ok(img) => {
                let mut buf = Vec::new();
                match img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png) {
                    Ok(()) => buf,
                    Err(e) => {
                        trace.error("image-ocr", format!("re-encode failed: {}", e));
                        return ExtractionResult::empty(ExtractionMeta::new(
                            "image-ocr",
                            DocumentKind::Image,
                            &doc.digest,
                        ));
                    }
                }
            }
            Err(e) => {
                trace.error("image-ocr", format!("undecodable image: {}", e));
                return ExtractionResult::empty(ExtractionMeta::new(
                    "image-ocr",
                    DocumentKind::Image,
                    &doc.digest,
                ));
            }
        };

        let work = self.services.ocr.recognize(&png, &options.ocr.languages);
        let text = match tokio::time::timeout(self.config.ocr_page_timeout, work).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                trace.warn("image-ocr", format!("recognition degraded: {}", e));
                String::new()
            }
            Err(_) => {
                trace.warn("image-ocr", "recognition timed out");
                String::new()
            }
        };

        if text.trim().is_empty() {
            trace.warn("image-ocr", "no text recognized");
            return ExtractionResult::empty(ExtractionMeta::new(
                "image-ocr",
                DocumentKind::Image,
                &doc.digest,
            ));
        }

        trace.info("image-ocr", format!("{} characters recognized", text.len()));
        self.finish(
            Candidate {
                extractor: "image-ocr".to_string(),
                pages: vec![text],
                used_ocr: true,
            },
            None,
            doc,
        )
    }

    // ---- shared ----------------------------------------------------------

    /// Assemble the final result from an accepted candidate.
    fn finish(
        &self,
        candidate: Candidate,
        layout: Option<DocumentLayout>,
        doc: &RawDocument,
    ) -> ExtractionResult {
        let mut meta = ExtractionMeta::new(
            candidate.extractor,
            DocumentKind::Binary, // overwritten by the caller with the real kind
            &doc.digest,
        );
        meta.used_ocr = candidate.used_ocr;
        meta.quality = quality::mean_score(&candidate.pages, &self.config.quality);
        ExtractionResult::from_pages(candidate.pages, layout, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineServices::headless())
    }

    fn raw(data: &[u8], filename: &str, mime: &str) -> RawDocument {
        RawDocument::from_bytes(
            data.to_vec(),
            Some(filename.to_string()),
            Some(mime.to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_binary_input_yields_valid_empty_result() {
        let doc = raw(&[0x00, 0x01, 0x02], "blob.bin", "application/octet-stream");
        let result = pipeline()
            .extract(&doc, &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(result.meta.extractor, "binary");
        assert!(result.text.is_empty());
        assert!(!result.meta.trace.is_empty());
        assert_eq!(result.meta.kind, DocumentKind::Binary);
    }

    #[tokio::test]
    async fn test_plain_text_path() {
        let body = "TITLE LINE\nThis is a plain text document with enough words to pass the \
                    quality assessor comfortably, including digits 123 and 456 and plenty of \
                    distinct characters so the score clears every bar with room to spare.";
        let doc = raw(body.as_bytes(), "notes.txt", "text/plain");
        let result = pipeline()
            .extract(&doc, &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(result.meta.extractor, "text");
        assert_eq!(result.pages.len(), 1);
        assert!(!result.meta.used_ocr);
        let layout = result.layout.unwrap();
        assert_eq!(layout.summary.page_count, 1);
        assert!(layout.pages[0].headings.contains(&"TITLE LINE".to_string()));
    }

    #[tokio::test]
    async fn test_windows_1251_text_decoded() {
        // "Привет мир" repeated, in Windows-1251.
        let mut data = Vec::new();
        for _ in 0..12 {
            data.extend_from_slice(&[
                0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2, 0x20, 0xEC, 0xE8, 0xF0, 0x20,
            ]);
        }
        let doc = raw(&data, "cyr.txt", "text/plain");
        let result = pipeline()
            .extract(&doc, &ExtractOptions::default())
            .await
            .unwrap();
        assert!(result.text.contains("Привет мир"));
        assert!(!result.text.contains('\u{FFFD}'));
        let decode_entry = result
            .meta
            .trace
            .iter()
            .find(|e| e.stage == "decode")
            .unwrap();
        assert!(decode_entry.detail.contains("windows-1251"));
    }

    #[tokio::test]
    async fn test_page_tagged_text_always_derived() {
        let doc = raw(b"short but extractable body text with digits 12345 and some more filler words to pass acceptance thresholds easily and cleanly", "a.txt", "text/plain");
        let result = pipeline()
            .extract(&doc, &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(
            result.page_tagged_text,
            crate::model::page_tagged_text(&result.pages)
        );
    }

    #[tokio::test]
    async fn test_image_without_ocr_capability() {
        // 1x1 PNG.
        let png: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9C, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ];
        let doc = raw(png, "scan.png", "image/png");
        let result = pipeline()
            .extract(&doc, &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(result.meta.extractor, "image-ocr");
        assert!(result.text.is_empty());
        assert!(result
            .meta
            .trace
            .iter()
            .any(|e| e.stage == "image-ocr" && e.detail.contains("unavailable")));
    }

    #[tokio::test]
    async fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[tokio::test]
    async fn test_docx_garbage_degrades_to_empty() {
        // ZIP magic but not a real archive.
        let doc = raw(b"PK\x03\x04garbage-follows", "broken.docx", "application/docx");
        let result = pipeline()
            .extract(&doc, &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(result.meta.extractor, "docx");
        assert!(result.text.is_empty());
        assert!(result
            .meta
            .trace
            .iter()
            .any(|e| e.stage == "docx" && matches!(e.status, crate::model::TraceStatus::Error)));
    }
}
