//! End-to-end pipeline scenarios with fake collaborators.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, Stream};

use undoc::{
    CancelFlag, DocumentKind, Error, ExtractOptions, OcrEngine, PageRenderer, Pipeline,
    PipelineServices, RawDocument, RemoteExtractor, RemoteResponse, RenderedPage, Result,
};

// ---- fake collaborators ----------------------------------------------------

/// Renderer that hands back a tiny raster for any page.
struct FakeRenderer;

#[async_trait]
impl PageRenderer for FakeRenderer {
    fn is_available(&self) -> bool {
        true
    }

    async fn render_page(&self, _pdf: &[u8], page: u32, _scale: f32) -> Result<RenderedPage> {
        Ok(RenderedPage {
            png: format!("raster-for-page-{}", page).into_bytes(),
            width: 850,
            height: 1100,
        })
    }
}

/// OCR engine that returns a fixed text and counts invocations.
struct FakeOcr {
    text: String,
    calls: AtomicUsize,
}

impl FakeOcr {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, _image_png: &[u8], _languages: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Remote service double.
struct FakeRemote {
    text: String,
    extractor: Option<String>,
    fail: bool,
}

#[async_trait]
impl RemoteExtractor for FakeRemote {
    async fn extract(
        &self,
        _endpoint: &str,
        _filename: &str,
        _data: &[u8],
    ) -> Result<RemoteResponse> {
        if self.fail {
            return Err(Error::Remote("service down".to_string()));
        }
        let json = match &self.extractor {
            Some(name) => format!(r#"{{"text":{:?},"meta":{{"extractor":{:?}}}}}"#, self.text, name),
            None => format!(r#"{{"text":{:?}}}"#, self.text),
        };
        Ok(serde_json::from_str(&json).unwrap())
    }
}

/// Object store that accepts every upload and echoes the key as a URL.
struct FakeStore {
    uploads: AtomicUsize,
}

#[async_trait]
impl undoc::ObjectStore for FakeStore {
    async fn put(&self, key: &str, _data: &[u8], _content_type: &str) -> Option<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Some(format!("https://cdn.example/{}", key))
    }
}

// ---- document builders -----------------------------------------------------

/// Build a PDF where each page shows the given lines of embedded text.
fn text_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_lines in pages {
        let mut ops = Vec::new();
        for (i, line) in page_lines.iter().enumerate() {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            ops.push(Operation::new(
                "Td",
                vec![72.into(), (720 - 20 * i as i64).into()],
            ));
            ops.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            ops.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize pdf");
    buf
}

const CLEAN_LINES: &[&str] = &[
    "Annual maintenance report for the riverside facility",
    "The inspection covered 42 pumps and 17 control valves in total.",
    "No structural defects were observed during the first phase.",
    "Operating pressure stayed within the 120 to 140 range all week.",
    "Follow-up measurements are scheduled for the coming quarter.",
];

/// Build a DOCX whose body contains the given paragraphs.
fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>{}</w:body>
</w:document>"#,
        body
    );

    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

fn pdf_doc(data: Vec<u8>) -> RawDocument {
    RawDocument::from_bytes(data, Some("report.pdf".into()), Some("application/pdf".into()))
        .unwrap()
}

// ---- scenarios -------------------------------------------------------------

#[tokio::test]
async fn clean_pdf_uses_structural_pass() {
    // Three pages of clean embedded text: the structural extractor wins and
    // OCR never runs.
    let data = text_pdf(&[CLEAN_LINES, CLEAN_LINES, CLEAN_LINES]);
    let ocr = FakeOcr::new("should never be called");
    let services = PipelineServices::headless()
        .with_renderer(Arc::new(FakeRenderer))
        .with_ocr(ocr.clone());
    let pipeline = Pipeline::new(services);

    let result = pipeline
        .extract(&pdf_doc(data), &ExtractOptions::default())
        .await
        .unwrap();

    assert_eq!(result.meta.extractor, "pdf-text");
    assert!(!result.meta.used_ocr);
    assert_eq!(result.pages.len(), 3);
    assert!(result.meta.ocr_patched_pages.is_empty());
    assert_eq!(ocr.call_count(), 0);
    assert!(result.text.contains("riverside facility"));

    let layout = result.layout.as_ref().unwrap();
    assert_eq!(layout.summary.page_count, 3);
    assert!(layout.pages.iter().all(|p| !p.lines.is_empty()));
}

#[tokio::test]
async fn scanned_pdf_falls_through_to_ocr() {
    // Pages with no extractable text layer and no remote endpoint: the
    // pipeline ends up in full-document OCR.
    let data = text_pdf(&[&[], &[]]);
    let recognized = "Recognized text from the scanned page, long enough to count.";
    let ocr = FakeOcr::new(recognized);
    let services = PipelineServices::headless()
        .with_renderer(Arc::new(FakeRenderer))
        .with_ocr(ocr.clone());
    let pipeline = Pipeline::new(services);

    let result = pipeline
        .extract(&pdf_doc(data), &ExtractOptions::default())
        .await
        .unwrap();

    assert_eq!(result.meta.extractor, "pdf-ocr");
    assert!(result.meta.used_ocr);
    assert_eq!(ocr.call_count(), 2);
    assert!(result.text.contains("Recognized text"));
}

#[tokio::test]
async fn weak_page_gets_adaptive_patch() {
    // Pages 1-4 carry clean text, page 5 is effectively blank. The document
    // is accepted structurally and only page 5 is re-recognized.
    let data = text_pdf(&[CLEAN_LINES, CLEAN_LINES, CLEAN_LINES, CLEAN_LINES, &[]]);
    let ocr = FakeOcr::new("Patched content recovered from the scanned fifth page.");
    let services = PipelineServices::headless()
        .with_renderer(Arc::new(FakeRenderer))
        .with_ocr(ocr.clone());
    let pipeline = Pipeline::new(services);

    let result = pipeline
        .extract(&pdf_doc(data), &ExtractOptions::default())
        .await
        .unwrap();

    assert_eq!(result.meta.extractor, "pdf-text");
    assert!(result.meta.used_ocr);
    assert_eq!(result.meta.ocr_patched_pages, vec![5]);
    assert_eq!(result.pages.len(), 5);
    assert!(result.pages[4].contains("Patched content"));
    // Clean pages untouched.
    assert!(result.pages[0].contains("riverside facility"));
    assert_eq!(ocr.call_count(), 1);
    // The tagged text is re-derived from the patched pages.
    assert_eq!(
        result.page_tagged_text,
        undoc::page_tagged_text(&result.pages)
    );
}

#[tokio::test]
async fn adaptive_patch_never_reduces_page_count() {
    let data = text_pdf(&[CLEAN_LINES, &[], CLEAN_LINES]);
    let ocr = FakeOcr::new("middle page text recovered by recognition");
    let services = PipelineServices::headless()
        .with_renderer(Arc::new(FakeRenderer))
        .with_ocr(ocr);
    let pipeline = Pipeline::new(services);

    let result = pipeline
        .extract(&pdf_doc(data), &ExtractOptions::default())
        .await
        .unwrap();

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.meta.ocr_patched_pages, vec![2]);
}

#[tokio::test]
async fn remote_fallback_accepts_good_service_result() {
    // Structural pass finds nothing; the configured remote service returns
    // acceptable text and its extractor tag is surfaced.
    let data = text_pdf(&[&[]]);
    let remote_text = "The remote extraction service produced this long and perfectly \
                       readable paragraph with digits 2024 and plenty of variety in it, \
                       continuing for well over two hundred characters so that the plain \
                       length clause of the acceptance predicate is satisfied on its own.";
    let services = PipelineServices::headless().with_remote(Arc::new(FakeRemote {
        text: remote_text.to_string(),
        extractor: Some("tika".to_string()),
        fail: false,
    }));
    let pipeline = Pipeline::new(services);

    let options = ExtractOptions {
        remote_endpoint: Some("http://extractor.internal/extract".to_string()),
        ..Default::default()
    };
    let result = pipeline.extract(&pdf_doc(data), &options).await.unwrap();

    assert_eq!(result.meta.extractor, "tika");
    assert!(!result.meta.used_ocr);
    assert!(result.text.contains("remote extraction service"));
}

#[tokio::test]
async fn failing_remote_is_not_fatal() {
    // Remote fallback down, no OCR capability: the run terminates as an
    // unreadable document, still a structurally valid result.
    let data = text_pdf(&[&[]]);
    let services = PipelineServices::headless().with_remote(Arc::new(FakeRemote {
        text: String::new(),
        extractor: None,
        fail: true,
    }));
    let pipeline = Pipeline::new(services);

    let options = ExtractOptions {
        remote_endpoint: Some("http://extractor.internal/extract".to_string()),
        ..Default::default()
    };
    let result = pipeline.extract(&pdf_doc(data), &options).await.unwrap();

    assert_eq!(result.meta.extractor, "pdf-unreadable");
    assert!(result.text.is_empty());
    assert!(result
        .meta
        .trace
        .iter()
        .any(|e| e.stage == "pdf-remote" && e.detail.contains("unavailable")));
}

#[tokio::test]
async fn docx_paragraphs_become_one_page() {
    let paragraphs: Vec<String> = (1..=9)
        .map(|i| format!("Paragraph number {} with some ordinary body text in it.", i))
        .chain(std::iter::once("EXECUTIVE SUMMARY".to_string()))
        .collect();
    let refs: Vec<&str> = paragraphs.iter().map(|s| s.as_str()).collect();
    let data = docx_with_paragraphs(&refs);

    let doc = RawDocument::from_bytes(
        data,
        Some("summary.docx".into()),
        Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document".into()),
    )
    .unwrap();
    let pipeline = Pipeline::new(PipelineServices::headless());
    let result = pipeline.extract(&doc, &ExtractOptions::default()).await.unwrap();

    assert_eq!(result.meta.extractor, "docx");
    assert_eq!(result.meta.kind, DocumentKind::Docx);
    assert_eq!(result.pages.len(), 1);

    let layout = result.layout.as_ref().unwrap();
    assert_eq!(layout.summary.page_count, 1);
    assert!(layout.pages[0]
        .headings
        .contains(&"EXECUTIVE SUMMARY".to_string()));
}

#[tokio::test]
async fn windows_1251_text_is_recovered() {
    // "Документ на русском языке. " in Windows-1251, repeated for length.
    let sentence: &[u8] = &[
        0xC4, 0xEE, 0xEA, 0xF3, 0xEC, 0xE5, 0xED, 0xF2, 0x20, 0xED, 0xE0, 0x20, 0xF0, 0xF3,
        0xF1, 0xF1, 0xEA, 0xEE, 0xEC, 0x20, 0xFF, 0xE7, 0xFB, 0xEA, 0xE5, 0x2E, 0x20,
    ];
    let mut data = Vec::new();
    for _ in 0..6 {
        data.extend_from_slice(sentence);
    }

    let doc = RawDocument::from_bytes(data, Some("doc.txt".into()), Some("text/plain".into()))
        .unwrap();
    let pipeline = Pipeline::new(PipelineServices::headless());
    let result = pipeline.extract(&doc, &ExtractOptions::default()).await.unwrap();

    assert_eq!(result.meta.extractor, "text");
    assert!(result.text.contains("Документ на русском языке"));
    assert!(!result.text.contains('\u{FFFD}'));
    assert_eq!(result.layout.as_ref().unwrap().pages[0].language.as_deref(), Some("ru"));
}

#[tokio::test]
async fn magic_bytes_override_declared_type() {
    // Declared as plain text but carrying a PDF header: the PDF path runs.
    let data = text_pdf(&[CLEAN_LINES]);
    let doc = RawDocument::from_bytes(data, Some("fake.txt".into()), Some("text/plain".into()))
        .unwrap();
    let pipeline = Pipeline::new(PipelineServices::headless());
    let result = pipeline.extract(&doc, &ExtractOptions::default()).await.unwrap();

    assert_eq!(result.meta.kind, DocumentKind::Pdf);
    assert_eq!(result.meta.extractor, "pdf-text");
}

#[tokio::test]
async fn cancelled_run_keeps_partial_trace() {
    let data = text_pdf(&[&[], &[], &[]]);
    let ocr = FakeOcr::new("recognized");
    let services = PipelineServices::headless()
        .with_renderer(Arc::new(FakeRenderer))
        .with_ocr(ocr);
    let pipeline = Pipeline::new(services);

    let cancel = CancelFlag::new();
    cancel.cancel();
    let result = pipeline
        .extract_cancellable(&pdf_doc(data), &ExtractOptions::default(), &cancel)
        .await
        .unwrap();

    // Cancellation before the first render: OCR produced nothing, but the
    // trace records what happened and the result is well-formed.
    assert!(result
        .meta
        .trace
        .iter()
        .any(|e| e.stage == "cancelled"));
    assert!(!result.meta.trace.is_empty());
}

#[tokio::test]
async fn page_images_are_uploaded_when_configured() {
    let data = text_pdf(&[CLEAN_LINES, CLEAN_LINES]);
    let store = Arc::new(FakeStore {
        uploads: AtomicUsize::new(0),
    });
    let services = PipelineServices::headless()
        .with_renderer(Arc::new(FakeRenderer))
        .with_ocr(FakeOcr::new("unused"))
        .with_store(store.clone());
    let pipeline = Pipeline::new(services);

    let options = ExtractOptions {
        cloud_upload: Some(undoc::CloudUploadOptions::default()),
        ..Default::default()
    };
    let result = pipeline.extract(&pdf_doc(data), &options).await.unwrap();

    let images = result.meta.page_images.as_ref().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].page, 1);
    assert!(images[0].url.starts_with("https://cdn.example/pages/"));
    assert_eq!(store.uploads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn ocr_page_limit_is_honored() {
    let data = text_pdf(&[&[], &[], &[], &[], &[]]);
    let ocr = FakeOcr::new("Recognized page text long enough to keep around.");
    let services = PipelineServices::headless()
        .with_renderer(Arc::new(FakeRenderer))
        .with_ocr(ocr.clone());
    let pipeline = Pipeline::new(services);

    let options = ExtractOptions {
        ocr: undoc::OcrOptions {
            languages: vec!["eng".to_string()],
            page_limit: 2,
        },
        ..Default::default()
    };
    let result = pipeline.extract(&pdf_doc(data), &options).await.unwrap();

    assert_eq!(result.meta.extractor, "pdf-ocr");
    assert_eq!(ocr.call_count(), 2);
    assert_eq!(result.pages.len(), 2);
}
