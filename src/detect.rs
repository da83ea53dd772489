//! Document kind detection.
//!
//! Classifies an uploaded byte buffer as one of the supported document
//! kinds. Magic bytes always win over the declared MIME type, which wins
//! over the filename extension; the detector is infallible and falls back
//! to [`DocumentKind::Binary`] when nothing matches.

use serde::{Deserialize, Serialize};

/// Kind of a document as resolved by [`detect_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// PDF document (`%PDF` header)
    Pdf,
    /// Word document (ZIP container)
    Docx,
    /// Plain text in some encoding
    Text,
    /// Raster image
    Image,
    /// Anything else
    Binary,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Text => "text",
            DocumentKind::Image => "image",
            DocumentKind::Binary => "binary",
        };
        write!(f, "{}", name)
    }
}

/// PDF magic bytes: %PDF
const PDF_MAGIC: &[u8] = b"%PDF";
/// ZIP local-file header, the container format of DOCX
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian byte order mark
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
/// UTF-16 big-endian byte order mark
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "log"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

/// Detect the kind of a document from its bytes, declared MIME type, and
/// filename.
///
/// Decision order: magic bytes, then MIME substring match, then filename
/// extension. The first matching rule wins. Never fails.
///
/// # Example
/// ```
/// use undoc::detect::{detect_kind, DocumentKind};
///
/// let kind = detect_kind(b"%PDF-1.7\n", Some("text/plain"), Some("a.txt"));
/// assert_eq!(kind, DocumentKind::Pdf);
/// ```
pub fn detect_kind(data: &[u8], mime: Option<&str>, filename: Option<&str>) -> DocumentKind {
    if let Some(kind) = detect_from_magic(data) {
        return kind;
    }

    if let Some(mime) = mime {
        let mime = mime.to_ascii_lowercase();
        if mime.contains("pdf") {
            return DocumentKind::Pdf;
        }
        if mime.contains("wordprocessingml") || mime.contains("docx") {
            return DocumentKind::Docx;
        }
        if mime.starts_with("image/") {
            return DocumentKind::Image;
        }
        if mime.starts_with("text/") {
            return DocumentKind::Text;
        }
    }

    if let Some(kind) = detect_from_extension(filename) {
        return kind;
    }

    DocumentKind::Binary
}

/// Sniff magic bytes at the start of the buffer.
fn detect_from_magic(data: &[u8]) -> Option<DocumentKind> {
    if data.starts_with(PDF_MAGIC) {
        return Some(DocumentKind::Pdf);
    }
    if data.starts_with(ZIP_MAGIC) {
        return Some(DocumentKind::Docx);
    }
    if data.starts_with(UTF8_BOM) || data.starts_with(UTF16_LE_BOM) || data.starts_with(UTF16_BE_BOM)
    {
        return Some(DocumentKind::Text);
    }
    None
}

/// Classify by filename extension.
fn detect_from_extension(filename: Option<&str>) -> Option<DocumentKind> {
    let name = filename?;
    let ext = name.rsplit('.').next()?.to_ascii_lowercase();
    if ext == "pdf" {
        return Some(DocumentKind::Pdf);
    }
    if ext == "docx" {
        return Some(DocumentKind::Docx);
    }
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Some(DocumentKind::Text);
    }
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Some(DocumentKind::Image);
    }
    None
}
