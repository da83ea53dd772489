//! Error types for the undoc library.

use std::io;
use thiserror::Error;

/// Result type alias for undoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document extraction.
///
/// Only [`Error::Io`] and [`Error::Unreadable`] ever reach a caller of the
/// pipeline; every other variant is produced inside a single stage and
/// converted to a trace entry by the orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input buffer could not be acquired at all. Fatal.
    #[error("Unreadable input: {0}")]
    Unreadable(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error unpacking or parsing a DOCX container.
    #[error("DOCX error: {0}")]
    Docx(String),

    /// Character encoding recovery failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Page rasterization failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Optical character recognition failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// The remote extraction service failed or returned garbage.
    #[error("Remote extraction error: {0}")]
    Remote(String),

    /// A required capability (renderer, OCR engine) is missing in this
    /// environment. The strategy depending on it is skipped entirely.
    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error marks a missing capability rather than a failed
    /// attempt. Unavailable strategies are skipped; degraded ones were tried.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Docx(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Docx(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Unreadable("empty upload".to_string());
        assert_eq!(err.to_string(), "Unreadable input: empty upload");

        let err = Error::Unavailable("no raster backend".to_string());
        assert_eq!(err.to_string(), "Capability unavailable: no raster backend");
    }

    #[test]
    fn test_is_unavailable() {
        assert!(Error::Unavailable("ocr".into()).is_unavailable());
        assert!(!Error::Ocr("tesseract exited 1".into()).is_unavailable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
