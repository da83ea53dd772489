//! PDF structural extraction.
//!
//! Parses page content streams into positioned [`TextBlock`]s with
//! viewport-space bounding boxes. Reading order is not resolved here; that
//! is the layout reconstructor's job. A malformed page degrades to an empty
//! page with a warn-level trace entry and never aborts the document.

mod content;

pub use content::TextRun;

use lopdf::Document as LopdfDocument;

use crate::error::{Error, Result};
use crate::model::{BBox, TextBlock, TraceEntry};

/// Approximate glyph advance as a fraction of font size, used to estimate
/// run widths when the font carries no metrics.
const CHAR_WIDTH_FACTOR: f32 = 0.5;
/// Ascender height as a fraction of font size.
const ASCENT_FACTOR: f32 = 0.8;
/// Descender depth as a fraction of font size.
const DESCENT_FACTOR: f32 = 0.2;

/// Blocks of one page plus its dimensions, before layout reconstruction.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// Unordered positioned blocks.
    pub blocks: Vec<TextBlock>,
}

/// Structural extractor over a parsed PDF document.
pub struct PdfExtractor {
    doc: LopdfDocument,
}

impl PdfExtractor {
    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(Error::from)?;
        Ok(Self { doc })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Extract positioned blocks for every page.
    ///
    /// Always returns one entry per page. Pages whose content stream cannot
    /// be parsed come back empty, with the reason recorded in the returned
    /// trace delta.
    pub fn extract_pages(&self) -> (Vec<PdfPage>, Vec<TraceEntry>) {
        let mut pages = Vec::new();
        let mut trace = Vec::new();

        for (page_num, page_id) in self.doc.get_pages() {
            let (width, height) = self.page_dimensions(page_id);
            let mut page = PdfPage {
                number: page_num,
                width,
                height,
                blocks: Vec::new(),
            };

            match content::extract_page_runs(&self.doc, page_id) {
                Ok(runs) => {
                    page.blocks = runs_to_blocks(&runs, height);
                    log::debug!(
                        "pdf page {}: {} runs -> {} blocks",
                        page_num,
                        runs.len(),
                        page.blocks.len()
                    );
                }
                Err(e) => {
                    log::warn!("pdf page {} degraded: {}", page_num, e);
                    trace.push(TraceEntry::warn(
                        "pdf-text",
                        format!("page {} degraded: {}", page_num, e),
                    ));
                }
            }

            pages.push(page);
        }

        (pages, trace)
    }

    /// Page dimensions from the MediaBox, with Letter as the fallback.
    fn page_dimensions(&self, page_id: lopdf::ObjectId) -> (f32, f32) {
        if let Ok(page_dict) = self.doc.get_dictionary(page_id) {
            if let Ok(media_box) = page_dict.get(b"MediaBox") {
                if let Ok(array) = media_box.as_array() {
                    if array.len() >= 4 {
                        let width = array[2].as_float().unwrap_or(612.0);
                        let height = array[3].as_float().unwrap_or(792.0);
                        return (width, height);
                    }
                }
            }
        }
        (612.0, 792.0)
    }
}

/// Convert glyph runs in PDF user space (origin bottom-left) into blocks in
/// viewport space (origin top-left), one block per non-empty run.
fn runs_to_blocks(runs: &[TextRun], page_height: f32) -> Vec<TextBlock> {
    runs.iter()
        .filter(|run| !run.text.trim().is_empty())
        .enumerate()
        .map(|(id, run)| {
            let est_width = run.text.chars().count() as f32 * run.font_size * CHAR_WIDTH_FACTOR;
            let top = page_height - (run.y + run.font_size * ASCENT_FACTOR);
            let bottom = page_height - (run.y - run.font_size * DESCENT_FACTOR);
            TextBlock::new(
                id as u32,
                run.text.clone(),
                BBox::new(run.x, top, run.x + est_width, bottom),
            )
        })
        .collect()
}
