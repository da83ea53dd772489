//! Data model for extraction results.
//!
//! This module defines the intermediate representation that bridges the
//! per-format extractors, the layout reconstructor, and the pipeline
//! output. The model is format-agnostic: PDF, DOCX, plain text, and OCR
//! results all flow through the same shapes.

mod block;
mod page;
mod result;
mod trace;

pub use block::{BBox, Column, Line, TableCell, TableRegion, TextBlock};
pub use page::{DocumentLayout, LayoutSummary, PageLayout};
pub use result::{page_tagged_text, ExtractionMeta, ExtractionResult, PageImage};
pub use trace::{TraceBuilder, TraceEntry, TraceStatus};
