//! DOCX text extraction.
//!
//! A DOCX file is a ZIP container whose main body lives in
//! `word/document.xml`. The extractor streams that XML, collecting the run
//! text (`w:t`) of each paragraph (`w:p`), and hands the concatenated
//! paragraphs to the synthetic layout builder so DOCX output shares the
//! PDF path's page shape. Missing entries and malformed XML degrade to
//! empty output; they never panic or abort the pipeline.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Extract the non-empty paragraphs of a DOCX buffer, in document order.
pub fn extract_paragraphs(data: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_ENTRY)
        .map_err(|e| Error::Docx(format!("missing {}: {}", DOCUMENT_ENTRY, e)))?
        .read_to_string(&mut xml)?;

    parse_document_xml(&xml)
}

/// Extract the whole document body as one text, paragraphs separated by
/// newlines.
pub fn extract_text(data: &[u8]) -> Result<String> {
    Ok(extract_paragraphs(data)?.join("\n"))
}

/// Stream `document.xml`, grouping `w:t` run text by `w:p` boundaries.
/// Tabs and explicit breaks inside runs are preserved as `\t` and `\n`.
fn parse_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = true,
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_text_run {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Docx(format!("bad run text: {}", e)))?;
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::Docx(format!("malformed document.xml: {}", e))),
        }
    }

    // Text outside any closed paragraph still counts.
    let tail = current.trim();
    if !tail.is_empty() {
        paragraphs.push(tail.to_string());
    }

    log::debug!("docx: {} paragraphs", paragraphs.len());
    Ok(paragraphs)
}
