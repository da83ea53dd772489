//! PDF content stream interpretation.
//!
//! Walks the text-showing operators of a page's content stream with a
//! text-matrix accumulator and yields positioned glyph runs in PDF user
//! space (origin bottom-left). Coordinate conversion to viewport space
//! happens in the caller, which knows the page height.

use std::collections::BTreeMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// One glyph run as placed by the content stream, in PDF user space.
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Decoded run text.
    pub text: String,
    /// X of the text origin.
    pub x: f32,
    /// Y of the baseline.
    pub y: f32,
    /// Effective font size (Tf size times matrix scale).
    pub font_size: f32,
}

/// TJ kerning adjustment (1/1000 text-space units) large enough to stand
/// for a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Extract the positioned glyph runs of one page.
pub fn extract_page_runs(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<TextRun>> {
    let fonts = doc
        .get_page_fonts(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;
    let content = page_content(doc, page_id)?;
    parse_content(doc, &content, &fonts)
}

/// Collect a page's content stream bytes, concatenating multi-part streams.
fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    let contents = page_dict
        .get(b"Contents")
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    match contents {
        Object::Reference(r) => {
            if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                return s
                    .decompressed_content()
                    .map_err(|e| Error::PdfParse(e.to_string()));
            }
            Err(Error::PdfParse("invalid content stream".to_string()))
        }
        Object::Array(arr) => {
            let mut content = Vec::new();
            for obj in arr {
                if let Object::Reference(r) = obj {
                    if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                        if let Ok(data) = s.decompressed_content() {
                            content.extend_from_slice(&data);
                            content.push(b' ');
                        }
                    }
                }
            }
            Ok(content)
        }
        _ => Err(Error::PdfParse("invalid content stream".to_string())),
    }
}

/// Walk the operator list, tracking the text matrix and current font.
fn parse_content(
    doc: &LopdfDocument,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
) -> Result<Vec<TextRun>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut runs = Vec::new();
    let mut current_font_name: Vec<u8> = Vec::new();
    let mut current_font_size: f32 = 12.0;
    let mut matrix = TextMatrix::default();
    let mut in_text_block = false;

    for op in content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                matrix = TextMatrix::default();
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Object::Name(font_name) = &op.operands[0] {
                        current_font_name = font_name.clone();
                    }
                    current_font_size = number(&op.operands[1]).unwrap_or(12.0);
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = number(&op.operands[0]).unwrap_or(0.0);
                    let ty = number(&op.operands[1]).unwrap_or(0.0);
                    matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    matrix.set(
                        number(&op.operands[0]).unwrap_or(1.0),
                        number(&op.operands[1]).unwrap_or(0.0),
                        number(&op.operands[2]).unwrap_or(0.0),
                        number(&op.operands[3]).unwrap_or(1.0),
                        number(&op.operands[4]).unwrap_or(0.0),
                        number(&op.operands[5]).unwrap_or(0.0),
                    );
                }
            }
            "T*" => {
                matrix.next_line();
            }
            "Tj" | "TJ" => {
                if in_text_block {
                    let encoding = fonts
                        .get(&current_font_name)
                        .and_then(|f| f.get_font_encoding(doc).ok());

                    let text = if op.operator == "TJ" {
                        // Array of strings and kerning adjustments. Large
                        // negative adjustments stand for word spaces.
                        if let Some(Object::Array(arr)) = op.operands.first() {
                            let mut combined = String::new();
                            for item in arr {
                                match item {
                                    Object::String(bytes, _) => {
                                        if let Some(ref enc) = encoding {
                                            if let Ok(decoded) =
                                                LopdfDocument::decode_text(enc, bytes)
                                            {
                                                combined.push_str(&decoded);
                                            }
                                        } else {
                                            combined.push_str(&decode_simple(bytes));
                                        }
                                    }
                                    Object::Integer(n) => {
                                        if -(*n as f32) > TJ_SPACE_THRESHOLD
                                            && !combined.is_empty()
                                            && !combined.ends_with(' ')
                                        {
                                            combined.push(' ');
                                        }
                                    }
                                    Object::Real(n) => {
                                        if -n > TJ_SPACE_THRESHOLD
                                            && !combined.is_empty()
                                            && !combined.ends_with(' ')
                                        {
                                            combined.push(' ');
                                        }
                                    }
                                    _ => {}
                                }
                            }
                            combined
                        } else {
                            String::new()
                        }
                    } else if let Some(Object::String(bytes, _)) = op.operands.first() {
                        if let Some(ref enc) = encoding {
                            LopdfDocument::decode_text(enc, bytes).unwrap_or_default()
                        } else {
                            decode_simple(bytes)
                        }
                    } else {
                        String::new()
                    };

                    if !text.trim().is_empty() {
                        let (x, y) = matrix.position();
                        runs.push(TextRun {
                            text,
                            x,
                            y,
                            font_size: current_font_size * matrix.scale(),
                        });
                    }
                }
            }
            "'" | "\"" => {
                matrix.next_line();
                if in_text_block {
                    let text_idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = op.operands.get(text_idx) {
                        let encoding = fonts
                            .get(&current_font_name)
                            .and_then(|f| f.get_font_encoding(doc).ok());
                        let text = if let Some(ref enc) = encoding {
                            LopdfDocument::decode_text(enc, bytes).unwrap_or_default()
                        } else {
                            decode_simple(bytes)
                        };
                        if !text.trim().is_empty() {
                            let (x, y) = matrix.position();
                            runs.push(TextRun {
                                text,
                                x,
                                y,
                                font_size: current_font_size * matrix.scale(),
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

/// Text matrix accumulator for the content stream walk.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        // Default leading; a TL operator would refine this.
        self.f -= 12.0 * self.d;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Fallback decoding when the font carries no usable encoding.
fn decode_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1 fallback
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_matrix_translate() {
        let mut m = TextMatrix::default();
        m.translate(10.0, 20.0);
        assert_eq!(m.position(), (10.0, 20.0));
        m.translate(5.0, 0.0);
        assert_eq!(m.position(), (15.0, 20.0));
    }

    #[test]
    fn test_text_matrix_set_and_scale() {
        let mut m = TextMatrix::default();
        m.set(2.0, 0.0, 0.0, 2.0, 100.0, 700.0);
        assert_eq!(m.position(), (100.0, 700.0));
        assert_eq!(m.scale(), 2.0);
    }

    #[test]
    fn test_decode_simple_utf16be() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_simple(&bytes), "Hi");
    }

    #[test]
    fn test_decode_simple_latin1_fallback() {
        let bytes = [0xE9, 0x74, 0xE9]; // "été" in Latin-1, invalid UTF-8
        assert_eq!(decode_simple(&bytes), "été");
    }
}
