//! Page rasterization capability.
//!
//! Rendering a PDF page to pixels needs a raster backend that may simply
//! not exist in the deployment environment. The capability is therefore an
//! explicit interface selected at startup: the pipeline always codes
//! against [`PageRenderer`] and never branches on backend presence inline.
//! Raster buffers are memory-heavy, so a [`RenderedPage`] is scoped to one
//! page's processing and dropped on every exit path.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// One rendered page as a PNG-encoded raster.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

/// Capability of rendering one page of a PDF buffer to a raster image.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Whether a raster backend exists in this environment.
    fn is_available(&self) -> bool;

    /// Render page `page` (1-indexed) of `pdf` at the given scale.
    async fn render_page(&self, pdf: &[u8], page: u32, scale: f32) -> Result<RenderedPage>;
}

/// Renderer for headless environments without a raster backend. Always
/// reports unavailability, so render-dependent strategies are skipped.
#[derive(Debug, Clone, Default)]
pub struct UnavailableRenderer;

#[async_trait]
impl PageRenderer for UnavailableRenderer {
    fn is_available(&self) -> bool {
        false
    }

    async fn render_page(&self, _pdf: &[u8], _page: u32, _scale: f32) -> Result<RenderedPage> {
        Err(Error::Unavailable("no raster backend".to_string()))
    }
}

/// MuPDF-backed renderer.
#[cfg(feature = "render-mupdf")]
#[derive(Debug, Clone, Default)]
pub struct MupdfRenderer;

#[cfg(feature = "render-mupdf")]
#[async_trait]
impl PageRenderer for MupdfRenderer {
    fn is_available(&self) -> bool {
        true
    }

    async fn render_page(&self, pdf: &[u8], page: u32, scale: f32) -> Result<RenderedPage> {
        let pdf = pdf.to_vec();
        // MuPDF is synchronous and CPU-bound; keep it off the async runtime.
        tokio::task::spawn_blocking(move || render_with_mupdf(&pdf, page, scale))
            .await
            .map_err(|e| Error::Render(e.to_string()))?
    }
}

#[cfg(feature = "render-mupdf")]
fn render_with_mupdf(pdf: &[u8], page: u32, scale: f32) -> Result<RenderedPage> {
    use mupdf::{Colorspace, Document, Matrix};

    let doc = Document::from_bytes(pdf, "application/pdf")
        .map_err(|e| Error::Render(e.to_string()))?;
    let page = doc
        .load_page(page as i32 - 1)
        .map_err(|e| Error::Render(e.to_string()))?;
    let matrix = Matrix::new_scale(scale, scale);
    let pixmap = page
        .to_pixmap(&matrix, &Colorspace::device_rgb(), 0.0, false)
        .map_err(|e| Error::Render(e.to_string()))?;

    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let rgb = pixmap.samples().to_vec();

    let mut png = Vec::new();
    let buffer = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| Error::Render("pixmap size mismatch".to_string()))?;
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| Error::Render(e.to_string()))?;

    Ok(RenderedPage { png, width, height })
}
