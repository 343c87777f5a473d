//! PDF document abstraction layer
//!
//! Provides a high-level interface to PDF documents using PDFium: load
//! from bytes, query page geometry, render pages to RGBA buffers.

use pdfium_render::prelude::*;
use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    /// Failed to initialize PDFium library
    #[error("PDFium initialization error: {0}")]
    Initialization(String),

    /// Failed to load PDF document
    #[error("PDF load error: {0}")]
    Load(String),

    /// Invalid page index
    #[error("Invalid page index: {0}")]
    InvalidPageIndex(u16),

    /// Rendering error
    #[error("PDF render error: {0}")]
    Render(String),
}

/// Result type for PDF operations
pub type PdfResult<T> = Result<T, PdfError>;

/// Page dimensions in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSizePoints {
    pub width: f32,
    pub height: f32,
}

/// PDF document handle
///
/// Wraps a PDFium document loaded from owned bytes. PDFium handles are not
/// thread-safe; a `PdfDocument` must stay on the thread that created it,
/// and each thread that needs the document re-opens it from the same bytes.
pub struct PdfDocument {
    document: pdfium_render::prelude::PdfDocument<'static>,
}

impl PdfDocument {
    /// Initialize PDFium library (helper function)
    ///
    /// Search order:
    /// 1. Executable's directory (for app bundles)
    /// 2. Current working directory
    /// 3. System library paths
    fn init_pdfium() -> PdfResult<Pdfium> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        if let Some(ref dir) = exe_dir {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            {
                return Ok(Pdfium::new(bindings));
            }
        }

        Ok(Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| PdfError::Initialization(e.to_string()))?,
        ))
    }

    /// Load a PDF document from byte data (owned)
    ///
    /// The bytes are leaked to satisfy PDFium's `'static` borrow; documents
    /// are opened a handful of times per session, so the leak is bounded by
    /// the number of open operations, not by rendering.
    pub fn from_bytes(data: Vec<u8>) -> PdfResult<Self> {
        let pdfium = Box::leak(Box::new(Self::init_pdfium()?));
        let data_static: &'static [u8] = Box::leak(data.into_boxed_slice());

        let document = pdfium
            .load_pdf_from_byte_slice(data_static, None)
            .map_err(|e| PdfError::Load(e.to_string()))?;

        Ok(Self { document })
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> u16 {
        self.document.pages().len()
    }

    /// Get the size of a page in PDF points (0-based index)
    pub fn page_size(&self, index: u16) -> PdfResult<PageSizePoints> {
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(|_| PdfError::InvalidPageIndex(index))?;

        Ok(PageSizePoints {
            width: page.width().value,
            height: page.height().value,
        })
    }

    /// Render a page to RGBA pixel data (0-based index)
    ///
    /// # Arguments
    /// * `index` - Zero-based page index
    /// * `width` - Target width in pixels
    /// * `height` - Target height in pixels
    ///
    /// # Returns
    /// RGBA pixel data (4 bytes per pixel) or an error
    pub fn render_page_rgba(&self, index: u16, width: u32, height: u32) -> PdfResult<Vec<u8>> {
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(|_| PdfError::InvalidPageIndex(index))?;

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::Render(e.to_string()))?;

        Ok(bitmap.as_rgba_bytes().to_vec())
    }
}
