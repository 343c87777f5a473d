//! pdfmark rendering layer
//!
//! Thin wrapper around PDFium for loading documents from bytes and
//! rasterizing pages to RGBA pixel data.

mod pdf;

pub use pdf::{PageSizePoints, PdfDocument, PdfError, PdfResult};
