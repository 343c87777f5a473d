//! pdfmark core
//!
//! Domain model for the PDF markup tool: the annotation list, the
//! coordinate mapping between canvas-buffer pixels and PDF points, and the
//! save-time flattening of annotations into page content streams.

pub mod annotation;
pub mod coords;
pub mod export;

pub use annotation::{Annotation, AnnotationList, CanvasPoint};
pub use coords::{
    canvas_to_css, canvas_to_pdf, click_to_canvas, css_to_pdf, CssPoint, PageDisplaySize,
    PdfPoint, RENDER_ZOOM,
};
pub use export::{flatten_annotations, ExportError, CROSS_HALF_SIZE, FONT_SIZE_CSS};
