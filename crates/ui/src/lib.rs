//! pdfmark viewer logic
//!
//! Everything the viewer does that is not tied to a GUI toolkit: the
//! worker-thread page rasterizer with per-page cancellation, the
//! annotation overlay painter, and the markup editing state machine. The
//! application shell adapts these to egui.

pub mod editor;
pub mod overlay;
pub mod rasterizer;
pub mod surface;

pub use editor::{ClickOutcome, EditMode, InlineEditor, MarkupEditor};
pub use overlay::{draw_page_annotations, DrawContext};
pub use rasterizer::{
    PageRasterizer, PdfiumSource, RasterEvent, RenderSource, RenderSourceError,
};
pub use surface::PageSurface;
