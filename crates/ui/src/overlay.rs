//! Annotation overlay painting
//!
//! Draws the committed annotations of a page over its presented surface.
//! Drawing goes through the [`DrawContext`] trait; each call carries its
//! full style, so the painter can never leave font or stroke state behind
//! for the caller to trip over.

use pdfmark_core::annotation::{Annotation, AnnotationList, CanvasPoint};
use pdfmark_core::export::{CROSS_HALF_SIZE, CROSS_STROKE_WIDTH, FONT_SIZE_CSS};

/// Minimal 2D drawing seam the application shell implements
///
/// Coordinates, font sizes, and stroke widths are all in canvas-buffer
/// space; the shell converts to its own units when it draws.
pub trait DrawContext {
    /// Draw `text` left-aligned with the top of the glyphs at (`x`, `y`).
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_size: f32);

    /// Stroke a straight line segment.
    fn stroke_line(&mut self, from: CanvasPoint, to: CanvasPoint, width: f32);
}

/// Draw all annotations of `page` in list order.
pub fn draw_page_annotations<C: DrawContext>(ctx: &mut C, annotations: &AnnotationList, page: u16) {
    for annotation in annotations.for_page(page) {
        match annotation {
            Annotation::Text { position, text, .. } => {
                ctx.fill_text(text, position.x, position.y, FONT_SIZE_CSS);
            }
            Annotation::Cross { position, .. } => {
                let h = CROSS_HALF_SIZE;
                ctx.stroke_line(
                    CanvasPoint::new(position.x - h, position.y - h),
                    CanvasPoint::new(position.x + h, position.y + h),
                    CROSS_STROKE_WIDTH,
                );
                ctx.stroke_line(
                    CanvasPoint::new(position.x - h, position.y + h),
                    CanvasPoint::new(position.x + h, position.y - h),
                    CROSS_STROKE_WIDTH,
                );
            }
        }
    }
}
