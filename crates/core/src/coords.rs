//! Coordinate transformation between canvas, CSS, and PDF coordinate systems
//!
//! Three spaces are involved:
//!
//! - canvas-buffer space: device pixels of the off-screen render buffer,
//!   top-left origin. Annotations are stored here.
//! - CSS space: logical pixels of the displayed page at the fixed render
//!   zoom, top-left origin. buffer = css * device_pixel_ratio.
//! - PDF space: points (1/72 inch), bottom-left origin.
//!
//! The zoom used to size the display is a single constant so the render
//! path and the save path can never disagree about it.

use crate::annotation::CanvasPoint;

/// Fixed zoom factor applied to PDF point dimensions to get CSS display size.
pub const RENDER_ZOOM: f32 = 1.5;

/// A point in CSS (logical pixel) space, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssPoint {
    pub x: f32,
    pub y: f32,
}

/// A point in PDF space (points, bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPoint {
    pub x: f32,
    pub y: f32,
}

/// Displayed size of a page in CSS pixels at [`RENDER_ZOOM`].
///
/// Computed once per page when a document loads and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDisplaySize {
    /// 1-based page number
    pub page: u16,
    pub width: f32,
    pub height: f32,
}

impl PageDisplaySize {
    /// Display size for a page of `width_pt` x `height_pt` PDF points.
    pub fn from_page_size(page: u16, width_pt: f32, height_pt: f32) -> Self {
        Self {
            page,
            width: width_pt * RENDER_ZOOM,
            height: height_pt * RENDER_ZOOM,
        }
    }

    /// Buffer dimensions in device pixels for a given device pixel ratio.
    pub fn buffer_size(&self, device_pixel_ratio: f32) -> (u32, u32) {
        (
            (self.width * device_pixel_ratio).round() as u32,
            (self.height * device_pixel_ratio).round() as u32,
        )
    }
}

/// Map a click on the displayed page to canvas-buffer space
///
/// `click` is the offset from the page's top-left corner in CSS pixels;
/// the buffer and displayed sizes may differ per axis, so each axis is
/// scaled independently.
pub fn click_to_canvas(
    click: CssPoint,
    buffer_width: f32,
    buffer_height: f32,
    display_width: f32,
    display_height: f32,
) -> CanvasPoint {
    CanvasPoint {
        x: click.x * (buffer_width / display_width),
        y: click.y * (buffer_height / display_height),
    }
}

/// Convert a canvas-buffer point back to CSS space.
pub fn canvas_to_css(point: CanvasPoint, device_pixel_ratio: f32) -> CssPoint {
    CssPoint {
        x: point.x / device_pixel_ratio,
        y: point.y / device_pixel_ratio,
    }
}

/// Convert a CSS point on a displayed page to PDF space
///
/// Scales each axis by the ratio of PDF size to displayed size, then flips
/// Y against the page height because PDF's origin is at the bottom left.
pub fn css_to_pdf(
    point: CssPoint,
    display: &PageDisplaySize,
    page_width_pt: f32,
    page_height_pt: f32,
) -> PdfPoint {
    let ratio_x = page_width_pt / display.width;
    let ratio_y = page_height_pt / display.height;

    PdfPoint {
        x: point.x * ratio_x,
        y: page_height_pt - point.y * ratio_y,
    }
}

/// Full save-path conversion: canvas-buffer point to PDF point.
pub fn canvas_to_pdf(
    point: CanvasPoint,
    display: &PageDisplaySize,
    page_width_pt: f32,
    page_height_pt: f32,
    device_pixel_ratio: f32,
) -> PdfPoint {
    let css = canvas_to_css(point, device_pixel_ratio);
    css_to_pdf(css, display, page_width_pt, page_height_pt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_display_size_applies_zoom() {
        let display = PageDisplaySize::from_page_size(1, 612.0, 792.0);
        assert!(close(display.width, 918.0));
        assert!(close(display.height, 1188.0));
    }

    #[test]
    fn test_buffer_size_scales_by_dpr() {
        let display = PageDisplaySize::from_page_size(1, 400.0, 600.0);
        assert_eq!(display.buffer_size(2.0), (1200, 1800));
        assert_eq!(display.buffer_size(1.0), (600, 900));
    }

    #[test]
    fn test_click_to_canvas_scales_per_axis() {
        // Buffer twice the display width, three times the height.
        let p = click_to_canvas(CssPoint { x: 10.0, y: 10.0 }, 200.0, 300.0, 100.0, 100.0);
        assert!(close(p.x, 20.0));
        assert!(close(p.y, 30.0));
    }

    #[test]
    fn test_canvas_to_css_divides_by_dpr() {
        let css = canvas_to_css(CanvasPoint::new(150.0, 300.0), 2.0);
        assert!(close(css.x, 75.0));
        assert!(close(css.y, 150.0));
    }

    #[test]
    fn test_css_to_pdf_flips_y() {
        // 400x600pt page displayed at zoom 1.5 -> 600x900 CSS.
        let display = PageDisplaySize::from_page_size(1, 400.0, 600.0);

        // CSS top-left maps to PDF top-left (y = page height).
        let top_left = css_to_pdf(CssPoint { x: 0.0, y: 0.0 }, &display, 400.0, 600.0);
        assert!(close(top_left.x, 0.0));
        assert!(close(top_left.y, 600.0));

        // CSS bottom-right maps to PDF bottom-right (y = 0).
        let bottom_right = css_to_pdf(
            CssPoint { x: 600.0, y: 900.0 },
            &display,
            400.0,
            600.0,
        );
        assert!(close(bottom_right.x, 400.0));
        assert!(close(bottom_right.y, 0.0));
    }

    #[test]
    fn test_canvas_to_pdf_known_values() {
        // 400x600pt page, display 600x900 CSS, dpr 2.
        // Buffer point (150, 300) -> CSS (75, 150) -> PDF (50, 600-100) = (50, 500).
        let display = PageDisplaySize::from_page_size(1, 400.0, 600.0);
        let pdf = canvas_to_pdf(CanvasPoint::new(150.0, 300.0), &display, 400.0, 600.0, 2.0);
        assert!(close(pdf.x, 50.0));
        assert!(close(pdf.y, 500.0));
    }

    #[test]
    fn test_round_trip_click_to_pdf_and_back() {
        let page_w = 612.0;
        let page_h = 792.0;
        let display = PageDisplaySize::from_page_size(1, page_w, page_h);
        let dpr = 2.0;
        let (buf_w, buf_h) = display.buffer_size(dpr);

        let click = CssPoint { x: 123.0, y: 456.0 };
        let canvas = click_to_canvas(
            click,
            buf_w as f32,
            buf_h as f32,
            display.width,
            display.height,
        );
        let pdf = canvas_to_pdf(canvas, &display, page_w, page_h, dpr);

        // Invert by hand: css = pdf scaled back, y re-flipped.
        let css_x = pdf.x * display.width / page_w;
        let css_y = (page_h - pdf.y) * display.height / page_h;
        assert!(close(css_x, click.x));
        assert!(close(css_y, click.y));
    }

    #[test]
    fn test_unit_dpr_canvas_equals_css() {
        let display = PageDisplaySize::from_page_size(1, 200.0, 200.0);
        let pdf_a = canvas_to_pdf(CanvasPoint::new(30.0, 60.0), &display, 200.0, 200.0, 1.0);
        let pdf_b = css_to_pdf(CssPoint { x: 30.0, y: 60.0 }, &display, 200.0, 200.0);
        assert!(close(pdf_a.x, pdf_b.x));
        assert!(close(pdf_a.y, pdf_b.y));
    }
}
