//! pdfmark - egui-based PDF markup tool
//!
//! Shell wiring the viewer crates together: toolbar, scrollable page
//! column, inline text editor, host bridge, and the debounced annotation
//! redraw loop.

use std::time::Instant;

use eframe::egui;
use tracing::{debug, info};

use pdfmark_core::annotation::{Annotation, AnnotationList, CanvasPoint};
use pdfmark_core::coords::{click_to_canvas, CssPoint, PageDisplaySize};
use pdfmark_core::export::flatten_annotations;
use pdfmark_host::{HostEvent, HostHandle, HostRequest, NativeSaveDialog};
use pdfmark_render::PdfDocument;
use pdfmark_scheduler::RedrawDebouncer;
use pdfmark_ui::{
    draw_page_annotations, ClickOutcome, DrawContext, EditMode, MarkupEditor, PageRasterizer,
    PdfiumSource, RasterEvent,
};

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 850.0])
            .with_min_inner_size([700.0, 500.0])
            .with_title("pdfmark"),
        ..Default::default()
    };

    eframe::run_native(
        "pdfmark",
        options,
        Box::new(|cc| Ok(Box::new(PdfMarkApp::new(cc)))),
    )
}

/// Per-page view state
struct PageView {
    display: PageDisplaySize,
    texture: Option<egui::TextureHandle>,
}

struct PdfMarkApp {
    // Host bridge (dialogs, filesystem)
    host: HostHandle,

    // Document state
    original_bytes: Option<Vec<u8>>,
    file_name: Option<String>,
    pages: Vec<PageView>,
    rasterizer: Option<PageRasterizer>,
    loading: bool,

    // Markup state
    annotations: AnnotationList,
    editor: MarkupEditor,
    debouncer: RedrawDebouncer,
    focus_inline: bool,

    // View state
    device_pixel_ratio: f32,
    error_dialog: Option<String>,
}

impl PdfMarkApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            host: HostHandle::spawn(NativeSaveDialog),
            original_bytes: None,
            file_name: None,
            pages: Vec::new(),
            rasterizer: None,
            loading: false,
            annotations: AnnotationList::new(),
            editor: MarkupEditor::new(),
            debouncer: RedrawDebouncer::new(),
            focus_inline: false,
            device_pixel_ratio: 1.0,
            error_dialog: None,
        }
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.error_dialog = Some(message.into());
    }

    /// Open a PDF file using the file picker
    fn open_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .pick_file()
        else {
            return;
        };

        match std::fs::read(&path) {
            Ok(bytes) => {
                self.file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                self.loading = true;
                // The host validates and echoes the bytes back; loading
                // continues in poll_host.
                self.host.send(HostRequest::OpenPdfContent(bytes));
            }
            Err(e) => {
                self.show_error(format!("Failed to read file: {}", e));
            }
        }
    }

    fn poll_host(&mut self) {
        while let Some(event) = self.host.poll() {
            match event {
                HostEvent::PdfData(bytes) => self.load_document(bytes),
                HostEvent::PdfError(message) => {
                    self.loading = false;
                    self.show_error(message);
                }
            }
        }
    }

    /// Replace the loaded document with `bytes`
    ///
    /// Resets all markup and page state, sizes every page at the fixed
    /// render zoom, and spawns a fresh rasterizer for the new bytes.
    fn load_document(&mut self, bytes: Vec<u8>) {
        self.annotations.clear();
        self.editor.reset();
        self.debouncer.clear();
        self.pages.clear();
        self.rasterizer = None;

        let document = match PdfDocument::from_bytes(bytes.clone()) {
            Ok(doc) => doc,
            Err(e) => {
                self.loading = false;
                self.show_error(format!("Failed to open PDF: {}", e));
                return;
            }
        };

        let page_count = document.page_count();
        for index in 0..page_count {
            match document.page_size(index) {
                Ok(size) => {
                    let page = index + 1;
                    self.pages.push(PageView {
                        display: PageDisplaySize::from_page_size(page, size.width, size.height),
                        texture: None,
                    });
                }
                Err(e) => {
                    self.loading = false;
                    self.show_error(format!("Failed to read page geometry: {}", e));
                    return;
                }
            }
        }

        info!(pages = page_count, "document loaded");
        let worker_bytes = bytes.clone();
        self.rasterizer = Some(PageRasterizer::spawn(move || {
            PdfiumSource::new(worker_bytes)
        }));
        self.original_bytes = Some(bytes);
        self.loading = false;

        for page in 1..=page_count {
            self.request_render_page(page);
        }
    }

    /// Queue a buffer render for `page` at the current pixel ratio.
    fn request_render_page(&mut self, page: u16) {
        let Some(view) = self.pages.get(page.saturating_sub(1) as usize) else {
            return;
        };
        let (width, height) = view.display.buffer_size(self.device_pixel_ratio);
        if let Some(rasterizer) = &mut self.rasterizer {
            rasterizer.request_render(page, width, height);
        }
    }

    fn pump_rasterizer(&mut self, ctx: &egui::Context) {
        let Some(rasterizer) = &mut self.rasterizer else {
            return;
        };

        let events = rasterizer.pump();
        for event in events {
            match event {
                RasterEvent::Presented { page } => {
                    let Some(rasterizer) = &self.rasterizer else {
                        continue;
                    };
                    let Some(surface) = rasterizer.surface(page) else {
                        continue;
                    };
                    let image = egui::ColorImage::from_rgba_unmultiplied(
                        [surface.width() as usize, surface.height() as usize],
                        surface.pixels(),
                    );
                    let handle = ctx.load_texture(
                        format!("page_{}", page),
                        image,
                        egui::TextureOptions::LINEAR,
                    );
                    if let Some(view) = self.pages.get_mut(page.saturating_sub(1) as usize) {
                        view.texture = Some(handle);
                    }
                }
                RasterEvent::Failed { page, message } => {
                    self.show_error(format!("Failed to render page {}: {}", page, message));
                }
            }
        }
    }

    /// Append a committed annotation and schedule the debounced redraw.
    fn commit_annotation(&mut self, annotation: Annotation) {
        debug!(page = annotation.page(), "annotation committed");
        self.annotations.push(annotation);
        self.on_annotations_changed();
    }

    /// Every annotated page gets a debounced re-render, not just the
    /// changed one; the quiescence window keeps this cheap.
    fn on_annotations_changed(&mut self) {
        self.debouncer
            .schedule_all(self.annotations.pages(), Instant::now());
    }

    /// Flatten annotations and hand the result to the host save dialog.
    fn save_annotated(&mut self) {
        let Some(original) = &self.original_bytes else {
            return;
        };
        let displays: Vec<PageDisplaySize> = self.pages.iter().map(|p| p.display).collect();

        match flatten_annotations(
            original,
            &self.annotations,
            &displays,
            self.device_pixel_ratio,
        ) {
            Ok(bytes) => {
                self.host.send(HostRequest::SavePdfDialog(bytes));
            }
            Err(e) => {
                self.show_error(format!("Failed to prepare PDF: {}", e));
            }
        }
    }

    fn mode_hint(&self) -> Option<&'static str> {
        match self.editor.mode() {
            EditMode::View => None,
            EditMode::SelectTextPos => Some("Click on the page to position the text"),
            EditMode::EditingInline => Some("Enter commits, Esc cancels"),
            EditMode::AddCross => Some("Click on the page to place a cross"),
        }
    }
}

impl eframe::App for PdfMarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let pixels_per_point = ctx.pixels_per_point();
        if (pixels_per_point - self.device_pixel_ratio).abs() > f32::EPSILON {
            self.device_pixel_ratio = pixels_per_point;
            // Buffer dimensions depend on the ratio; re-render everything.
            for page in 1..=self.pages.len() as u16 {
                self.request_render_page(page);
            }
        }

        self.poll_host();
        self.pump_rasterizer(ctx);

        for page in self.debouncer.due_pages(Instant::now()) {
            self.request_render_page(page);
        }

        self.draw_toolbar(ctx);
        self.draw_pages(ctx);
        self.draw_error_dialog(ctx);

        // Wake up for pending debounced redraws and in-flight renders.
        if let Some(deadline) = self.debouncer.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
        if self
            .rasterizer
            .as_ref()
            .map(|r| r.in_flight() > 0)
            .unwrap_or(false)
        {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        }
    }
}

impl PdfMarkApp {
    fn draw_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.add_space(8.0);

                if ui.button("📂 Open").clicked() {
                    self.open_file();
                }

                ui.separator();

                ui.add_enabled_ui(!self.pages.is_empty(), |ui| {
                    let text_armed = matches!(
                        self.editor.mode(),
                        EditMode::SelectTextPos | EditMode::EditingInline
                    );
                    // Arming commits any open inline edit, like focus loss.
                    if ui.selectable_label(text_armed, "Add Text").clicked() {
                        if let Some(annotation) = self.editor.arm_text() {
                            self.commit_annotation(annotation);
                        }
                    }

                    let cross_armed = self.editor.mode() == EditMode::AddCross;
                    if ui.selectable_label(cross_armed, "Add Cross").clicked() {
                        if let Some(annotation) = self.editor.arm_cross() {
                            self.commit_annotation(annotation);
                        }
                    }

                    ui.separator();

                    ui.add_enabled_ui(!self.annotations.is_empty(), |ui| {
                        if ui.button("💾 Save").clicked() {
                            self.save_annotated();
                        }
                    });
                });

                ui.separator();

                if self.loading {
                    ui.spinner();
                    ui.label("Loading…");
                } else if let Some(hint) = self.mode_hint() {
                    ui.weak(hint);
                } else if let Some(name) = &self.file_name {
                    ui.weak(name.clone());
                }
            });
        });
    }

    fn draw_pages(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.pages.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a PDF to get started");
                });
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for index in 0..self.pages.len() {
                        let page = (index + 1) as u16;
                        self.draw_page(ctx, ui, page);
                        ui.add_space(12.0);
                    }
                });
        });
    }

    fn draw_page(&mut self, ctx: &egui::Context, ui: &mut egui::Ui, page: u16) {
        let display = self.pages[(page - 1) as usize].display;
        let size = egui::vec2(display.width, display.height);

        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
        let painter = ui.painter_at(rect);

        painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
        if let Some(texture) = &self.pages[(page - 1) as usize].texture {
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        // Overlay committed annotations in list order.
        let mut overlay = EguiDrawContext {
            painter: &painter,
            origin: rect.min,
            device_pixel_ratio: self.device_pixel_ratio,
        };
        draw_page_annotations(&mut overlay, &self.annotations, page);

        let cursor = match self.editor.mode() {
            EditMode::SelectTextPos | EditMode::EditingInline => Some(egui::CursorIcon::Text),
            EditMode::AddCross => Some(egui::CursorIcon::Crosshair),
            EditMode::View => None,
        };
        let response = match cursor {
            Some(icon) => response.on_hover_cursor(icon),
            None => response,
        };

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let css = CssPoint {
                    x: pointer.x - rect.min.x,
                    y: pointer.y - rect.min.y,
                };
                let (buf_w, buf_h) = display.buffer_size(self.device_pixel_ratio);
                let canvas = click_to_canvas(
                    css,
                    buf_w as f32,
                    buf_h as f32,
                    display.width,
                    display.height,
                );
                match self.editor.canvas_clicked(page, canvas, css) {
                    ClickOutcome::None => {}
                    ClickOutcome::FocusInput => self.focus_inline = true,
                    ClickOutcome::Committed(annotation) => self.commit_annotation(annotation),
                }
            }
        }

        self.draw_inline_editor(ctx, rect, page);
    }

    fn draw_inline_editor(&mut self, ctx: &egui::Context, page_rect: egui::Rect, page: u16) {
        let Some(inline) = self.editor.inline() else {
            return;
        };
        if inline.page != page {
            return;
        }
        let anchor = page_rect.min + egui::vec2(inline.display.x, inline.display.y);

        enum InlineAction {
            Keep,
            Commit,
            Cancel,
        }
        let mut action = InlineAction::Keep;

        egui::Area::new(egui::Id::new("inline_text_editor"))
            .fixed_pos(anchor)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let Some(value) = self.editor.inline_value_mut() else {
                    return;
                };
                let output = ui.add(
                    egui::TextEdit::multiline(value)
                        .font(egui::FontId::proportional(16.0))
                        .desired_width(220.0)
                        .desired_rows(1),
                );

                if self.focus_inline {
                    output.request_focus();
                    self.focus_inline = false;
                }

                let (escape, enter, shift) = ui.input(|i| {
                    (
                        i.key_pressed(egui::Key::Escape),
                        i.key_pressed(egui::Key::Enter),
                        i.modifiers.shift,
                    )
                });

                // Escape is checked before commit paths: the widget drops
                // focus on Escape, which must not read as a blur commit.
                if escape {
                    action = InlineAction::Cancel;
                } else if enter && !shift && (output.has_focus() || output.lost_focus()) {
                    action = InlineAction::Commit;
                } else if output.lost_focus() {
                    action = InlineAction::Commit;
                }
            });

        match action {
            InlineAction::Keep => {}
            InlineAction::Commit => {
                if let Some(annotation) = self.editor.commit_inline() {
                    self.commit_annotation(annotation);
                }
            }
            InlineAction::Cancel => self.editor.cancel_inline(),
        }
    }

    fn draw_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error_dialog.clone() else {
            return;
        };

        let mut close = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });

        if close {
            self.error_dialog = None;
        }
    }
}

/// Adapter from the overlay's draw seam to the egui painter
///
/// Overlay coordinates and sizes arrive in canvas-buffer space; division
/// by the pixel ratio brings them back to the page's CSS-sized rect. Font
/// size and stroke width scale the same way, so the overlay keeps its
/// proportions at any pixel ratio.
struct EguiDrawContext<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    device_pixel_ratio: f32,
}

fn buffer_to_screen(origin: egui::Pos2, x: f32, y: f32, device_pixel_ratio: f32) -> egui::Pos2 {
    origin + egui::vec2(x / device_pixel_ratio, y / device_pixel_ratio)
}

fn buffer_to_logical(len: f32, device_pixel_ratio: f32) -> f32 {
    len / device_pixel_ratio
}

impl DrawContext for EguiDrawContext<'_> {
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_size: f32) {
        self.painter.text(
            buffer_to_screen(self.origin, x, y, self.device_pixel_ratio),
            egui::Align2::LEFT_TOP,
            text,
            egui::FontId::proportional(buffer_to_logical(font_size, self.device_pixel_ratio)),
            egui::Color32::BLACK,
        );
    }

    fn stroke_line(&mut self, from: CanvasPoint, to: CanvasPoint, width: f32) {
        self.painter.line_segment(
            [
                buffer_to_screen(self.origin, from.x, from.y, self.device_pixel_ratio),
                buffer_to_screen(self.origin, to.x, to.y, self.device_pixel_ratio),
            ],
            egui::Stroke::new(
                buffer_to_logical(width, self.device_pixel_ratio),
                egui::Color32::BLACK,
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_points_scale_by_pixel_ratio() {
        let origin = egui::pos2(10.0, 20.0);
        assert_eq!(
            buffer_to_screen(origin, 150.0, 300.0, 2.0),
            egui::pos2(85.0, 170.0)
        );
        assert_eq!(
            buffer_to_screen(origin, 150.0, 300.0, 1.0),
            egui::pos2(160.0, 320.0)
        );
    }

    #[test]
    fn test_overlay_sizes_scale_like_points() {
        // A 16 buffer-pixel font displays at 16 / pixel-ratio logical
        // points, matching how the cross geometry scales.
        assert_eq!(buffer_to_logical(16.0, 2.0), 8.0);
        assert_eq!(buffer_to_logical(2.0, 2.0), 1.0);
        assert_eq!(buffer_to_logical(16.0, 1.0), 16.0);
    }
}
