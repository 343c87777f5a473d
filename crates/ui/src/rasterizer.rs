//! Worker-thread page rasterizer with per-page cancellation
//!
//! One dedicated worker thread owns the render source (the PDFium document
//! re-opened from bytes; PDFium handles never cross threads). The UI side
//! keeps one slot per page holding a generation counter and a cancellation
//! token. Requesting a render for a page cancels the slot's previous job,
//! bumps the generation, and queues a new job; completions are polled each
//! frame and committed only when their generation still matches the slot.
//! A superseded or cancelled completion is dropped without comment.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use pdfmark_scheduler::CancellationToken;
use tracing::{debug, warn};

use crate::surface::PageSurface;

/// Failure modes of a render source
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderSourceError {
    /// The job was cancelled; absorbed silently, never shown to the user.
    #[error("render cancelled")]
    Cancelled,

    /// The render failed; reported for the affected page only.
    #[error("render failed: {0}")]
    Failed(String),
}

/// Something that can rasterize document pages to RGBA
///
/// Implementations live on the worker thread and do not need to be `Send`;
/// only the factory that creates them crosses threads.
pub trait RenderSource {
    /// Render `page` (1-based) at the given pixel dimensions.
    fn render_page(
        &mut self,
        page: u16,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderSourceError>;
}

/// Render source backed by a PDFium document
///
/// The document is opened lazily on first use, on the worker thread, from
/// the bytes captured at construction.
pub struct PdfiumSource {
    bytes: Vec<u8>,
    document: Option<pdfmark_render::PdfDocument>,
}

impl PdfiumSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            document: None,
        }
    }
}

impl RenderSource for PdfiumSource {
    fn render_page(
        &mut self,
        page: u16,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderSourceError> {
        if self.document.is_none() {
            let doc = pdfmark_render::PdfDocument::from_bytes(self.bytes.clone())
                .map_err(|e| RenderSourceError::Failed(e.to_string()))?;
            self.document = Some(doc);
        }
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| RenderSourceError::Failed("document unavailable".to_string()))?;

        if page == 0 {
            return Err(RenderSourceError::Failed(format!("invalid page {}", page)));
        }
        doc.render_page_rgba(page - 1, width, height)
            .map_err(|e| RenderSourceError::Failed(e.to_string()))
    }
}

/// Events produced by [`PageRasterizer::pump`].
#[derive(Debug, Clone, PartialEq)]
pub enum RasterEvent {
    /// A fresh surface was committed for the page.
    Presented { page: u16 },

    /// The page's render failed; other pages are unaffected.
    Failed { page: u16, message: String },
}

struct RenderJob {
    page: u16,
    generation: u64,
    width: u32,
    height: u32,
    token: CancellationToken,
}

struct RenderCompletion {
    page: u16,
    generation: u64,
    result: Result<PageSurface, RenderSourceError>,
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// Per-page render slots plus the worker thread feeding them.
pub struct PageRasterizer {
    jobs: Sender<RenderJob>,
    completions: Receiver<RenderCompletion>,
    slots: HashMap<u16, InFlight>,
    surfaces: HashMap<u16, PageSurface>,
    next_generation: u64,
}

impl PageRasterizer {
    /// Spawn a rasterizer around a render source
    ///
    /// `make_source` runs once on the worker thread, so the source itself
    /// never has to cross threads.
    pub fn spawn<S, F>(make_source: F) -> Self
    where
        S: RenderSource + 'static,
        F: FnOnce() -> S + Send + 'static,
    {
        let (job_tx, job_rx) = mpsc::channel::<RenderJob>();
        let (done_tx, done_rx) = mpsc::channel::<RenderCompletion>();

        thread::spawn(move || {
            let mut source = make_source();
            while let Ok(job) = job_rx.recv() {
                let result = if job.token.is_cancelled() {
                    Err(RenderSourceError::Cancelled)
                } else {
                    let rendered = source.render_page(job.page, job.width, job.height);
                    // A cancel that raced the render wins over its result.
                    if job.token.is_cancelled() {
                        Err(RenderSourceError::Cancelled)
                    } else {
                        rendered.and_then(|pixels| {
                            PageSurface::from_rgba(job.width, job.height, pixels).ok_or_else(
                                || {
                                    RenderSourceError::Failed(
                                        "render output has wrong dimensions".to_string(),
                                    )
                                },
                            )
                        })
                    }
                };

                let completion = RenderCompletion {
                    page: job.page,
                    generation: job.generation,
                    result,
                };
                if done_tx.send(completion).is_err() {
                    break;
                }
            }
            debug!("rasterizer worker exiting");
        });

        Self {
            jobs: job_tx,
            completions: done_rx,
            slots: HashMap::new(),
            surfaces: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Queue a render for `page` (1-based) at buffer pixel dimensions
    ///
    /// Any job already in flight for the page is cancelled first; its
    /// completion will fail the generation check and be dropped.
    pub fn request_render(&mut self, page: u16, width: u32, height: u32) {
        if let Some(slot) = self.slots.get(&page) {
            slot.token.cancel();
            // Give a mid-render worker a chance to observe the cancel
            // before the replacement job lands behind it in the queue.
            thread::yield_now();
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancellationToken::new();
        self.slots.insert(
            page,
            InFlight {
                generation,
                token: token.clone(),
            },
        );

        let job = RenderJob {
            page,
            generation,
            width,
            height,
            token,
        };
        if self.jobs.send(job).is_err() {
            warn!(page, "rasterizer worker is gone, dropping render request");
            self.slots.remove(&page);
        }
    }

    /// Drain completions, committing surfaces whose generation still matches.
    pub fn pump(&mut self) -> Vec<RasterEvent> {
        let mut events = Vec::new();
        loop {
            let completion = match self.completions.try_recv() {
                Ok(completion) => completion,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };

            let matches = self
                .slots
                .get(&completion.page)
                .map(|slot| slot.generation == completion.generation)
                .unwrap_or(false);
            if !matches {
                // Superseded by a newer request; ignore whatever happened.
                continue;
            }
            self.slots.remove(&completion.page);

            match completion.result {
                Ok(surface) => {
                    self.surfaces.insert(completion.page, surface);
                    events.push(RasterEvent::Presented {
                        page: completion.page,
                    });
                }
                Err(RenderSourceError::Cancelled) => {}
                Err(RenderSourceError::Failed(message)) => {
                    warn!(page = completion.page, %message, "page render failed");
                    events.push(RasterEvent::Failed {
                        page: completion.page,
                        message,
                    });
                }
            }
        }
        events
    }

    /// The committed front surface for a page, if one exists.
    pub fn surface(&self, page: u16) -> Option<&PageSurface> {
        self.surfaces.get(&page)
    }

    /// Number of renders currently in flight.
    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for PageRasterizer {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver as GateReceiver;
    use std::time::{Duration, Instant};

    /// Source that renders solid-color pages, optionally gated so the test
    /// controls when each render finishes.
    struct StubSource {
        fill: u8,
        gate: Option<GateReceiver<()>>,
        fail_page: Option<u16>,
    }

    impl RenderSource for StubSource {
        fn render_page(
            &mut self,
            page: u16,
            width: u32,
            height: u32,
        ) -> Result<Vec<u8>, RenderSourceError> {
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
            if self.fail_page == Some(page) {
                return Err(RenderSourceError::Failed("boom".to_string()));
            }
            self.fill = self.fill.wrapping_add(1);
            Ok(vec![self.fill; (width * height * 4) as usize])
        }
    }

    fn pump_until(rasterizer: &mut PageRasterizer, mut want: usize) -> Vec<RasterEvent> {
        let mut events = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        while want > 0 && Instant::now() < deadline {
            let batch = rasterizer.pump();
            want = want.saturating_sub(batch.len());
            events.extend(batch);
            thread::sleep(Duration::from_millis(2));
        }
        events
    }

    fn drain_in_flight(rasterizer: &mut PageRasterizer) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while rasterizer.in_flight() > 0 && Instant::now() < deadline {
            let _ = rasterizer.pump();
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_render_commits_surface() {
        let mut rasterizer = PageRasterizer::spawn(|| StubSource {
            fill: 0,
            gate: None,
            fail_page: None,
        });

        rasterizer.request_render(1, 4, 4);
        let events = pump_until(&mut rasterizer, 1);

        assert_eq!(events, vec![RasterEvent::Presented { page: 1 }]);
        let surface = rasterizer.surface(1).unwrap();
        assert_eq!(surface.width(), 4);
        assert_eq!(surface.pixels()[0], 1);
        assert_eq!(rasterizer.in_flight(), 0);
    }

    #[test]
    fn test_cancel_and_restart_presents_only_newer() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let mut rasterizer = PageRasterizer::spawn(move || StubSource {
            fill: 0,
            gate: Some(gate_rx),
            fail_page: None,
        });

        // First request is superseded before its render can finish.
        rasterizer.request_render(1, 2, 2);
        rasterizer.request_render(1, 2, 2);

        // Release both renders.
        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();

        // Exactly one presentation, no error, and a committed surface.
        let events = pump_until(&mut rasterizer, 1);
        assert_eq!(events, vec![RasterEvent::Presented { page: 1 }]);
        assert!(rasterizer.surface(1).is_some());

        drain_in_flight(&mut rasterizer);
        assert!(rasterizer.pump().is_empty());
    }

    #[test]
    fn test_failure_is_page_scoped() {
        let mut rasterizer = PageRasterizer::spawn(|| StubSource {
            fill: 0,
            gate: None,
            fail_page: Some(2),
        });

        rasterizer.request_render(1, 2, 2);
        rasterizer.request_render(2, 2, 2);

        let mut events = pump_until(&mut rasterizer, 2);
        events.sort_by_key(|e| match e {
            RasterEvent::Presented { page } => *page,
            RasterEvent::Failed { page, .. } => *page,
        });

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RasterEvent::Presented { page: 1 });
        assert!(matches!(&events[1], RasterEvent::Failed { page: 2, message } if message == "boom"));
        assert!(rasterizer.surface(1).is_some());
        assert!(rasterizer.surface(2).is_none());
    }

    #[test]
    fn test_stale_surface_survives_until_replacement() {
        let mut rasterizer = PageRasterizer::spawn(|| StubSource {
            fill: 0,
            gate: None,
            fail_page: None,
        });

        rasterizer.request_render(1, 2, 2);
        pump_until(&mut rasterizer, 1);
        let first = rasterizer.surface(1).unwrap().pixels()[0];

        rasterizer.request_render(1, 2, 2);
        // The old surface is still presentable while the new render runs.
        assert_eq!(rasterizer.surface(1).unwrap().pixels()[0], first);

        pump_until(&mut rasterizer, 1);
        assert_eq!(rasterizer.surface(1).unwrap().pixels()[0], first + 1);
    }
}
