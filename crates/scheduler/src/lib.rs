//! pdfmark scheduling primitives
//!
//! Two small building blocks used by the viewer:
//!
//! - [`CancellationToken`]: cooperative cancellation shared between the UI
//!   thread and render workers.
//! - [`RedrawDebouncer`]: per-page redraw deadlines with a fixed quiescence
//!   window, polled from the frame loop.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use pdfmark_scheduler::RedrawDebouncer;
//!
//! let mut debouncer = RedrawDebouncer::new();
//! let start = Instant::now();
//!
//! debouncer.schedule(1, start);
//! debouncer.schedule(1, start + Duration::from_millis(50));
//!
//! // Only one redraw comes due, at 50ms + the quiescence window.
//! assert!(debouncer.due_pages(start + Duration::from_millis(100)).is_empty());
//! assert_eq!(debouncer.due_pages(start + Duration::from_millis(150)), vec![1]);
//! ```

mod cancel;
mod debounce;

pub use cancel::CancellationToken;
pub use debounce::{RedrawDebouncer, DEFAULT_QUIESCENCE};
