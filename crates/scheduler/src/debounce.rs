//! Debounced per-page redraw scheduling
//!
//! When an annotation changes, every annotated page is queued for a redraw
//! after a short quiescence window. Scheduling a page again while its
//! window is open pushes the deadline back, so a burst of edits collapses
//! into a single redraw per page.
//!
//! The debouncer never touches the clock itself; callers pass `Instant`s
//! in, which keeps the frame loop in control and the tests deterministic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Quiescence window between the last change and the redraw.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(100);

/// Per-page redraw deadlines with debouncing.
///
/// Pages are 1-based throughout, matching the annotation model.
pub struct RedrawDebouncer {
    delay: Duration,
    deadlines: HashMap<u16, Instant>,
}

impl RedrawDebouncer {
    /// Create a debouncer with the default 100 ms quiescence window.
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_QUIESCENCE)
    }

    /// Create a debouncer with a custom quiescence window.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            deadlines: HashMap::new(),
        }
    }

    /// Schedule a redraw for `page`
    ///
    /// If the page already has a pending deadline it is replaced, so the
    /// redraw fires `delay` after the most recent change.
    pub fn schedule(&mut self, page: u16, now: Instant) {
        self.deadlines.insert(page, now + self.delay);
    }

    /// Schedule a redraw for every page in `pages`.
    pub fn schedule_all<I: IntoIterator<Item = u16>>(&mut self, pages: I, now: Instant) {
        for page in pages {
            self.schedule(page, now);
        }
    }

    /// Drain and return all pages whose deadline has passed, sorted.
    pub fn due_pages(&mut self, now: Instant) -> Vec<u16> {
        let mut due: Vec<u16> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(page, _)| *page)
            .collect();
        for page in &due {
            self.deadlines.remove(page);
        }
        due.sort_unstable();
        due
    }

    /// Earliest pending deadline, if any
    ///
    /// The frame loop uses this to request a wakeup instead of polling.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Number of pages with a pending redraw.
    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }

    /// Cancel all pending redraws.
    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}

impl Default for RedrawDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[test]
    fn test_schedule_fires_after_quiescence() {
        let mut debouncer = RedrawDebouncer::new();
        let start = Instant::now();

        debouncer.schedule(1, start);
        assert!(debouncer.due_pages(at(start, 99)).is_empty());
        assert_eq!(debouncer.due_pages(at(start, 100)), vec![1]);
    }

    #[test]
    fn test_double_schedule_within_window_fires_once() {
        let mut debouncer = RedrawDebouncer::new();
        let start = Instant::now();

        debouncer.schedule(3, start);
        debouncer.schedule(3, at(start, 60));

        // The first deadline was replaced, nothing is due at 100ms.
        assert!(debouncer.due_pages(at(start, 100)).is_empty());
        assert_eq!(debouncer.due_pages(at(start, 160)), vec![3]);
        assert_eq!(debouncer.pending(), 0);
    }

    #[test]
    fn test_due_pages_drains() {
        let mut debouncer = RedrawDebouncer::new();
        let start = Instant::now();

        debouncer.schedule(2, start);
        assert_eq!(debouncer.due_pages(at(start, 150)), vec![2]);
        assert!(debouncer.due_pages(at(start, 300)).is_empty());
    }

    #[test]
    fn test_schedule_all_returns_sorted() {
        let mut debouncer = RedrawDebouncer::new();
        let start = Instant::now();

        debouncer.schedule_all([5, 1, 3], start);
        assert_eq!(debouncer.pending(), 3);
        assert_eq!(debouncer.due_pages(at(start, 100)), vec![1, 3, 5]);
    }

    #[test]
    fn test_independent_pages_keep_own_deadlines() {
        let mut debouncer = RedrawDebouncer::new();
        let start = Instant::now();

        debouncer.schedule(1, start);
        debouncer.schedule(2, at(start, 80));

        assert_eq!(debouncer.due_pages(at(start, 110)), vec![1]);
        assert_eq!(debouncer.due_pages(at(start, 180)), vec![2]);
    }

    #[test]
    fn test_next_deadline() {
        let mut debouncer = RedrawDebouncer::new();
        let start = Instant::now();

        assert!(debouncer.next_deadline().is_none());

        debouncer.schedule(1, at(start, 50));
        debouncer.schedule(2, start);
        assert_eq!(debouncer.next_deadline(), Some(at(start, 100)));
    }

    #[test]
    fn test_clear_cancels_pending() {
        let mut debouncer = RedrawDebouncer::new();
        let start = Instant::now();

        debouncer.schedule_all([1, 2], start);
        debouncer.clear();

        assert_eq!(debouncer.pending(), 0);
        assert!(debouncer.due_pages(at(start, 500)).is_empty());
    }

    #[test]
    fn test_custom_delay() {
        let mut debouncer = RedrawDebouncer::with_delay(Duration::from_millis(10));
        let start = Instant::now();

        debouncer.schedule(1, start);
        assert_eq!(debouncer.due_pages(at(start, 10)), vec![1]);
    }
}
