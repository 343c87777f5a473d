//! Annotation data model
//!
//! Annotations are positioned in canvas-buffer space: device pixels of the
//! off-screen buffer the page is rendered into. That keeps click handling
//! and overlay drawing in one coordinate system; conversion to PDF points
//! happens only at save time (see [`crate::coords`]).

use std::collections::BTreeSet;

/// A point in canvas-buffer space (device pixels, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    /// Create a new canvas point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A single committed annotation
///
/// Pages are 1-based. The variants carry only what they need, so both the
/// overlay painter and the exporter match exhaustively; there is no
/// "unknown kind" path.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// Free text placed at a point
    Text {
        page: u16,
        position: CanvasPoint,
        text: String,
    },

    /// An X-shaped cross mark centered on a point
    Cross { page: u16, position: CanvasPoint },
}

impl Annotation {
    /// The 1-based page this annotation belongs to.
    pub fn page(&self) -> u16 {
        match self {
            Annotation::Text { page, .. } => *page,
            Annotation::Cross { page, .. } => *page,
        }
    }

    /// The anchor position in canvas-buffer space.
    pub fn position(&self) -> CanvasPoint {
        match self {
            Annotation::Text { position, .. } => *position,
            Annotation::Cross { position, .. } => *position,
        }
    }
}

/// Ordered, append-only collection of annotations
///
/// Insertion order is the draw order and the export order. There is no
/// removal; a new document load replaces the whole list via `clear`.
#[derive(Debug, Default, Clone)]
pub struct AnnotationList {
    items: Vec<Annotation>,
}

impl AnnotationList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an annotation.
    pub fn push(&mut self, annotation: Annotation) {
        self.items.push(annotation);
    }

    /// Iterate over all annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    /// Iterate over the annotations of one page, in insertion order.
    pub fn for_page(&self, page: u16) -> impl Iterator<Item = &Annotation> {
        self.items.iter().filter(move |a| a.page() == page)
    }

    /// The set of pages that have at least one annotation, ascending.
    pub fn pages(&self) -> BTreeSet<u16> {
        self.items.iter().map(|a| a.page()).collect()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no annotations have been committed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove everything. Used when a new document is opened.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// All annotations as a slice, in insertion order.
    pub fn as_slice(&self) -> &[Annotation] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(page: u16, x: f32, y: f32, s: &str) -> Annotation {
        Annotation::Text {
            page,
            position: CanvasPoint::new(x, y),
            text: s.to_string(),
        }
    }

    fn cross(page: u16, x: f32, y: f32) -> Annotation {
        Annotation::Cross {
            page,
            position: CanvasPoint::new(x, y),
        }
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut list = AnnotationList::new();
        list.push(cross(1, 10.0, 20.0));
        list.push(text(1, 30.0, 40.0, "note"));
        list.push(cross(2, 5.0, 5.0));

        let pages: Vec<u16> = list.iter().map(|a| a.page()).collect();
        assert_eq!(pages, vec![1, 1, 2]);
    }

    #[test]
    fn test_for_page_filters() {
        let mut list = AnnotationList::new();
        list.push(text(1, 0.0, 0.0, "a"));
        list.push(cross(2, 0.0, 0.0));
        list.push(text(2, 1.0, 1.0, "b"));

        assert_eq!(list.for_page(1).count(), 1);
        assert_eq!(list.for_page(2).count(), 2);
        assert_eq!(list.for_page(3).count(), 0);
    }

    #[test]
    fn test_pages_set_is_sorted_and_deduped() {
        let mut list = AnnotationList::new();
        list.push(cross(3, 0.0, 0.0));
        list.push(cross(1, 0.0, 0.0));
        list.push(cross(3, 9.0, 9.0));

        let pages: Vec<u16> = list.pages().into_iter().collect();
        assert_eq!(pages, vec![1, 3]);
    }

    #[test]
    fn test_clear() {
        let mut list = AnnotationList::new();
        list.push(cross(1, 0.0, 0.0));
        assert!(!list.is_empty());

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_annotation_accessors() {
        let a = text(4, 12.0, 34.0, "hello");
        assert_eq!(a.page(), 4);
        assert_eq!(a.position(), CanvasPoint::new(12.0, 34.0));

        let c = cross(2, 1.0, 2.0);
        assert_eq!(c.page(), 2);
        assert_eq!(c.position(), CanvasPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_serde_tagged_representation() {
        let a = cross(1, 3.0, 4.0);
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"kind\":\"cross\""));

        let back: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
