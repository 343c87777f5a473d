//! Flatten annotations into PDF page content streams
//!
//! The exporter appends drawing operators to each annotated page's content
//! stream: `BT`/`Tf`/`Td`/`Tj`/`ET` for text, `m`/`l`/`S` for cross
//! strokes, each group wrapped in `q`/`Q` so existing page content keeps
//! its graphics state. Pages that received text get a Helvetica font
//! resource registered under a private key.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId};
use thiserror::Error;

use crate::annotation::{Annotation, AnnotationList};
use crate::coords::{canvas_to_pdf, PageDisplaySize, RENDER_ZOOM};

/// Font size annotations are drawn with on screen, in CSS pixels.
pub const FONT_SIZE_CSS: f32 = 16.0;

/// Half the extent of a cross mark, in CSS pixels on screen and points in
/// the saved file.
pub const CROSS_HALF_SIZE: f32 = 10.0;

/// Stroke width for cross marks.
pub const CROSS_STROKE_WIDTH: f32 = 2.0;

/// Resource key the annotation font is registered under.
const FONT_RESOURCE_KEY: &str = "FMark";

/// Fallback page size when a page carries no usable MediaBox (US Letter).
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Errors that can occur while flattening annotations
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to save
    #[error("No annotations to save")]
    NoAnnotations,

    /// The document could not be parsed or rewritten
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Serialization failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flatten `annotations` into a copy of `original`
///
/// `display_sizes` gives each page's on-screen size at the fixed zoom;
/// `device_pixel_ratio` converts stored buffer coordinates back to CSS.
/// Annotations whose page is outside the document, or has no recorded
/// display size, are skipped without error. Returns the rewritten file as
/// bytes.
pub fn flatten_annotations(
    original: &[u8],
    annotations: &AnnotationList,
    display_sizes: &[PageDisplaySize],
    device_pixel_ratio: f32,
) -> Result<Vec<u8>, ExportError> {
    if annotations.is_empty() {
        return Err(ExportError::NoAnnotations);
    }

    let mut doc = Document::load_mem(original)?;
    let pages: BTreeMap<u32, ObjectId> = doc.get_pages();
    let page_count = pages.len() as u16;

    // Group operations per page, preserving list order within a page.
    let mut page_ops: BTreeMap<u16, (Vec<Operation>, bool)> = BTreeMap::new();

    for annotation in annotations.iter() {
        let page = annotation.page();
        if page == 0 || page > page_count {
            continue;
        }
        let Some(display) = display_sizes.iter().find(|d| d.page == page) else {
            continue;
        };
        let Some(page_id) = pages.get(&u32::from(page)).copied() else {
            continue;
        };

        let (page_w, page_h) = page_media_size(&doc, page_id);
        let position = canvas_to_pdf(
            annotation.position(),
            display,
            page_w,
            page_h,
            device_pixel_ratio,
        );

        let entry = page_ops.entry(page).or_default();
        match annotation {
            Annotation::Text { text, .. } => {
                entry.0.extend(text_operations(position.x, position.y, text));
                entry.1 = true;
            }
            Annotation::Cross { .. } => {
                entry.0.extend(cross_operations(position.x, position.y));
            }
        }
    }

    let needs_font = page_ops.values().any(|(_, has_text)| *has_text);
    let font_id = needs_font.then(|| {
        doc.add_object(dictionary! {
            "Type" => Object::Name(b"Font".to_vec()),
            "Subtype" => Object::Name(b"Type1".to_vec()),
            "BaseFont" => Object::Name(b"Helvetica".to_vec()),
        })
    });

    for (page, (operations, has_text)) in page_ops {
        let Some(page_id) = pages.get(&u32::from(page)).copied() else {
            continue;
        };
        if let (true, Some(font_id)) = (has_text, font_id) {
            register_page_font(&mut doc, page_id, FONT_RESOURCE_KEY, font_id)?;
        }
        append_page_operations(&mut doc, page_id, operations)?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)?;
    Ok(output)
}

/// Content-stream operators for one text annotation.
fn text_operations(x: f32, y: f32, text: &str) -> Vec<Operation> {
    // The on-screen font size is in CSS pixels at the render zoom, so the
    // saved size divides the zoom back out. The stored position is the top
    // of the text; Td wants the baseline.
    let size_pt = FONT_SIZE_CSS / RENDER_ZOOM;
    vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE_KEY.as_bytes().to_vec()),
                Object::Real(size_pt),
            ],
        ),
        Operation::new(
            "rg",
            vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
        ),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y - size_pt)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Content-stream operators for one cross annotation.
fn cross_operations(x: f32, y: f32) -> Vec<Operation> {
    let h = CROSS_HALF_SIZE;
    vec![
        Operation::new("q", vec![]),
        Operation::new("w", vec![Object::Real(CROSS_STROKE_WIDTH)]),
        Operation::new(
            "RG",
            vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
        ),
        Operation::new("m", vec![Object::Real(x - h), Object::Real(y - h)]),
        Operation::new("l", vec![Object::Real(x + h), Object::Real(y + h)]),
        Operation::new("S", vec![]),
        Operation::new("m", vec![Object::Real(x - h), Object::Real(y + h)]),
        Operation::new("l", vec![Object::Real(x + h), Object::Real(y - h)]),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Decode the page's content stream, append `operations`, re-encode.
fn append_page_operations(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<(), ExportError> {
    let existing = doc.get_page_content(page_id)?;
    let mut content = Content::decode(&existing)?;
    content.operations.extend(operations);
    let encoded = content.encode()?;
    doc.change_page_content(page_id, encoded)?;
    Ok(())
}

/// Register `font_id` under `key` in the page's Font resources
///
/// Both the Resources entry and its Font subdictionary may be inline or
/// indirect; all four combinations are handled.
fn register_page_font(
    doc: &mut Document,
    page_id: ObjectId,
    key: &str,
    font_id: ObjectId,
) -> Result<(), ExportError> {
    let resources_ref = match doc.get_dictionary(page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let font_dict_ref = {
        let resources = match resources_ref {
            Some(id) => doc.get_dictionary_mut(id)?,
            None => {
                let page = doc.get_dictionary_mut(page_id)?;
                if page.get(b"Resources").is_err() {
                    page.set("Resources", lopdf::Dictionary::new());
                }
                page.get_mut(b"Resources")?.as_dict_mut()?
            }
        };

        match resources.get(b"Font") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => {
                if resources.get(b"Font").is_err() {
                    resources.set("Font", lopdf::Dictionary::new());
                }
                let fonts = resources.get_mut(b"Font")?.as_dict_mut()?;
                fonts.set(key, Object::Reference(font_id));
                None
            }
        }
    };

    if let Some(id) = font_dict_ref {
        let fonts = doc.get_dictionary_mut(id)?;
        fonts.set(key, Object::Reference(font_id));
    }

    Ok(())
}

/// Page size in points from the MediaBox, with a Letter fallback.
fn page_media_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"MediaBox").ok())
        .and_then(|obj| match obj {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .and_then(|obj| obj.as_array().ok());

    if let Some(values) = media_box {
        if values.len() == 4 {
            let nums: Vec<f32> = values.iter().filter_map(object_as_f32).collect();
            if nums.len() == 4 {
                return (nums[2] - nums[0], nums[3] - nums[1]);
            }
        }
    }

    DEFAULT_PAGE_SIZE
}

fn object_as_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
