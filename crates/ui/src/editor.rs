//! Markup editing state machine
//!
//! Four modes drive annotation placement:
//!
//! - `View`: clicks do nothing.
//! - `SelectTextPos`: the next page click opens the inline text editor.
//! - `EditingInline`: the inline editor is open; Enter or focus loss
//!   commits, Escape cancels, a page click commits implicitly.
//! - `AddCross`: every page click commits a cross; the mode stays armed
//!   so several crosses can be placed in a row.
//!
//! The state machine is pure; the application shell feeds it clicks and
//! key events and renders whatever it says.

use pdfmark_core::annotation::{Annotation, CanvasPoint};
use pdfmark_core::coords::CssPoint;

/// Current editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    View,
    SelectTextPos,
    EditingInline,
    AddCross,
}

/// Transient state of the open inline text editor.
#[derive(Debug, Clone)]
pub struct InlineEditor {
    /// 1-based page the annotation will land on
    pub page: u16,
    /// Click position in canvas-buffer space (stored with the annotation)
    pub canvas: CanvasPoint,
    /// Click position in CSS space (where the editor widget is shown)
    pub display: CssPoint,
    /// Text typed so far
    pub value: String,
}

/// What a page click produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Nothing happened.
    None,

    /// The inline editor opened and wants keyboard focus.
    FocusInput,

    /// An annotation was committed and should be appended to the list.
    Committed(Annotation),
}

/// The markup editing state machine.
pub struct MarkupEditor {
    mode: EditMode,
    inline: Option<InlineEditor>,
}

impl MarkupEditor {
    pub fn new() -> Self {
        Self {
            mode: EditMode::View,
            inline: None,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Arm text placement. Toggles back to `View` if already armed
    ///
    /// A pending inline edit is committed first, the same as on focus
    /// loss; the caller must append the returned annotation.
    pub fn arm_text(&mut self) -> Option<Annotation> {
        let committed = self.commit_inline();
        self.mode = if self.mode == EditMode::SelectTextPos {
            EditMode::View
        } else {
            EditMode::SelectTextPos
        };
        committed
    }

    /// Arm cross placement. Toggles back to `View` if already armed
    ///
    /// Commits a pending inline edit like [`MarkupEditor::arm_text`].
    pub fn arm_cross(&mut self) -> Option<Annotation> {
        let committed = self.commit_inline();
        self.mode = if self.mode == EditMode::AddCross {
            EditMode::View
        } else {
            EditMode::AddCross
        };
        committed
    }

    /// Drop all editing state. Used when a new document is opened.
    pub fn reset(&mut self) {
        self.mode = EditMode::View;
        self.inline = None;
    }

    /// Handle a click on a page canvas
    ///
    /// `canvas` is the click in buffer space, `display` the same click in
    /// CSS space relative to the page's top-left corner.
    pub fn canvas_clicked(
        &mut self,
        page: u16,
        canvas: CanvasPoint,
        display: CssPoint,
    ) -> ClickOutcome {
        match self.mode {
            EditMode::View => ClickOutcome::None,
            EditMode::SelectTextPos => {
                self.inline = Some(InlineEditor {
                    page,
                    canvas,
                    display,
                    value: String::new(),
                });
                self.mode = EditMode::EditingInline;
                ClickOutcome::FocusInput
            }
            EditMode::EditingInline => match self.commit_inline() {
                Some(annotation) => ClickOutcome::Committed(annotation),
                None => ClickOutcome::None,
            },
            EditMode::AddCross => ClickOutcome::Committed(Annotation::Cross {
                page,
                position: canvas,
            }),
        }
    }

    /// Commit the inline editor's text
    ///
    /// Trims the text; whitespace-only input commits nothing. Either way
    /// the editor closes and the mode returns to `View`.
    pub fn commit_inline(&mut self) -> Option<Annotation> {
        let editor = self.inline.take()?;
        self.mode = EditMode::View;

        let trimmed = editor.value.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Annotation::Text {
            page: editor.page,
            position: editor.canvas,
            text: trimmed.to_string(),
        })
    }

    /// Close the inline editor without committing anything.
    pub fn cancel_inline(&mut self) {
        if self.inline.take().is_some() {
            self.mode = EditMode::View;
        }
    }

    /// The open inline editor, if any.
    pub fn inline(&self) -> Option<&InlineEditor> {
        self.inline.as_ref()
    }

    /// Mutable access to the inline editor's text for the input widget.
    pub fn inline_value_mut(&mut self) -> Option<&mut String> {
        self.inline.as_mut().map(|e| &mut e.value)
    }
}

impl Default for MarkupEditor {
    fn default() -> Self {
        Self::new()
    }
}
