//! Host request handling
//!
//! `HostService` owns the save dialog and the filesystem writes. The
//! dialog sits behind the [`SaveDialog`] trait so tests can drive the
//! service without a display server.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::message::{HostEvent, HostRequest};

/// Default filename offered in the save dialog.
pub const DEFAULT_SAVE_FILE_NAME: &str = "annotated.pdf";

/// Abstraction over the native save-file dialog.
pub trait SaveDialog {
    /// Ask the user where to save. `None` means the dialog was cancelled.
    fn pick_save_path(&mut self, default_file_name: &str) -> Option<PathBuf>;
}

/// Save dialog backed by the platform's native file chooser.
#[derive(Debug, Default)]
pub struct NativeSaveDialog;

impl SaveDialog for NativeSaveDialog {
    fn pick_save_path(&mut self, default_file_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("PDF Documents", &["pdf"])
            .set_file_name(default_file_name)
            .save_file()
    }
}

/// Host-side request handler.
pub struct HostService<D: SaveDialog> {
    dialog: D,
}

impl HostService<NativeSaveDialog> {
    /// Service using the platform's native save dialog.
    pub fn native() -> Self {
        Self::new(NativeSaveDialog)
    }
}

impl<D: SaveDialog> HostService<D> {
    /// Create a service with a custom dialog implementation.
    pub fn new(dialog: D) -> Self {
        Self { dialog }
    }

    /// Handle one request
    ///
    /// Returns `None` when the request produces no event: a successful
    /// save, or a cancelled save dialog.
    pub fn handle(&mut self, request: HostRequest) -> Option<HostEvent> {
        match request {
            HostRequest::OpenPdfContent(bytes) => {
                if bytes.is_empty() {
                    warn!("open request carried no data");
                    return Some(HostEvent::PdfError(
                        "Received empty PDF content".to_string(),
                    ));
                }
                debug!(len = bytes.len(), "echoing opened document");
                Some(HostEvent::PdfData(bytes))
            }
            HostRequest::SavePdfDialog(bytes) => {
                if bytes.is_empty() {
                    warn!("save request carried no data");
                    return Some(HostEvent::PdfError("Nothing to save".to_string()));
                }

                let Some(path) = self.dialog.pick_save_path(DEFAULT_SAVE_FILE_NAME) else {
                    debug!("save dialog cancelled");
                    return None;
                };

                match fs::write(&path, &bytes) {
                    Ok(()) => {
                        info!(path = %path.display(), len = bytes.len(), "saved annotated PDF");
                        None
                    }
                    Err(e) => Some(HostEvent::PdfError(format!(
                        "Failed to save PDF: {}",
                        e
                    ))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dialog stub returning a preset answer and recording the default name.
    struct StubDialog {
        answer: Option<PathBuf>,
        seen_default: Option<String>,
    }

    impl StubDialog {
        fn returning(answer: Option<PathBuf>) -> Self {
            Self {
                answer,
                seen_default: None,
            }
        }
    }

    impl SaveDialog for StubDialog {
        fn pick_save_path(&mut self, default_file_name: &str) -> Option<PathBuf> {
            self.seen_default = Some(default_file_name.to_string());
            self.answer.clone()
        }
    }

    #[test]
    fn test_open_echoes_bytes() {
        let mut service = HostService::new(StubDialog::returning(None));
        let event = service.handle(HostRequest::OpenPdfContent(vec![1, 2, 3]));
        assert_eq!(event, Some(HostEvent::PdfData(vec![1, 2, 3])));
    }

    #[test]
    fn test_open_empty_is_an_error() {
        let mut service = HostService::new(StubDialog::returning(None));
        let event = service.handle(HostRequest::OpenPdfContent(Vec::new()));
        match event {
            Some(HostEvent::PdfError(msg)) => assert!(msg.contains("empty")),
            other => panic!("expected PdfError, got {:?}", other),
        }
    }

    #[test]
    fn test_save_cancel_emits_nothing_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = HostService::new(StubDialog::returning(None));

        let event = service.handle(HostRequest::SavePdfDialog(vec![9, 9]));
        assert!(event.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_writes_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.pdf");
        let mut service = HostService::new(StubDialog::returning(Some(target.clone())));

        let event = service.handle(HostRequest::SavePdfDialog(vec![0x25, 0x50, 0x44, 0x46]));
        assert!(event.is_none());
        assert_eq!(fs::read(&target).unwrap(), vec![0x25, 0x50, 0x44, 0x46]);
    }

    #[test]
    fn test_save_offers_default_filename() {
        let mut dialog = StubDialog::returning(None);
        dialog.pick_save_path(DEFAULT_SAVE_FILE_NAME);
        assert_eq!(dialog.seen_default.as_deref(), Some("annotated.pdf"));
    }

    #[test]
    fn test_save_write_failure_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory path cannot be written as a file.
        let mut service = HostService::new(StubDialog::returning(Some(dir.path().to_path_buf())));

        let event = service.handle(HostRequest::SavePdfDialog(vec![1]));
        match event {
            Some(HostEvent::PdfError(msg)) => assert!(msg.contains("Failed to save")),
            other => panic!("expected PdfError, got {:?}", other),
        }
    }

    #[test]
    fn test_save_empty_is_an_error() {
        let mut service = HostService::new(StubDialog::returning(None));
        let event = service.handle(HostRequest::SavePdfDialog(Vec::new()));
        assert!(matches!(event, Some(HostEvent::PdfError(_))));
    }
}
