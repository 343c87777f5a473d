//! pdfmark host layer
//!
//! The privileged side of the application. The viewer never touches the
//! filesystem or native dialogs directly; it sends typed requests here and
//! receives typed events back. The service runs on its own thread behind
//! an mpsc bridge so a blocking save dialog never stalls the frame loop.

mod bridge;
mod message;
mod service;

pub use bridge::HostHandle;
pub use message::{HostEvent, HostRequest};
pub use service::{HostService, NativeSaveDialog, SaveDialog, DEFAULT_SAVE_FILE_NAME};
