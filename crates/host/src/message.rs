//! Typed messages between the viewer and the host

/// Requests the viewer sends to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    /// Deliver the raw bytes of a PDF the user picked for opening.
    OpenPdfContent(Vec<u8>),

    /// Ask the host to offer a save dialog and write the bytes verbatim.
    SavePdfDialog(Vec<u8>),
}

/// Events the host sends back to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The opened document's bytes, echoed back after validation.
    PdfData(Vec<u8>),

    /// A host-side failure the user should see.
    PdfError(String),
}
