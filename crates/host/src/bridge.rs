//! Thread bridge between the viewer and the host service
//!
//! The service runs on a dedicated thread; requests go in over one channel
//! and events come back over another. The viewer polls `poll()` from its
//! frame loop, so no callback crosses threads.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use tracing::debug;

use crate::message::{HostEvent, HostRequest};
use crate::service::{HostService, SaveDialog};

/// Handle to a host service running on its own thread
///
/// Dropping the handle closes the request channel, which ends the service
/// thread after it drains outstanding requests.
pub struct HostHandle {
    requests: Sender<HostRequest>,
    events: Receiver<HostEvent>,
}

impl HostHandle {
    /// Spawn a host service thread around `dialog`.
    pub fn spawn<D: SaveDialog + Send + 'static>(dialog: D) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<HostRequest>();
        let (event_tx, event_rx) = mpsc::channel::<HostEvent>();

        thread::spawn(move || {
            let mut service = HostService::new(dialog);
            while let Ok(request) = request_rx.recv() {
                if let Some(event) = service.handle(request) {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
            debug!("host service thread exiting");
        });

        Self {
            requests: request_tx,
            events: event_rx,
        }
    }

    /// Send a request to the host
    ///
    /// Returns false if the service thread has gone away.
    pub fn send(&self, request: HostRequest) -> bool {
        self.requests.send(request).is_ok()
    }

    /// Take the next pending event, if any.
    pub fn poll(&self) -> Option<HostEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
