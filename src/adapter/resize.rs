//! Hosting-element size observation for the embedded surface.

use log::trace;

use super::host::Size;

/// Tracks the hosting element's box while connected and reports changes.
///
/// Connected for embedded sources only; direct video scales through layout.
#[derive(Debug, Clone, Default)]
pub struct ResizeObserver {
    connected: bool,
    last: Option<Size>,
}

impl ResizeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self) {
        self.connected = true;
        self.last = None;
    }

    pub fn disconnect(&mut self) {
        if self.connected {
            trace!("ResizeObserver: disconnected");
        }
        self.connected = false;
        self.last = None;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_size(&self) -> Option<Size> {
        self.last
    }

    /// New size to propagate, if connected and actually changed
    pub fn observe(&mut self, size: Size) -> Option<Size> {
        if !self.connected || size.is_empty() || self.last == Some(size) {
            return None;
        }
        trace!("ResizeObserver: {}x{}", size.width, size.height);
        self.last = Some(size);
        Some(size)
    }
}
