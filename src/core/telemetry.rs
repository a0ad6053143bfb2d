//! Fire-and-forget telemetry.
//!
//! The store reports a handful of playback events (`video_init`,
//! `video_play`, ...) to whatever sink the host injects. Sinks must not block
//! and cannot fail from the store's point of view.

use log::debug;
use serde_json::Value;
use std::sync::Arc;

/// Event names reported by the store
pub mod events {
    pub const VIDEO_INIT: &str = "video_init";
    pub const VIDEO_PLAY: &str = "video_play";
    pub const VIDEO_PAUSE: &str = "video_pause";
    pub const VIDEO_SEEK: &str = "video_seek";
    pub const FLOATING_ENTER: &str = "floating_enter";
    pub const FLOATING_EXIT: &str = "floating_exit";
    pub const PIP_POSITION_CHANGED: &str = "pip_position_changed";
    pub const PIP_SIZE_CHANGED: &str = "pip_size_changed";
    pub const VIDEO_MINIMIZE: &str = "video_minimize";
    pub const VIDEO_RESTORE: &str = "video_restore";
}

/// Receiver of telemetry events.
pub trait TelemetrySink: Send + Sync {
    fn track_event(&self, name: &str, data: Value);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn track_event(&self, _name: &str, _data: Value) {}
}

/// Writes events to the debug log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn track_event(&self, name: &str, data: Value) {
        debug!("telemetry: {} {}", name, data);
    }
}

/// Optional sink wrapper held by the store
#[derive(Clone, Default)]
pub struct Telemetry {
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

impl Telemetry {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Report an event; no-op without a sink
    pub fn track(&self, name: &str, data: Value) {
        if let Some(sink) = &self.sink {
            sink.track_event(name, data);
        }
    }
}
