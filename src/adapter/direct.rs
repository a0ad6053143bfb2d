//! Direct-file backend over a host media element.
//!
//! The element fires native `timeupdate` and `seeked` events, so this backend
//! only translates them. A start position requested before metadata is
//! known is held back and applied on `LoadedMetadata`.

use log::{debug, info};
use std::time::Instant;

use super::AdapterEvent;
use super::backend::{BackendContext, PlaybackBackend};
use super::host::{BackendHost, HostEvent, MediaElement, MediaEvent, Size};
use super::source::BackendKind;

pub struct DirectBackend {
    element: Box<dyn MediaElement>,
    url: String,
    ready: bool,
    /// Seek target waiting for metadata
    pending_start: Option<f64>,
}

impl DirectBackend {
    pub fn open(url: &str, start_at: Option<f64>, host: &mut dyn BackendHost) -> Self {
        info!("DirectBackend: loading {}", url);
        let mut element = host.create_media_element();
        element.set_source(url);
        Self {
            element,
            url: url.to_string(),
            ready: false,
            pending_start: start_at.filter(|t| t.is_finite() && *t > 0.0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PlaybackBackend for DirectBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Direct
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn play(&mut self) {
        self.element.play();
    }

    fn pause(&mut self) {
        self.element.pause();
    }

    fn seek(&mut self, secs: f64, _ctx: &mut BackendContext<'_>) {
        if self.ready {
            self.element.set_current_time(secs);
        } else {
            debug!("DirectBackend: seek to {:.2}s deferred until metadata", secs);
            self.pending_start = Some(secs);
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.element.set_volume(volume.clamp(0.0, 1.0));
    }

    fn current_time(&self) -> f64 {
        if self.ready {
            self.element.current_time()
        } else {
            self.pending_start.unwrap_or(0.0)
        }
    }

    fn resize(&mut self, _size: Size) {
        // Scales by layout
    }

    fn tick(&mut self, _now: Instant, _ctx: &mut BackendContext<'_>) {}

    fn handle_event(&mut self, event: &HostEvent, ctx: &mut BackendContext<'_>) {
        let HostEvent::Media(event) = event else {
            return;
        };
        match *event {
            MediaEvent::LoadedMetadata { duration } => {
                if self.ready {
                    return;
                }
                self.ready = true;
                if let Some(t) = self.pending_start.take() {
                    self.element.set_current_time(t);
                }
                ctx.emit(AdapterEvent::Ready);
                if duration.is_finite() && duration > 0.0 {
                    ctx.emit(AdapterEvent::DurationKnown(duration));
                }
            }
            MediaEvent::DurationChange(d) => {
                if d.is_finite() && d > 0.0 {
                    ctx.emit(AdapterEvent::DurationKnown(d));
                }
            }
            MediaEvent::TimeUpdate(t) => ctx.emit(AdapterEvent::TimeUpdate(t)),
            MediaEvent::Seeked => ctx.emit(AdapterEvent::SeekConfirmed),
            MediaEvent::Ended => ctx.emit(AdapterEvent::Ended),
        }
    }

    fn destroy(&mut self) {
        info!("DirectBackend: releasing {}", self.url);
        self.element.pause();
        self.element.release();
        self.ready = false;
    }
}
