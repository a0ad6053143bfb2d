//! Playback adapter - one uniform control surface over two backends.
//!
//! `load(url)` classifies the source and builds exactly one backend:
//! a [`DirectBackend`] for plain media files, an [`EmbeddedBackend`] for
//! provider links. Callers only see the uniform operations and the
//! [`AdapterEvent`] stream collected by [`PlaybackAdapter::drain_events`].
//!
//! The adapter is passive: the owner feeds it host callbacks through
//! `handle_host_event` and advances its timers with `tick(now)`.

pub mod backend;
pub mod bootstrap;
pub mod direct;
pub mod embedded;
pub mod host;
pub mod poll_timer;
pub mod resize;
pub mod source;

use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use backend::{Backend, BackendContext, PlaybackBackend};
pub use bootstrap::{BootstrapState, DEFAULT_EMBED_SCRIPT_URL, ScriptBootstrap};
pub use direct::DirectBackend;
pub use embedded::{EmbedPhase, EmbeddedBackend};
pub use host::{
    BackendHost, EmbedEvent, EmbedPlayer, EmbedState, HostEvent, MediaElement, MediaEvent, Size,
};
pub use poll_timer::{DEFAULT_POLL_INTERVAL, PollTimer};
pub use resize::ResizeObserver;
pub use source::{BackendKind, SourceKind};

/// Events reported by the active backend
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    Ready,
    TimeUpdate(f64),
    DurationKnown(f64),
    /// Last seek reached its target (synthesized for embedded sources)
    SeekConfirmed,
    Ended,
}

pub struct PlaybackAdapter {
    host: Box<dyn BackendHost>,
    bootstrap: Arc<ScriptBootstrap>,
    backend: Option<Backend>,
    resize: ResizeObserver,
    events: Vec<AdapterEvent>,
    poll_interval: Duration,
}

impl std::fmt::Debug for PlaybackAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackAdapter")
            .field("backend", &self.backend)
            .field("bootstrap", &self.bootstrap.state())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl PlaybackAdapter {
    /// `bootstrap` may be shared between adapters; the provider script is
    /// then injected once for all of them.
    pub fn new(host: Box<dyn BackendHost>, bootstrap: Arc<ScriptBootstrap>) -> Self {
        Self {
            host,
            bootstrap,
            backend: None,
            resize: ResizeObserver::new(),
            events: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replace the current source. The previous backend is torn down first.
    pub fn load(&mut self, url: &str, start_at: Option<f64>) {
        self.destroy();

        let source = SourceKind::detect(url);
        info!("PlaybackAdapter: {} source {}", source.backend(), url);

        let backend = match source {
            SourceKind::Direct { url } => {
                Backend::from(DirectBackend::open(&url, start_at, self.host.as_mut()))
            }
            SourceKind::Embedded { video_id } => {
                self.resize.connect();
                let size = self.host.host_size().and_then(|s| self.resize.observe(s));
                let mut ctx = BackendContext {
                    host: self.host.as_mut(),
                    bootstrap: &self.bootstrap,
                    events: &mut self.events,
                };
                Backend::from(EmbeddedBackend::open(
                    &video_id,
                    start_at,
                    self.poll_interval,
                    size,
                    &mut ctx,
                ))
            }
        };
        self.backend = Some(backend);
    }

    pub fn kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|b| b.kind())
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_ready())
    }

    pub fn bootstrap(&self) -> &Arc<ScriptBootstrap> {
        &self.bootstrap
    }

    pub fn is_observing_resize(&self) -> bool {
        self.resize.is_connected()
    }

    pub fn play(&mut self) {
        match self.backend.as_mut() {
            Some(b) => b.play(),
            None => debug!("PlaybackAdapter: play without source"),
        }
    }

    pub fn pause(&mut self) {
        if let Some(b) = self.backend.as_mut() {
            b.pause();
        }
    }

    pub fn seek(&mut self, secs: f64) {
        if self.backend.is_none() {
            debug!("PlaybackAdapter: seek without source");
        }
        self.with_backend(|b, ctx| b.seek(secs, ctx));
    }

    pub fn set_volume(&mut self, volume: f64) {
        if let Some(b) = self.backend.as_mut() {
            b.set_volume(volume);
        }
    }

    pub fn current_time(&self) -> f64 {
        self.backend.as_ref().map_or(0.0, |b| b.current_time())
    }

    pub fn tick(&mut self, now: Instant) {
        self.with_backend(|b, ctx| b.tick(now, ctx));
    }

    /// Route a native host callback to the active backend.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match &event {
            HostEvent::ScriptLoaded => self.bootstrap.mark_loaded(),
            HostEvent::Resized(size) => {
                if let Some(size) = self.resize.observe(*size) {
                    if let Some(b) = self.backend.as_mut() {
                        b.resize(size);
                    }
                }
                return;
            }
            HostEvent::Media(_) | HostEvent::Embed(_) => {}
        }
        self.with_backend(|b, ctx| b.handle_event(&event, ctx));
    }

    /// Events collected since the last call, in emission order
    pub fn drain_events(&mut self) -> Vec<AdapterEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tear down the backend, stop polling and disconnect resize observation.
    pub fn destroy(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.destroy();
        }
        self.resize.disconnect();
        self.events.clear();
    }

    fn with_backend<R>(
        &mut self,
        f: impl FnOnce(&mut Backend, &mut BackendContext<'_>) -> R,
    ) -> Option<R> {
        let Self {
            host,
            bootstrap,
            backend,
            events,
            ..
        } = self;
        let backend = backend.as_mut()?;
        let mut ctx = BackendContext {
            host: host.as_mut(),
            bootstrap,
            events,
        };
        Some(f(backend, &mut ctx))
    }
}

impl Drop for PlaybackAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, FakeHost};

    const EMBED_URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn adapter() -> (PlaybackAdapter, FakeHost) {
        let host = FakeHost::new();
        let adapter = PlaybackAdapter::new(Box::new(host.clone()), Arc::new(ScriptBootstrap::default()));
        (adapter, host)
    }

    #[test]
    fn test_backend_selected_by_url() {
        let (mut adapter, _host) = adapter();
        assert_eq!(adapter.kind(), None);

        adapter.load("a.mp4", None);
        assert_eq!(adapter.kind(), Some(BackendKind::Direct));
        assert!(!adapter.is_observing_resize());

        adapter.load(EMBED_URL, None);
        assert_eq!(adapter.kind(), Some(BackendKind::Embedded));
        assert!(adapter.is_observing_resize());
    }

    #[test]
    fn test_reload_tears_down_previous_backend() {
        let (mut adapter, host) = adapter();
        adapter.bootstrap().mark_loaded();
        adapter.load(EMBED_URL, None);
        adapter.load("b.mp4", None);

        let calls = host.log.calls();
        let destroyed = calls.iter().position(|c| *c == Call::DestroyEmbed);
        let created = calls.iter().position(|c| *c == Call::SetSource("b.mp4".into()));
        assert!(destroyed.is_some() && created.is_some());
        assert!(destroyed < created);
    }

    #[test]
    fn test_concurrent_loads_share_one_bootstrap() {
        let host = FakeHost::new();
        let bootstrap = Arc::new(ScriptBootstrap::default());
        let mut first = PlaybackAdapter::new(Box::new(host.clone()), bootstrap.clone());
        let mut second = PlaybackAdapter::new(Box::new(host.clone()), bootstrap.clone());

        first.load(EMBED_URL, None);
        first.load("https://www.youtube.com/watch?v=aaaaaaaaaaa", None);
        second.load(EMBED_URL, None);
        assert_eq!(host.log.count(|c| matches!(c, Call::InjectScript(_))), 1);

        // One load event reaches everybody waiting
        first.handle_host_event(HostEvent::ScriptLoaded);
        second.tick(Instant::now());
        assert_eq!(host.log.count(|c| matches!(c, Call::CreateEmbed(_))), 2);
        assert_eq!(bootstrap.injection_count(), 1);
    }

    #[test]
    fn test_resize_only_reaches_embedded_surface() {
        let (mut adapter, host) = adapter();
        adapter.load("a.mp4", None);
        adapter.handle_host_event(HostEvent::Resized(Size::new(640, 360)));

        adapter.bootstrap().mark_loaded();
        adapter.load(EMBED_URL, None);
        adapter.handle_host_event(HostEvent::Resized(Size::new(640, 360)));
        adapter.handle_host_event(HostEvent::Resized(Size::new(640, 360)));

        assert_eq!(host.log.count(|c| matches!(c, Call::SetSize(_))), 1);

        adapter.destroy();
        assert!(!adapter.is_observing_resize());
        adapter.handle_host_event(HostEvent::Resized(Size::new(320, 180)));
        assert_eq!(host.log.count(|c| matches!(c, Call::SetSize(_))), 1);
    }

    #[test]
    fn test_events_drained_in_order() {
        let (mut adapter, _host) = adapter();
        adapter.load("a.mp4", None);
        adapter.handle_host_event(HostEvent::Media(MediaEvent::LoadedMetadata { duration: 10.0 }));
        adapter.handle_host_event(HostEvent::Media(MediaEvent::TimeUpdate(1.0)));

        assert_eq!(
            adapter.drain_events(),
            vec![
                AdapterEvent::Ready,
                AdapterEvent::DurationKnown(10.0),
                AdapterEvent::TimeUpdate(1.0)
            ]
        );
        assert!(adapter.drain_events().is_empty());
        assert!(adapter.is_ready());
    }

    #[test]
    fn test_commands_without_source_are_ignored() {
        let (mut adapter, host) = adapter();
        adapter.play();
        adapter.seek(4.0);
        adapter.set_volume(0.5);
        adapter.destroy();

        assert_eq!(adapter.current_time(), 0.0);
        assert!(host.log.calls().is_empty());
    }
}
