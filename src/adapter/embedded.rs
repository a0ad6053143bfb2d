//! Embedded-provider backend.
//!
//! Lifecycle:
//! 1. `AwaitingScript` - provider script bootstrap in flight (shared)
//! 2. `AwaitingPlayer` - player constructed, waiting for its ready callback
//! 3. `Ready` - controllable
//!
//! Commands issued before `Ready` are remembered and replayed on the ready
//! callback in a fixed order: volume, pending seek, then playback.
//!
//! The provider has no seek-completion callback, so every seek is reported
//! as confirmed the moment it is issued. Time updates are synthesized by a
//! [`PollTimer`] that runs only while playing.

use log::{debug, info, trace};
use std::time::{Duration, Instant};

use super::AdapterEvent;
use super::backend::{BackendContext, PlaybackBackend};
use super::bootstrap::BootstrapState;
use super::host::{EmbedEvent, EmbedPlayer, EmbedState, HostEvent, Size};
use super::poll_timer::PollTimer;
use super::source::BackendKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPhase {
    AwaitingScript,
    AwaitingPlayer,
    Ready,
}

pub struct EmbeddedBackend {
    video_id: String,
    phase: EmbedPhase,
    player: Option<Box<dyn EmbedPlayer>>,
    volume: f64,
    pending_seek: Option<f64>,
    /// Playback requested by the caller
    want_playing: bool,
    /// Provider is actually playing
    playing: bool,
    poll: PollTimer,
    size: Option<Size>,
    duration_known: bool,
    last_time: f64,
}

impl EmbeddedBackend {
    /// Start (or join) the provider bootstrap and create the player as soon
    /// as the script is available.
    pub fn open(
        video_id: &str,
        start_at: Option<f64>,
        poll_interval: Duration,
        size: Option<Size>,
        ctx: &mut BackendContext<'_>,
    ) -> Self {
        info!("EmbeddedBackend: loading video {}", video_id);
        let mut backend = Self {
            video_id: video_id.to_string(),
            phase: EmbedPhase::AwaitingScript,
            player: None,
            volume: 1.0,
            pending_seek: start_at.filter(|t| t.is_finite() && *t > 0.0),
            want_playing: false,
            playing: false,
            poll: PollTimer::new(poll_interval),
            size,
            duration_known: false,
            last_time: 0.0,
        };
        if ctx.bootstrap.ensure(ctx.host) == BootstrapState::Loaded {
            backend.create_player(ctx);
        }
        backend
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn phase(&self) -> EmbedPhase {
        self.phase
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_running()
    }

    fn create_player(&mut self, ctx: &mut BackendContext<'_>) {
        if self.phase != EmbedPhase::AwaitingScript {
            return;
        }
        debug!("EmbeddedBackend: creating player for {}", self.video_id);
        self.player = Some(ctx.host.create_embed_player(&self.video_id, self.size));
        self.phase = EmbedPhase::AwaitingPlayer;
    }

    /// Ready callback: volume, then pending seek, then playback.
    fn on_ready(&mut self, ctx: &mut BackendContext<'_>) {
        if self.phase != EmbedPhase::AwaitingPlayer {
            return;
        }
        let Some(player) = self.player.as_mut() else {
            return;
        };
        self.phase = EmbedPhase::Ready;
        info!("EmbeddedBackend: player ready ({})", self.video_id);

        player.set_volume(volume_percent(self.volume));
        if let Some(t) = self.pending_seek.take() {
            player.seek_to(t, true);
            self.last_time = t;
        }
        if self.want_playing {
            player.play_video();
            self.playing = true;
        }

        ctx.emit(AdapterEvent::Ready);
        self.check_duration(ctx);
    }

    fn check_duration(&mut self, ctx: &mut BackendContext<'_>) {
        if self.duration_known {
            return;
        }
        if let Some(player) = &self.player {
            let d = player.duration();
            if d.is_finite() && d > 0.0 {
                self.duration_known = true;
                ctx.emit(AdapterEvent::DurationKnown(d));
            }
        }
    }

    fn on_state_change(&mut self, state: EmbedState, ctx: &mut BackendContext<'_>) {
        trace!("EmbeddedBackend: state {:?}", state);
        match state {
            EmbedState::Playing => self.playing = true,
            EmbedState::Paused => {
                self.playing = false;
                self.poll.cancel();
            }
            EmbedState::Ended => {
                self.playing = false;
                self.want_playing = false;
                self.poll.cancel();
                ctx.emit(AdapterEvent::Ended);
            }
            EmbedState::Unstarted | EmbedState::Buffering | EmbedState::Cued => {}
        }
        self.check_duration(ctx);
    }
}

impl PlaybackBackend for EmbeddedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn is_ready(&self) -> bool {
        self.phase == EmbedPhase::Ready
    }

    fn play(&mut self) {
        self.want_playing = true;
        if let (EmbedPhase::Ready, Some(player)) = (self.phase, self.player.as_mut()) {
            player.play_video();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.want_playing = false;
        self.playing = false;
        self.poll.cancel();
        if let (EmbedPhase::Ready, Some(player)) = (self.phase, self.player.as_mut()) {
            player.pause_video();
        }
    }

    fn seek(&mut self, secs: f64, ctx: &mut BackendContext<'_>) {
        match (self.phase, self.player.as_mut()) {
            (EmbedPhase::Ready, Some(player)) => player.seek_to(secs, true),
            _ => self.pending_seek = Some(secs),
        }
        self.last_time = secs;
        // No completion callback exists
        ctx.emit(AdapterEvent::SeekConfirmed);
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
        if let (EmbedPhase::Ready, Some(player)) = (self.phase, self.player.as_mut()) {
            player.set_volume(volume_percent(self.volume));
        }
    }

    fn current_time(&self) -> f64 {
        match (self.phase, &self.player) {
            (EmbedPhase::Ready, Some(player)) => player.current_time(),
            _ => self.pending_seek.unwrap_or(self.last_time),
        }
    }

    fn resize(&mut self, size: Size) {
        self.size = Some(size);
        if let Some(player) = self.player.as_mut() {
            player.set_size(size);
        }
    }

    fn tick(&mut self, now: Instant, ctx: &mut BackendContext<'_>) {
        if self.phase == EmbedPhase::AwaitingScript && ctx.bootstrap.is_loaded() {
            self.create_player(ctx);
        }
        if self.phase != EmbedPhase::Ready {
            return;
        }

        if self.playing {
            if !self.poll.is_running() {
                self.poll.start(now);
            } else if self.poll.tick(now) {
                if let Some(player) = &self.player {
                    self.last_time = player.current_time();
                    ctx.emit(AdapterEvent::TimeUpdate(self.last_time));
                }
            }
        } else {
            self.poll.cancel();
        }
        self.check_duration(ctx);
    }

    fn handle_event(&mut self, event: &HostEvent, ctx: &mut BackendContext<'_>) {
        match event {
            HostEvent::ScriptLoaded => self.create_player(ctx),
            HostEvent::Embed(EmbedEvent::Ready) => self.on_ready(ctx),
            HostEvent::Embed(EmbedEvent::StateChange(state)) => self.on_state_change(*state, ctx),
            HostEvent::Media(_) | HostEvent::Resized(_) => {}
        }
    }

    fn destroy(&mut self) {
        info!("EmbeddedBackend: destroying {}", self.video_id);
        self.poll.cancel();
        if let Some(mut player) = self.player.take() {
            player.destroy();
        }
        self.playing = false;
        self.want_playing = false;
        self.phase = EmbedPhase::AwaitingScript;
    }
}

/// Provider volume scale
fn volume_percent(volume: f64) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::bootstrap::ScriptBootstrap;
    use crate::test_support::{Call, FakeHost};

    const POLL: Duration = Duration::from_millis(250);

    struct Rig {
        host: FakeHost,
        bootstrap: ScriptBootstrap,
        events: Vec<AdapterEvent>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                host: FakeHost::new(),
                bootstrap: ScriptBootstrap::default(),
                events: Vec::new(),
            }
        }

        fn ctx(&mut self) -> BackendContext<'_> {
            BackendContext {
                host: &mut self.host,
                bootstrap: &self.bootstrap,
                events: &mut self.events,
            }
        }

        /// Script loaded, player created and ready
        fn ready_backend(&mut self, start_at: Option<f64>) -> EmbeddedBackend {
            self.bootstrap.mark_loaded();
            let mut backend = EmbeddedBackend::open("dQw4w9WgXcQ", start_at, POLL, None, &mut self.ctx());
            backend.handle_event(&HostEvent::Embed(EmbedEvent::Ready), &mut self.ctx());
            self.events.clear();
            self.host.log.clear();
            backend
        }
    }

    #[test]
    fn test_waits_for_script_then_creates_player() {
        let mut rig = Rig::new();
        let mut backend = EmbeddedBackend::open("dQw4w9WgXcQ", None, POLL, None, &mut rig.ctx());

        assert_eq!(backend.phase(), EmbedPhase::AwaitingScript);
        assert_eq!(rig.host.log.count(|c| matches!(c, Call::InjectScript(_))), 1);

        rig.bootstrap.mark_loaded();
        backend.handle_event(&HostEvent::ScriptLoaded, &mut rig.ctx());
        assert_eq!(backend.phase(), EmbedPhase::AwaitingPlayer);
        assert_eq!(
            rig.host.log.last(),
            Some(Call::CreateEmbed("dQw4w9WgXcQ".into()))
        );
        assert!(!backend.is_ready());
    }

    #[test]
    fn test_ready_applies_volume_seek_play_in_order() {
        let mut rig = Rig::new();
        let mut backend = EmbeddedBackend::open("dQw4w9WgXcQ", None, POLL, None, &mut rig.ctx());
        backend.set_volume(0.4);
        backend.seek(30.0, &mut rig.ctx());
        backend.play();

        // Seek confirmation does not wait for the player
        assert_eq!(rig.events, vec![AdapterEvent::SeekConfirmed]);
        assert_eq!(backend.current_time(), 30.0);

        rig.bootstrap.mark_loaded();
        backend.tick(Instant::now(), &mut rig.ctx());
        rig.host.log.clear();
        backend.handle_event(&HostEvent::Embed(EmbedEvent::Ready), &mut rig.ctx());

        assert_eq!(
            rig.host.log.calls(),
            vec![Call::EmbedVolume(40), Call::SeekTo(30.0), Call::PlayVideo]
        );
        assert!(backend.is_ready());
        assert!(rig.events.contains(&AdapterEvent::Ready));
    }

    #[test]
    fn test_seek_confirmed_synchronously() {
        let mut rig = Rig::new();
        let mut backend = rig.ready_backend(None);

        backend.seek(5.0, &mut rig.ctx());
        assert_eq!(rig.host.log.calls(), vec![Call::SeekTo(5.0)]);
        assert_eq!(rig.events, vec![AdapterEvent::SeekConfirmed]);
    }

    #[test]
    fn test_poll_runs_only_while_playing() {
        let mut rig = Rig::new();
        let mut backend = rig.ready_backend(None);
        let t0 = Instant::now();
        rig.host.set_time(12.0);

        backend.tick(t0, &mut rig.ctx());
        assert!(!backend.is_polling());

        backend.play();
        backend.tick(t0, &mut rig.ctx());
        assert!(backend.is_polling());
        backend.tick(t0 + Duration::from_millis(100), &mut rig.ctx());
        assert!(rig.events.is_empty());

        backend.tick(t0 + Duration::from_millis(250), &mut rig.ctx());
        backend.tick(t0 + Duration::from_millis(500), &mut rig.ctx());
        assert_eq!(
            rig.events,
            vec![AdapterEvent::TimeUpdate(12.0), AdapterEvent::TimeUpdate(12.0)]
        );

        backend.pause();
        assert!(!backend.is_polling());
        rig.events.clear();
        backend.tick(t0 + Duration::from_millis(1_000), &mut rig.ctx());
        assert!(rig.events.is_empty());
    }

    #[test]
    fn test_duration_reported_once_known() {
        let mut rig = Rig::new();
        let mut backend = rig.ready_backend(None);
        let t0 = Instant::now();

        backend.tick(t0, &mut rig.ctx());
        assert!(rig.events.is_empty());

        rig.host.set_duration(212.0);
        backend.tick(t0, &mut rig.ctx());
        backend.tick(t0, &mut rig.ctx());
        assert_eq!(rig.events, vec![AdapterEvent::DurationKnown(212.0)]);
    }

    #[test]
    fn test_ended_stops_poll() {
        let mut rig = Rig::new();
        let mut backend = rig.ready_backend(None);
        backend.play();
        backend.tick(Instant::now(), &mut rig.ctx());

        backend.handle_event(
            &HostEvent::Embed(EmbedEvent::StateChange(EmbedState::Ended)),
            &mut rig.ctx(),
        );
        assert!(!backend.is_polling());
        assert_eq!(rig.events, vec![AdapterEvent::Ended]);
    }

    #[test]
    fn test_resize_and_destroy() {
        let mut rig = Rig::new();
        let mut backend = rig.ready_backend(Some(8.0));
        backend.resize(Size::new(480, 270));
        backend.play();
        backend.tick(Instant::now(), &mut rig.ctx());
        backend.destroy();

        let calls = rig.host.log.calls();
        assert!(calls.contains(&Call::SetSize(Size::new(480, 270))));
        assert_eq!(calls.last(), Some(&Call::DestroyEmbed));
        assert!(!backend.is_polling());
        assert!(!backend.is_ready());
    }

    #[test]
    fn test_volume_percent() {
        assert_eq!(volume_percent(0.0), 0);
        assert_eq!(volume_percent(0.555), 56);
        assert_eq!(volume_percent(3.0), 100);
    }
}
