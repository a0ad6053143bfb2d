//! Player state store - the single writer of the playback session.
//!
//! **Architecture**: one `PlayerStore` per running application, created by the
//! host and handed (cloned handle) to every surface and to the
//! [`PlaybackCoordinator`](super::coordinator::PlaybackCoordinator). Nothing
//! else mutates the session.
//!
//! Every command:
//! 1. validates its precondition (violations are ignored, never reported)
//! 2. mutates the session under the lock
//! 3. runs side effects outside the lock: position checkpoint, then telemetry
//! 4. publishes the new snapshot to all subscribers
//!
//! # Checkpoint policy
//!
//! `update_current_time(t)` persists `{video_id: t}` only when `floor(t)` is a
//! multiple of the checkpoint interval (10 s by default). Leaving the floating
//! player and switching videos always persist.

use log::{debug, info};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::event_bus::{SnapshotBus, Subscription};
use super::positions::PositionStore;
use super::session::{PipPosition, PipSize, PlayerSession, VideoConfig};
use super::telemetry::{Telemetry, events};

/// Default checkpoint interval in seconds
pub const DEFAULT_CHECKPOINT_INTERVAL_SECS: u32 = 10;

/// Positions closer than this are considered identical on restore
const RESTORE_EPSILON_SECS: f64 = 0.05;

/// Construction-time knobs (usually from [`PlayerPrefs`](crate::config::PlayerPrefs))
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    /// 0 disables time-based checkpoints
    pub checkpoint_interval_secs: u32,
    /// Volume of a freshly reset session
    pub default_volume: f64,
    pub pip_position: PipPosition,
    pub pip_size: PipSize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL_SECS,
            default_volume: 1.0,
            pip_position: PipPosition::default(),
            pip_size: PipSize::default(),
        }
    }
}

/// Side effects of one command, run after the session lock is released
#[derive(Default)]
struct Effects {
    checkpoint: Option<(String, f64)>,
    track: Vec<(&'static str, Value)>,
}

impl Effects {
    fn track(name: &'static str, data: Value) -> Self {
        Self {
            checkpoint: None,
            track: vec![(name, data)],
        }
    }
}

struct StoreShared {
    session: Mutex<PlayerSession>,
    bus: SnapshotBus<PlayerSession>,
    positions: Arc<PositionStore>,
    telemetry: Telemetry,
    options: StoreOptions,
}

/// Shared handle to the player state store.
#[derive(Clone)]
pub struct PlayerStore {
    shared: Arc<StoreShared>,
}

impl std::fmt::Debug for PlayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerStore")
            .field("session", &*self.lock())
            .field("options", &self.shared.options)
            .finish()
    }
}

impl PlayerStore {
    pub fn new(positions: Arc<PositionStore>) -> Self {
        Self::with_options(positions, Telemetry::disabled(), StoreOptions::default())
    }

    pub fn with_options(
        positions: Arc<PositionStore>,
        telemetry: Telemetry,
        options: StoreOptions,
    ) -> Self {
        let mut initial = PlayerSession::empty();
        initial.volume = clamp_volume(options.default_volume);
        initial.pip_position = options.pip_position;
        initial.pip_size = options.pip_size;

        info!(
            "PlayerStore initialized (checkpoint every {}s)",
            options.checkpoint_interval_secs
        );

        Self {
            shared: Arc::new(StoreShared {
                session: Mutex::new(initial.clone()),
                bus: SnapshotBus::with_initial(initial),
                positions,
                telemetry,
                options,
            }),
        }
    }

    // === Reads ===

    /// Current session snapshot
    pub fn snapshot(&self) -> PlayerSession {
        self.lock().clone()
    }

    /// Receive the current snapshot now and every later one, in order.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&PlayerSession) + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(callback)
    }

    pub fn positions(&self) -> &Arc<PositionStore> {
        &self.shared.positions
    }

    pub fn options(&self) -> &StoreOptions {
        &self.shared.options
    }

    // === Loading ===

    /// Load a video into the session.
    ///
    /// Resets everything except overlay preferences. The start position is
    /// `config.start_time` when given, else the saved position, else 0.
    pub fn initialize_video(&self, config: VideoConfig) {
        self.load_video(config, false);
    }

    /// `initialize_video` + `enter_floating` as one snapshot
    pub fn launch_floating_player(&self, config: VideoConfig) {
        self.load_video(config, true);
    }

    fn load_video(&self, config: VideoConfig, floating: bool) {
        if !config.is_valid() {
            debug!("PlayerStore: ignoring video config without id/url: {:?}", config);
            return;
        }

        let start_time = match config.start_time {
            Some(t) if t.is_finite() && t >= 0.0 => t,
            _ => self.shared.positions.load(&config.id).unwrap_or(0.0),
        };

        self.apply("initialize_video", |s| {
            let mut fx = Effects::default();
            if let Some(prev) = s.video_id.as_deref() {
                if prev != config.id {
                    fx.checkpoint = Some((prev.to_string(), s.current_time));
                }
            }

            let session_id = Uuid::new_v4();
            *s = PlayerSession {
                video_id: Some(config.id.clone()),
                source_url: Some(config.url.clone()),
                title: config.title.clone(),
                description: config.description.clone(),
                current_time: start_time,
                is_floating: floating,
                session_id: Some(session_id),
                ..self.blank_from(s)
            };

            info!(
                "PlayerStore: loaded '{}' at {:.1}s (floating: {})",
                config.id, start_time, floating
            );
            fx.track.push((
                events::VIDEO_INIT,
                json!({
                    "video_id": config.id,
                    "url": config.url,
                    "start_time": start_time,
                    "session_id": session_id,
                }),
            ));
            if floating {
                fx.track.push((events::FLOATING_ENTER, event_data(s, json!({}))));
            }
            Some(fx)
        });
    }

    // === Backend feedback ===

    /// Record the playback position reported by the backend.
    pub fn update_current_time(&self, secs: f64) {
        if !secs.is_finite() || secs < 0.0 {
            debug!("PlayerStore: ignoring invalid time {}", secs);
            return;
        }
        self.apply("update_current_time", |s| {
            let id = s.video_id.clone()?;
            s.current_time = s.clamp_time(secs);

            let mut fx = Effects::default();
            if self.is_checkpoint(secs) {
                fx.checkpoint = Some((id, s.current_time));
            }
            Some(fx)
        });
    }

    pub fn update_duration(&self, secs: f64) {
        if !secs.is_finite() || secs < 0.0 {
            debug!("PlayerStore: ignoring invalid duration {}", secs);
            return;
        }
        self.apply("update_duration", |s| {
            s.duration = secs;
            s.current_time = s.clamp_time(s.current_time);
            Some(Effects::default())
        });
    }

    // === Transport ===

    pub fn set_playing(&self, playing: bool) {
        self.apply("set_playing", |s| {
            s.is_playing = playing;
            Some(Effects::track(play_event(playing), event_data(s, json!({}))))
        });
    }

    pub fn toggle_play_pause(&self) {
        self.apply("toggle_play_pause", |s| {
            s.is_playing = !s.is_playing;
            Some(Effects::track(play_event(s.is_playing), event_data(s, json!({}))))
        });
    }

    /// Request a seek. Always implies resuming playback afterwards.
    ///
    /// The seek stays pending until the sequencer calls [`seek_handled`].
    ///
    /// [`seek_handled`]: PlayerStore::seek_handled
    pub fn seek_to(&self, secs: f64) {
        if !secs.is_finite() {
            debug!("PlayerStore: ignoring invalid seek target {}", secs);
            return;
        }
        self.apply("seek_to", |s| {
            s.video_id.as_ref()?;
            let target = s.clamp_time(secs);
            s.pending_seek = Some(target);
            s.is_playing = true;
            Some(Effects::track(
                events::VIDEO_SEEK,
                event_data(s, json!({ "from": s.current_time, "to": target })),
            ))
        });
    }

    /// Clear the pending seek. Called by the seek sequencer only.
    pub fn seek_handled(&self) {
        self.apply("seek_handled", |s| {
            s.pending_seek.take()?;
            Some(Effects::default())
        });
    }

    pub fn set_volume(&self, volume: f64) {
        if !volume.is_finite() {
            debug!("PlayerStore: ignoring invalid volume {}", volume);
            return;
        }
        self.apply("set_volume", |s| {
            s.volume = clamp_volume(volume);
            Some(Effects::default())
        });
    }

    // === Presentation ===

    pub fn hide(&self) {
        self.apply("hide", |s| {
            s.is_hidden = true;
            Some(Effects::default())
        });
    }

    pub fn restore(&self) {
        self.apply("restore", |s| {
            s.is_hidden = false;
            Some(Effects::default())
        });
    }

    pub fn enter_floating(&self) {
        self.apply("enter_floating", |s| {
            s.is_floating = true;
            Some(Effects::track(events::FLOATING_ENTER, event_data(s, json!({}))))
        });
    }

    /// Leave the floating player: persist the position, then hard-reset.
    ///
    /// The resulting session equals the empty default except for
    /// `pip_position` / `pip_size`.
    pub fn exit_floating(&self) {
        self.apply("exit_floating", |s| {
            let mut fx = Effects::track(
                events::FLOATING_EXIT,
                event_data(s, json!({ "position": s.current_time })),
            );
            if let Some(id) = &s.video_id {
                fx.checkpoint = Some((id.clone(), s.current_time));
            }
            *s = self.blank_from(s);
            Some(fx)
        });
    }

    pub fn set_floating_position(&self, position: PipPosition) {
        self.apply("set_floating_position", |s| {
            s.pip_position = position;
            Some(Effects::track(
                events::PIP_POSITION_CHANGED,
                event_data(s, json!({ "position": position.as_str() })),
            ))
        });
    }

    pub fn set_floating_size(&self, size: PipSize) {
        self.apply("set_floating_size", |s| {
            s.pip_size = size;
            Some(Effects::track(
                events::PIP_SIZE_CHANGED,
                event_data(s, json!({ "size": size.as_str() })),
            ))
        });
    }

    /// Collapse the floating player. Pauses and remembers the position.
    pub fn minimize_video(&self) {
        self.apply("minimize_video", |s| {
            if !s.is_floating || s.is_minimized {
                return None;
            }
            s.was_playing_before_minimize = s.is_playing;
            s.minimized_at = Some(s.current_time);
            s.is_minimized = true;
            s.is_fake_fullscreen = false;
            s.is_playing = false;
            Some(Effects::track(
                events::VIDEO_MINIMIZE,
                event_data(s, json!({ "position": s.current_time })),
            ))
        });
    }

    /// Expand the floating player and resume where it was minimized.
    ///
    /// If the position moved while minimized, a seek back is requested.
    pub fn restore_video(&self) {
        self.apply("restore_video", |s| {
            if !s.is_floating {
                return None;
            }
            s.is_minimized = false;
            s.is_playing = true;
            if let Some(at) = s.minimized_at.take() {
                if (s.current_time - at).abs() > RESTORE_EPSILON_SECS {
                    s.pending_seek = Some(at);
                }
                s.current_time = at;
            }
            Some(Effects::track(
                events::VIDEO_RESTORE,
                event_data(s, json!({ "position": s.current_time })),
            ))
        });
    }

    pub fn toggle_fake_fullscreen(&self) {
        self.apply("toggle_fake_fullscreen", |s| {
            if !s.is_floating || s.is_minimized {
                return None;
            }
            s.is_fake_fullscreen = !s.is_fake_fullscreen;
            Some(Effects::default())
        });
    }

    // === Internals ===

    fn lock(&self) -> MutexGuard<'_, PlayerSession> {
        self.shared.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one command. `f` returns `None` when its precondition fails.
    fn apply<F>(&self, command: &str, f: F) -> bool
    where
        F: FnOnce(&mut PlayerSession) -> Option<Effects>,
    {
        let (effects, snapshot) = {
            let mut session = self.lock();
            match f(&mut session) {
                Some(effects) => (effects, session.clone()),
                None => {
                    debug!("PlayerStore: {} ignored", command);
                    return false;
                }
            }
        };

        if let Some((video_id, secs)) = effects.checkpoint {
            self.shared.positions.save(&video_id, secs);
        }
        for (name, data) in effects.track {
            self.shared.telemetry.track(name, data);
        }

        self.shared.bus.publish(snapshot);
        true
    }

    /// Empty session carrying over the overlay preferences of `s`
    fn blank_from(&self, s: &PlayerSession) -> PlayerSession {
        let mut blank = s.reset_keeping_pip();
        blank.volume = clamp_volume(self.shared.options.default_volume);
        blank
    }

    fn is_checkpoint(&self, secs: f64) -> bool {
        let interval = self.shared.options.checkpoint_interval_secs as u64;
        interval > 0 && (secs.floor() as u64) % interval == 0
    }
}

fn clamp_volume(volume: f64) -> f64 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

fn play_event(playing: bool) -> &'static str {
    if playing {
        events::VIDEO_PLAY
    } else {
        events::VIDEO_PAUSE
    }
}

/// Common telemetry payload: video, session, position + extras
fn event_data(s: &PlayerSession, extra: Value) -> Value {
    let mut data = json!({
        "video_id": s.video_id,
        "session_id": s.session_id,
        "current_time": s.current_time,
    });
    if let (Some(base), Value::Object(extra)) = (data.as_object_mut(), extra) {
        base.extend(extra);
    }
    data
}
