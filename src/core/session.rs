//! Player session model - the one mutable record behind every surface.
//!
//! `PlayerSession` is owned by [`PlayerStore`](super::store::PlayerStore).
//! Surfaces only ever see clones of it (snapshots) and change it through
//! store commands.
//!
//! # Presentation flags
//!
//! - `is_floating`: picture-in-picture overlay active
//! - `is_minimized`: overlay collapsed to an indicator (floating only)
//! - `is_fake_fullscreen`: overlay stretched over the page (floating only)
//! - `is_hidden`: visibility toggle, independent of the above
//!
//! `pip_position` / `pip_size` are user preferences and survive resets.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screen anchor of the floating overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl PipPosition {
    pub const ALL: [PipPosition; 5] = [
        PipPosition::TopLeft,
        PipPosition::TopRight,
        PipPosition::BottomLeft,
        PipPosition::BottomRight,
        PipPosition::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipPosition::TopLeft => "top-left",
            PipPosition::TopRight => "top-right",
            PipPosition::BottomLeft => "bottom-left",
            PipPosition::BottomRight => "bottom-right",
            PipPosition::Center => "center",
        }
    }
}

/// Size preset of the floating overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PipSize {
    pub const ALL: [PipSize; 3] = [PipSize::Small, PipSize::Medium, PipSize::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipSize::Small => "small",
            PipSize::Medium => "medium",
            PipSize::Large => "large",
        }
    }
}

/// What a surface should currently render.
///
/// Derived from the flags, never stored. Surfaces match on this instead of
/// re-deriving precedence themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    /// Nothing loaded, or visibility toggled off
    Hidden,
    /// Fixed, full-size panel
    Panel,
    /// Picture-in-picture overlay at `pip_position` / `pip_size`
    Floating,
    /// Overlay stretched over the page
    FakeFullscreen,
    /// Overlay collapsed to the minimized indicator
    Minimized,
}

/// Inbound configuration for `initialize_video` / `launch_floating_player`.
///
/// `id` and `url` are required; the rest default to empty / stored position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit start time in seconds; `None` restores the saved position
    #[serde(default)]
    pub start_time: Option<f64>,
}

impl VideoConfig {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: None,
            description: None,
            start_time: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_start_time(mut self, secs: f64) -> Self {
        self.start_time = Some(secs);
        self
    }

    /// Both required fields present
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// Snapshot of the single playback session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSession {
    pub video_id: Option<String>,
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,

    /// Seconds; never above `duration` once duration is known
    pub current_time: f64,
    /// Seconds; 0 until the backend reports it
    pub duration: f64,
    pub is_playing: bool,
    /// Linear gain in [0, 1]
    pub volume: f64,

    pub is_floating: bool,
    pub is_minimized: bool,
    pub was_playing_before_minimize: bool,
    pub is_hidden: bool,
    pub pip_position: PipPosition,
    pub pip_size: PipSize,
    pub is_fake_fullscreen: bool,

    /// Non-null exactly while a seek is issued but not yet handled
    pub pending_seek: Option<f64>,
    /// Position captured by `minimize_video`, consumed by `restore_video`
    pub minimized_at: Option<f64>,

    /// Telemetry correlation id, fresh per `initialize_video`
    pub session_id: Option<Uuid>,
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self::empty()
    }
}

impl PlayerSession {
    /// The empty session every process starts with
    pub fn empty() -> Self {
        Self {
            video_id: None,
            source_url: None,
            title: None,
            description: None,
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            volume: 1.0,
            is_floating: false,
            is_minimized: false,
            was_playing_before_minimize: false,
            is_hidden: false,
            pip_position: PipPosition::default(),
            pip_size: PipSize::default(),
            is_fake_fullscreen: false,
            pending_seek: None,
            minimized_at: None,
            session_id: None,
        }
    }

    /// Empty session that keeps this session's overlay preferences
    pub fn reset_keeping_pip(&self) -> Self {
        Self {
            pip_position: self.pip_position,
            pip_size: self.pip_size,
            ..Self::empty()
        }
    }

    pub fn has_video(&self) -> bool {
        self.video_id.is_some()
    }

    /// Duration reported by the backend, if any
    pub fn known_duration(&self) -> Option<f64> {
        (self.duration > 0.0).then_some(self.duration)
    }

    /// Clamp a time value into [0, duration] (upper bound only when known)
    pub fn clamp_time(&self, secs: f64) -> f64 {
        let secs = secs.max(0.0);
        match self.known_duration() {
            Some(duration) => secs.min(duration),
            None => secs,
        }
    }

    pub fn presentation(&self) -> PresentationMode {
        if self.is_hidden || !self.has_video() {
            return PresentationMode::Hidden;
        }
        if !self.is_floating {
            return PresentationMode::Panel;
        }
        if self.is_minimized {
            PresentationMode::Minimized
        } else if self.is_fake_fullscreen {
            PresentationMode::FakeFullscreen
        } else {
            PresentationMode::Floating
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_defaults() {
        let s = PlayerSession::empty();
        assert!(s.video_id.is_none());
        assert_eq!(s.volume, 1.0);
        assert_eq!(s.pip_position, PipPosition::BottomRight);
        assert_eq!(s.pip_size, PipSize::Medium);
        assert!(s.pending_seek.is_none());
        assert_eq!(s.presentation(), PresentationMode::Hidden);
    }

    #[test]
    fn test_reset_keeps_pip_only() {
        let mut s = PlayerSession::empty();
        s.video_id = Some("v1".into());
        s.current_time = 42.0;
        s.is_floating = true;
        s.volume = 0.3;
        s.pip_position = PipPosition::TopLeft;
        s.pip_size = PipSize::Large;

        let reset = s.reset_keeping_pip();
        let mut expected = PlayerSession::empty();
        expected.pip_position = PipPosition::TopLeft;
        expected.pip_size = PipSize::Large;
        assert_eq!(reset, expected);
    }

    #[test]
    fn test_clamp_time() {
        let mut s = PlayerSession::empty();
        assert_eq!(s.clamp_time(500.0), 500.0);
        assert_eq!(s.clamp_time(-3.0), 0.0);
        s.duration = 120.0;
        assert_eq!(s.clamp_time(500.0), 120.0);
    }

    #[test]
    fn test_presentation_precedence() {
        let mut s = PlayerSession::empty();
        s.video_id = Some("v1".into());
        assert_eq!(s.presentation(), PresentationMode::Panel);

        s.is_floating = true;
        assert_eq!(s.presentation(), PresentationMode::Floating);

        s.is_fake_fullscreen = true;
        assert_eq!(s.presentation(), PresentationMode::FakeFullscreen);

        s.is_fake_fullscreen = false;
        s.is_minimized = true;
        assert_eq!(s.presentation(), PresentationMode::Minimized);

        s.is_hidden = true;
        assert_eq!(s.presentation(), PresentationMode::Hidden);
    }

    #[test]
    fn test_video_config_validation() {
        assert!(VideoConfig::new("v1", "a.mp4").is_valid());
        assert!(!VideoConfig::new("", "a.mp4").is_valid());
        assert!(!VideoConfig::new("v1", "  ").is_valid());
    }

    #[test]
    fn test_video_config_from_json() {
        let cfg: VideoConfig =
            serde_json::from_str(r#"{"id":"v1","url":"a.mp4","start_time":null}"#).unwrap();
        assert_eq!(cfg.id, "v1");
        assert!(cfg.start_time.is_none());
        assert!(cfg.title.is_none());
    }
}
