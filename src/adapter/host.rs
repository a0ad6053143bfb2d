//! Host-side primitives the backends drive.
//!
//! The core never renders or decodes anything. The embedding host (a web
//! view, a native shell, a test) provides these handles and forwards their
//! native callbacks as [`HostEvent`]s.

/// Pixel size of the element hosting the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Direct-file media element (an HTML `<video>` or equivalent).
pub trait MediaElement: Send {
    fn set_source(&mut self, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn set_current_time(&mut self, secs: f64);
    fn current_time(&self) -> f64;
    /// Linear gain in [0, 1]
    fn set_volume(&mut self, volume: f64);
    /// Detach the source and free decoder resources
    fn release(&mut self);
}

/// Third-party embedded player instance, created once the provider script
/// has loaded.
pub trait EmbedPlayer: Send {
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn seek_to(&mut self, secs: f64, allow_seek_ahead: bool);
    /// Provider scale: 0..=100
    fn set_volume(&mut self, percent: u8);
    fn current_time(&self) -> f64;
    /// 0 while unknown
    fn duration(&self) -> f64;
    fn set_size(&mut self, size: Size);
    fn destroy(&mut self);
}

/// Factory and script loader provided by the host.
pub trait BackendHost: Send {
    fn create_media_element(&mut self) -> Box<dyn MediaElement>;

    /// Inject the provider script. Completion is reported later as
    /// [`HostEvent::ScriptLoaded`].
    fn inject_script(&mut self, src: &str);

    fn create_embed_player(&mut self, video_id: &str, size: Option<Size>) -> Box<dyn EmbedPlayer>;

    /// Current box of the hosting element, if measurable
    fn host_size(&self) -> Option<Size> {
        None
    }
}

/// Native callbacks of a direct media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata { duration: f64 },
    DurationChange(f64),
    TimeUpdate(f64),
    Seeked,
    Ended,
}

/// Provider player states, as reported by its state-change callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedState {
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Cued,
    Ended,
}

/// Native callbacks of an embedded player
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedEvent {
    Ready,
    StateChange(EmbedState),
}

/// Everything the host forwards into the adapter
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Media(MediaEvent),
    Embed(EmbedEvent),
    /// Provider script finished loading
    ScriptLoaded,
    /// Hosting element changed size
    Resized(Size),
}
