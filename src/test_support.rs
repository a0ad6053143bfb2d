//! Recording fakes shared by the unit tests.

use anyhow::{Result, bail};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::adapter::host::{BackendHost, EmbedPlayer, MediaElement, Size};
use crate::core::positions::{KeyValueStorage, MemoryStorage};
use crate::core::telemetry::TelemetrySink;

/// Host-side call, in the order it reached the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InjectScript(String),
    // media element
    SetSource(String),
    Play,
    Pause,
    SetCurrentTime(f64),
    SetVolume(f64),
    Release,
    // embedded player
    CreateEmbed(String),
    PlayVideo,
    PauseVideo,
    SeekTo(f64),
    EmbedVolume(u8),
    SetSize(Size),
    DestroyEmbed,
}

impl Call {
    pub fn is_play(&self) -> bool {
        matches!(self, Call::Play | Call::PlayVideo)
    }

    pub fn is_seek(&self) -> bool {
        matches!(self, Call::SetCurrentTime(_) | Call::SeekTo(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Call> {
        self.0.lock().unwrap().last().cloned()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Media position and duration shared by a host and the handles it created
#[derive(Debug, Clone, Default)]
struct Clock {
    time: Arc<Mutex<f64>>,
    duration: Arc<Mutex<f64>>,
}

impl Clock {
    fn time(&self) -> f64 {
        *self.time.lock().unwrap()
    }

    fn set_time(&self, t: f64) {
        *self.time.lock().unwrap() = t;
    }

    fn duration(&self) -> f64 {
        *self.duration.lock().unwrap()
    }
}

pub struct FakeMediaElement {
    log: CallLog,
    clock: Clock,
}

impl MediaElement for FakeMediaElement {
    fn set_source(&mut self, url: &str) {
        self.log.push(Call::SetSource(url.to_string()));
    }

    fn play(&mut self) {
        self.log.push(Call::Play);
    }

    fn pause(&mut self) {
        self.log.push(Call::Pause);
    }

    fn set_current_time(&mut self, secs: f64) {
        self.clock.set_time(secs);
        self.log.push(Call::SetCurrentTime(secs));
    }

    fn current_time(&self) -> f64 {
        self.clock.time()
    }

    fn set_volume(&mut self, volume: f64) {
        self.log.push(Call::SetVolume(volume));
    }

    fn release(&mut self) {
        self.log.push(Call::Release);
    }
}

pub struct FakeEmbedPlayer {
    log: CallLog,
    clock: Clock,
}

impl EmbedPlayer for FakeEmbedPlayer {
    fn play_video(&mut self) {
        self.log.push(Call::PlayVideo);
    }

    fn pause_video(&mut self) {
        self.log.push(Call::PauseVideo);
    }

    fn seek_to(&mut self, secs: f64, _allow_seek_ahead: bool) {
        self.clock.set_time(secs);
        self.log.push(Call::SeekTo(secs));
    }

    fn set_volume(&mut self, percent: u8) {
        self.log.push(Call::EmbedVolume(percent));
    }

    fn current_time(&self) -> f64 {
        self.clock.time()
    }

    fn duration(&self) -> f64 {
        self.clock.duration()
    }

    fn set_size(&mut self, size: Size) {
        self.log.push(Call::SetSize(size));
    }

    fn destroy(&mut self) {
        self.log.push(Call::DestroyEmbed);
    }
}

/// Host recording every call. Clones share the log and the clock.
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    pub log: CallLog,
    clock: Clock,
    size: Option<Size>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Position reported by media handles
    pub fn set_time(&self, t: f64) {
        self.clock.set_time(t);
    }

    /// Duration reported by embedded players
    pub fn set_duration(&self, d: f64) {
        *self.clock.duration.lock().unwrap() = d;
    }
}

impl BackendHost for FakeHost {
    fn create_media_element(&mut self) -> Box<dyn MediaElement> {
        Box::new(FakeMediaElement {
            log: self.log.clone(),
            clock: self.clock.clone(),
        })
    }

    fn inject_script(&mut self, src: &str) {
        self.log.push(Call::InjectScript(src.to_string()));
    }

    fn create_embed_player(&mut self, video_id: &str, _size: Option<Size>) -> Box<dyn EmbedPlayer> {
        self.log.push(Call::CreateEmbed(video_id.to_string()));
        Box::new(FakeEmbedPlayer {
            log: self.log.clone(),
            clock: self.clock.clone(),
        })
    }

    fn host_size(&self) -> Option<Size> {
        self.size
    }
}

/// Storage whose every operation fails
#[derive(Debug, Default)]
pub struct FailingStorage;

impl KeyValueStorage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        bail!("storage unavailable (get {})", key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        bail!("quota exceeded (set {})", key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        bail!("storage unavailable (remove {})", key)
    }
}

/// Storage wrapper counting successful writes
#[derive(Debug, Default)]
pub struct CountingStorage<S = MemoryStorage> {
    inner: S,
    writes: AtomicUsize,
}

impl<S: KeyValueStorage> CountingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl<S: KeyValueStorage> KeyValueStorage for CountingStorage<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

/// Telemetry sink keeping every event
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingTelemetry {
    pub fn names(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().unwrap().clone()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn track_event(&self, name: &str, data: Value) {
        self.events.lock().unwrap().push((name.to_string(), data));
    }
}
