//! Playback backend interface.
//!
//! One trait, two implementations, dispatched statically through
//! `enum_dispatch`. The adapter picks the variant once per `load()` and never
//! branches on the backend kind afterwards.

use enum_dispatch::enum_dispatch;
use std::time::Instant;

use super::AdapterEvent;
use super::bootstrap::ScriptBootstrap;
use super::direct::DirectBackend;
use super::embedded::EmbeddedBackend;
use super::host::{BackendHost, HostEvent, Size};
use super::source::BackendKind;

/// What a backend may touch while handling a call.
pub struct BackendContext<'a> {
    pub host: &'a mut dyn BackendHost,
    pub bootstrap: &'a ScriptBootstrap,
    pub events: &'a mut Vec<AdapterEvent>,
}

impl BackendContext<'_> {
    pub fn emit(&mut self, event: AdapterEvent) {
        log::trace!("adapter event: {:?}", event);
        self.events.push(event);
    }
}

/// Uniform playback capability implemented by every backend.
#[enum_dispatch]
pub trait PlaybackBackend {
    fn kind(&self) -> BackendKind;

    /// Media can be controlled and reports time
    fn is_ready(&self) -> bool;

    fn play(&mut self);
    fn pause(&mut self);

    /// Jump to `secs`. Completion is reported as [`AdapterEvent::SeekConfirmed`].
    fn seek(&mut self, secs: f64, ctx: &mut BackendContext<'_>);

    /// Linear gain in [0, 1]
    fn set_volume(&mut self, volume: f64);

    fn current_time(&self) -> f64;

    fn resize(&mut self, size: Size);

    /// Advance timers
    fn tick(&mut self, now: Instant, ctx: &mut BackendContext<'_>);

    fn handle_event(&mut self, event: &HostEvent, ctx: &mut BackendContext<'_>);

    /// Stop timers and free host resources. The backend is unusable afterwards.
    fn destroy(&mut self);
}

#[enum_dispatch(PlaybackBackend)]
pub enum Backend {
    Direct(DirectBackend),
    Embedded(EmbeddedBackend),
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.kind())
            .field("ready", &self.is_ready())
            .finish()
    }
}
