//! Playback coordinator - keeps the adapter in step with the store.
//!
//! Data flow:
//! ```text
//! surfaces ──commands──► PlayerStore ──snapshots──► coordinator ──► adapter
//!     ▲                      ▲                          │
//!     └──── snapshots ───────┴──── time / duration ◄────┘ (adapter events)
//! ```
//!
//! The coordinator subscribes to the store through a channel and is driven by
//! the host loop: `pump()` after commands, `tick(now)` every frame and
//! `handle_host_event()` for native callbacks. Snapshots queued between two
//! pumps are coalesced to the newest one.
//!
//! Transport sync (play/pause) is deferred while a seek is pending or in
//! flight; the sequencer owns resume for that window.

use crossbeam_channel::{Receiver, unbounded};
use log::{debug, info};
use std::time::Instant;
use uuid::Uuid;

use super::event_bus::Subscription;
use super::sequencer::{SeekPhase, SeekSequencer};
use super::session::PlayerSession;
use super::store::PlayerStore;
use crate::adapter::{AdapterEvent, HostEvent, PlaybackAdapter};

/// What has been pushed to the adapter so far
#[derive(Debug, Clone, Default, PartialEq)]
struct Applied {
    session_id: Option<Uuid>,
    playing: bool,
    volume: Option<f64>,
}

pub struct PlaybackCoordinator {
    store: PlayerStore,
    adapter: PlaybackAdapter,
    sequencer: SeekSequencer,
    snapshots: Receiver<PlayerSession>,
    subscription: Option<Subscription>,
    applied: Applied,
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("adapter", &self.adapter)
            .field("phase", &self.sequencer.phase())
            .field("applied", &self.applied)
            .finish()
    }
}

impl PlaybackCoordinator {
    pub fn new(store: PlayerStore, adapter: PlaybackAdapter) -> Self {
        let (tx, rx) = unbounded();
        let subscription = store.subscribe(move |snapshot| {
            // Receiver gone means the coordinator shut down
            let _ = tx.send(snapshot.clone());
        });

        let mut coordinator = Self {
            store,
            adapter,
            sequencer: SeekSequencer::new(),
            snapshots: rx,
            subscription: Some(subscription),
            applied: Applied::default(),
        };
        coordinator.pump();
        coordinator
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub fn adapter(&self) -> &PlaybackAdapter {
        &self.adapter
    }

    pub fn phase(&self) -> SeekPhase {
        self.sequencer.phase()
    }

    /// Apply queued snapshots and adapter events until both are drained.
    pub fn pump(&mut self) {
        loop {
            for event in self.adapter.drain_events() {
                self.on_adapter_event(event);
            }
            match self.snapshots.try_iter().last() {
                Some(snapshot) => self.apply(&snapshot),
                None => break,
            }
        }
    }

    /// Advance adapter timers
    pub fn tick(&mut self, now: Instant) {
        self.adapter.tick(now);
        self.pump();
    }

    /// Forward a native host callback
    pub fn handle_host_event(&mut self, event: HostEvent) {
        self.adapter.handle_host_event(event);
        self.pump();
    }

    /// Stop following the store and tear the adapter down.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("PlaybackCoordinator: shut down");
        }
        self.adapter.destroy();
        self.sequencer.reset();
        self.applied = Applied::default();
    }

    fn on_adapter_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::Ready => debug!("PlaybackCoordinator: backend ready"),
            AdapterEvent::TimeUpdate(t) => self.store.update_current_time(t),
            AdapterEvent::DurationKnown(d) => self.store.update_duration(d),
            AdapterEvent::SeekConfirmed => {
                if let Some(resume) = self.sequencer.confirm(&mut self.adapter, &self.store) {
                    self.applied.playing = resume;
                }
            }
            AdapterEvent::Ended => self.store.set_playing(false),
        }
    }

    fn apply(&mut self, s: &PlayerSession) {
        if s.session_id != self.applied.session_id {
            self.switch_source(s);
        }
        if !self.adapter.is_loaded() {
            return;
        }

        if self.applied.volume != Some(s.volume) {
            self.adapter.set_volume(s.volume);
            self.applied.volume = Some(s.volume);
        }

        if let Some(target) = s.pending_seek {
            self.sequencer.request(target, s.is_playing, &mut self.adapter);
            return;
        }
        if !self.sequencer.is_idle() {
            return;
        }

        if s.is_playing != self.applied.playing {
            if s.is_playing {
                self.adapter.play();
            } else {
                self.adapter.pause();
            }
            self.applied.playing = s.is_playing;
        }
    }

    fn switch_source(&mut self, s: &PlayerSession) {
        self.sequencer.reset();
        self.applied = Applied {
            session_id: s.session_id,
            ..Applied::default()
        };

        match s.source_url.as_deref() {
            Some(url) => {
                let start_at = (s.current_time > 0.0).then_some(s.current_time);
                self.adapter.load(url, start_at);
            }
            None => {
                if self.adapter.is_loaded() {
                    info!("PlaybackCoordinator: session cleared, releasing backend");
                }
                self.adapter.destroy();
            }
        }
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
