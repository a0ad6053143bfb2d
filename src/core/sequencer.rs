//! Seek sequencer - orders seek and resume across backends.
//!
//! ```text
//!   pending_seek set            SeekConfirmed
//! Idle ──────────────► SeekIssued ──────────────► SeekConfirmed ──► Idle
//!                      (seek sent)                play() if resume,
//!                                                 seek_handled()
//! ```
//!
//! `play()` is never issued between a seek and its confirmation. For direct
//! files the confirmation is the element's `seeked` event; for embedded
//! players the adapter confirms as soon as the seek is sent, so the resume
//! follows immediately.

use log::debug;

use super::store::PlayerStore;
use crate::adapter::PlaybackAdapter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekPhase {
    Idle,
    SeekIssued { target: f64, resume: bool },
    SeekConfirmed { resume: bool },
}

#[derive(Debug)]
pub struct SeekSequencer {
    phase: SeekPhase,
}

impl Default for SeekSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl SeekSequencer {
    pub fn new() -> Self {
        Self {
            phase: SeekPhase::Idle,
        }
    }

    pub fn phase(&self) -> SeekPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == SeekPhase::Idle
    }

    /// Target of the seek awaiting confirmation
    pub fn in_flight_target(&self) -> Option<f64> {
        match self.phase {
            SeekPhase::SeekIssued { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Forward a pending seek to the adapter.
    ///
    /// `resume` is the playing flag of the session that carried the request.
    /// A new target while a seek is in flight is forwarded too but keeps the
    /// first request's `resume`. Repeating the in-flight target is a no-op.
    pub fn request(&mut self, target: f64, resume: bool, adapter: &mut PlaybackAdapter) {
        let resume = match self.phase {
            SeekPhase::SeekIssued {
                target: current,
                resume: first,
            } => {
                if current == target {
                    return;
                }
                debug!("SeekSequencer: retarget {:.2}s -> {:.2}s", current, target);
                first
            }
            _ => resume,
        };

        debug!("SeekSequencer: seek to {:.2}s (resume: {})", target, resume);
        self.phase = SeekPhase::SeekIssued { target, resume };
        adapter.seek(target);
    }

    /// Handle the adapter's confirmation.
    ///
    /// Returns the resume decision when a seek was in flight, `None` for a
    /// stray confirmation.
    pub fn confirm(&mut self, adapter: &mut PlaybackAdapter, store: &PlayerStore) -> Option<bool> {
        let SeekPhase::SeekIssued { resume, .. } = self.phase else {
            debug!("SeekSequencer: confirmation without seek in flight");
            return None;
        };

        self.phase = SeekPhase::SeekConfirmed { resume };
        if resume {
            adapter.play();
        }
        store.seek_handled();
        self.phase = SeekPhase::Idle;
        Some(resume)
    }

    /// Forget any in-flight seek (source changed)
    pub fn reset(&mut self) {
        self.phase = SeekPhase::Idle;
    }
}
