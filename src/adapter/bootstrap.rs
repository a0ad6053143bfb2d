//! One-time provider script bootstrap, shared by every embedded backend.
//!
//! The first `ensure()` injects the script and moves to `Loading`. Every
//! later caller, from the same adapter or another one holding the same
//! `Arc<ScriptBootstrap>`, joins that in-flight load instead of injecting
//! again. The host reports completion through `mark_loaded()`.
//!
//! There is no timeout: a script that never loads keeps every waiting
//! backend un-ready.

use log::{debug, info};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::host::BackendHost;

/// Provider iframe API
pub const DEFAULT_EMBED_SCRIPT_URL: &str = "https://www.youtube.com/iframe_api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Idle,
    Loading,
    Loaded,
}

#[derive(Debug)]
pub struct ScriptBootstrap {
    script_url: String,
    state: Mutex<BootstrapState>,
    injections: AtomicUsize,
}

impl Default for ScriptBootstrap {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_SCRIPT_URL)
    }
}

impl ScriptBootstrap {
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            script_url: script_url.into(),
            state: Mutex::new(BootstrapState::Idle),
            injections: AtomicUsize::new(0),
        }
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == BootstrapState::Loaded
    }

    /// Start the bootstrap if nobody has; join it otherwise.
    ///
    /// Returns the state after the call.
    pub fn ensure(&self, host: &mut dyn BackendHost) -> BootstrapState {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            BootstrapState::Idle => {
                info!("ScriptBootstrap: injecting {}", self.script_url);
                host.inject_script(&self.script_url);
                self.injections.fetch_add(1, Ordering::Relaxed);
                *state = BootstrapState::Loading;
            }
            BootstrapState::Loading => {
                debug!("ScriptBootstrap: joining in-flight load");
            }
            BootstrapState::Loaded => {}
        }
        *state
    }

    /// Provider script is available
    pub fn mark_loaded(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != BootstrapState::Loaded {
            info!("ScriptBootstrap: provider script loaded");
            *state = BootstrapState::Loaded;
        }
    }

    /// How many times the script was injected (0 or 1)
    pub fn injection_count(&self) -> usize {
        self.injections.load(Ordering::Relaxed)
    }
}
