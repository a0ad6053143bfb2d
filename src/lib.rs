//! PIPSYNC - picture-in-picture playback coordination library
//!
//! One player session shared by every presentation surface, a dual-backend
//! playback adapter (direct file / embedded provider) and the sequencing that
//! keeps them in step.

// Core engine (session store, positions, seek sequencing)
pub mod core;

// Playback backends
pub mod adapter;

// App modules
pub mod cli;
pub mod config;
pub mod paths;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use adapter::{AdapterEvent, BackendHost, HostEvent, PlaybackAdapter, ScriptBootstrap};
pub use core::coordinator::PlaybackCoordinator;
pub use core::positions::{FileStorage, KeyValueStorage, MemoryStorage, PositionStore};
pub use core::session::{PipPosition, PipSize, PlayerSession, PresentationMode, VideoConfig};
pub use core::store::{PlayerStore, StoreOptions};
