//! Core engine modules - session, store, positions, sequencing
//!
//! These modules own the playback state, independent of any rendering host.

pub mod coordinator;
pub mod event_bus;
pub mod positions;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod telemetry;

// Re-exports for convenience
pub use coordinator::PlaybackCoordinator;
pub use event_bus::{SnapshotBus, Subscription};
pub use positions::{KeyValueStorage, PositionStore};
pub use sequencer::{SeekPhase, SeekSequencer};
pub use session::{PlayerSession, PresentationMode, VideoConfig};
pub use store::PlayerStore;
pub use telemetry::{LogTelemetry, NoopTelemetry, Telemetry, TelemetrySink};
