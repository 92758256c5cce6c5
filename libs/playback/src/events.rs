use crate::client::FatalCategory;
use crate::session::PlaybackStatus;

/// Observable player events, published over a broadcast channel alongside
/// the session's accessors so the host UI can render controls and overlays.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    StatusChanged {
        attempt: u64,
        status: PlaybackStatus,
        reason: Option<String>,
    },
    VolumeChanged {
        volume: f64,
        muted: bool,
    },
    /// An in-place recovery was started for the current attempt.
    RecoveryStarted {
        attempt: u64,
        category: FatalCategory,
    },
}
