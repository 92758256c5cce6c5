use crate::client::EventSink;
use crate::errors::PlaybackError;

/// Rendering surface the session drives.
///
/// The host UI owns the actual video element or window; the session only
/// needs this control seam, which keeps the core testable with a fake
/// surface and a fake client.
pub trait MediaSurface: Send + Sync {
    /// Assign a source and register metadata/error listeners on the sink.
    fn set_source(&self, uri: &str, sink: EventSink);

    /// Detach the current source and release listeners registered by
    /// `set_source`. Must be safe to call when no source is attached.
    fn clear_source(&self);

    /// Request playback. An `Err` means the host rejected the request,
    /// most commonly an autoplay policy restriction.
    fn play(&self) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn set_volume(&self, volume: f64);

    fn set_muted(&self, muted: bool);

    /// Whether the surface can open segmented manifests without a
    /// segmented client.
    fn plays_segmented_natively(&self) -> bool {
        false
    }

    /// Request fullscreen on the surface's container. Rejection is not a
    /// playback failure.
    fn enter_fullscreen(&self) -> Result<(), PlaybackError>;

    fn exit_fullscreen(&self);

    fn is_fullscreen(&self) -> bool {
        false
    }
}
