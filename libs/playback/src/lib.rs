//! Adaptive stream playback core.
//!
//! Takes a stream locator, selects a playback strategy (segmented live,
//! direct file or external embed) and manages one recoverable playback
//! attempt at a time against a host-owned rendering surface.

pub mod classify;
pub mod client;
pub mod errors;
pub mod events;
pub mod session;
pub mod surface;

pub use classify::{PlaybackKind, classify};
pub use client::{
    EventPayload, EventSink, FatalCategory, SegmentedClient, SegmentedClientConfig,
    SegmentedClientFactory, SessionEvent,
};
pub use errors::PlaybackError;
pub use events::PlayerEvent;
pub use session::{PlaybackStatus, SessionOptions, StreamSession};
pub use surface::MediaSurface;

/// A playable source handed over by the match/channel data layer.
///
/// Only `uri` is consumed by the playback core; `title` is a human label
/// for the host UI.
#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct Source {
    pub title: Option<String>,
    pub uri: String,
}
