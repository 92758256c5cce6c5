use std::time::Duration;

use tokio::sync::mpsc;

/// Failure category a segmented client attaches to a fatal event.
///
/// `Network` and `Media` are recovered in place by the session; anything
/// `Other` is terminal for the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalCategory {
    Network,
    Media,
    Other,
}

/// Operating parameters for a segmented live-stream client.
#[derive(Debug, Clone)]
pub struct SegmentedClientConfig {
    /// Refresh the manifest aggressively to keep live latency low.
    pub low_latency: bool,
    /// Duration of already-played media retained for limited rewind.
    pub back_buffer: Duration,
    /// Download new segments in the background as they are announced.
    pub prefetch: bool,
}

impl Default for SegmentedClientConfig {
    fn default() -> Self {
        Self {
            low_latency: true,
            back_buffer: Duration::from_secs(90),
            prefetch: true,
        }
    }
}

/// One event from a client or surface, tagged with the attempt that
/// produced it so the session can discard anything superseded.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub attempt: u64,
    pub payload: EventPayload,
}

#[derive(Debug, Clone)]
pub enum EventPayload {
    /// The segmented client finished parsing the manifest.
    ManifestParsed,
    /// The rendering surface loaded media metadata.
    MetadataLoaded,
    /// The rendering surface reported a media error.
    SurfaceError { reason: String },
    /// The segmented client reported a failure it cannot absorb itself.
    Fatal {
        category: FatalCategory,
        reason: String,
    },
}

/// Attempt-tagged event sender handed to surfaces and segmented clients.
///
/// Created by the session at bind time; senders outliving their attempt are
/// harmless since their events are discarded on receipt.
#[derive(Clone)]
pub struct EventSink {
    attempt: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn new(attempt: u64, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { attempt, tx }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn manifest_parsed(&self) {
        self.send(EventPayload::ManifestParsed);
    }

    pub fn metadata_loaded(&self) {
        self.send(EventPayload::MetadataLoaded);
    }

    pub fn surface_error(&self, reason: impl Into<String>) {
        self.send(EventPayload::SurfaceError {
            reason: reason.into(),
        });
    }

    pub fn fatal(&self, category: FatalCategory, reason: impl Into<String>) {
        self.send(EventPayload::Fatal {
            category,
            reason: reason.into(),
        });
    }

    fn send(&self, payload: EventPayload) {
        // The session may already be gone; nothing to do then.
        let _ = self.tx.send(SessionEvent {
            attempt: self.attempt,
            payload,
        });
    }
}

/// A segmented live-stream client bound to one attempt.
///
/// The client absorbs failures it can retry internally and only reports
/// fatal ones through its `EventSink`. Instances are never reused across
/// attempts; every bind constructs a fresh client.
pub trait SegmentedClient: Send {
    /// Resume fetching from the manifest after a network-category failure.
    fn start_load(&mut self);
    /// Re-initialize the decode path after a media-category failure,
    /// without re-fetching the manifest.
    fn recover_media_error(&mut self);
    /// Stop all fetching and release the client's resources.
    fn destroy(&mut self);
}

/// Constructs segmented clients for the session.
pub trait SegmentedClientFactory: Send + Sync {
    fn create(
        &self,
        manifest_url: &str,
        config: &SegmentedClientConfig,
        sink: EventSink,
    ) -> Box<dyn SegmentedClient>;
}
