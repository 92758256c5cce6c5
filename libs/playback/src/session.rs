use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::Source;
use crate::classify::{PlaybackKind, classify};
use crate::client::{
    EventPayload, EventSink, FatalCategory, SegmentedClient, SegmentedClientConfig,
    SegmentedClientFactory, SessionEvent,
};
use crate::events::PlayerEvent;
use crate::surface::MediaSurface;

const REASON_CONNECTION_FAILED: &str = "stream connection failed";
const REASON_STREAM_UNAVAILABLE: &str = "stream unavailable";

/// Status of the current playback attempt.
///
/// `Error` is terminal per attempt; leaving it requires a new attempt via
/// `retry` or a fresh bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Loading,
    Ready,
    Playing,
    Paused,
    Error,
}

/// Options fixed at session construction.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Start playback as soon as the attempt is ready. If the host rejects
    /// autoplay with sound, the session retries once muted.
    pub autoplay: bool,
    /// Initial volume in `[0, 1]`.
    pub volume: f64,
    /// Operating parameters handed to every segmented client.
    pub client_config: SegmentedClientConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autoplay: false,
            volume: 1.0,
            client_config: SegmentedClientConfig::default(),
        }
    }
}

/// One playback session bound to one rendering surface.
///
/// Owns at most one attempt at a time: binding a locator tears down the
/// previous attempt's resources before the new one starts, and bumps an
/// attempt generation so late events from superseded attempts are
/// discarded. All failures surface through `status`/`error_reason`; the
/// session never panics or returns errors across its public boundary.
pub struct StreamSession {
    surface: Arc<dyn MediaSurface>,
    factory: Option<Arc<dyn SegmentedClientFactory>>,
    options: SessionOptions,
    locator: Option<String>,
    kind: Option<PlaybackKind>,
    status: PlaybackStatus,
    error_reason: Option<String>,
    volume: f64,
    muted: bool,
    attempt: u64,
    client: Option<Box<dyn SegmentedClient>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    notify: broadcast::Sender<PlayerEvent>,
}

impl StreamSession {
    pub fn new(
        surface: Arc<dyn MediaSurface>,
        factory: Option<Arc<dyn SegmentedClientFactory>>,
        options: SessionOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notify, _) = broadcast::channel(64);
        let volume = options.volume.clamp(0.0, 1.0);
        Self {
            surface,
            factory,
            options,
            locator: None,
            kind: None,
            status: PlaybackStatus::Loading,
            error_reason: None,
            volume,
            muted: false,
            attempt: 0,
            client: None,
            events_tx,
            events_rx,
            notify,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn kind(&self) -> Option<PlaybackKind> {
        self.kind
    }

    /// Set only while `status` is `Error`.
    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn current_attempt(&self) -> u64 {
        self.attempt
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.notify.subscribe()
    }

    pub fn bind(&mut self, source: &Source) {
        self.bind_locator(&source.uri);
    }

    /// Start a fresh attempt against `uri`, superseding any previous one.
    pub fn bind_locator(&mut self, uri: &str) {
        // Previous resources must be gone before the new attempt starts.
        self.teardown();
        self.locator = Some(uri.to_string());
        self.error_reason = None;

        let kind = classify(uri);
        self.kind = Some(kind);
        log::info!("binding locator as {}: {uri}", kind.as_str());

        match kind {
            PlaybackKind::ExternalEmbed => {
                // Delegated wholesale; no lifecycle to manage.
                self.set_status(PlaybackStatus::Ready);
                return;
            }
            _ if uri.trim().is_empty() => {
                self.fail(REASON_CONNECTION_FAILED);
                return;
            }
            PlaybackKind::SegmentedLive => {
                self.set_status(PlaybackStatus::Loading);
                let sink = self.sink();
                match self.segmented_factory() {
                    Some(factory) => {
                        let client = factory.create(uri, &self.options.client_config, sink);
                        self.client = Some(client);
                    }
                    // The surface opens the manifest itself, same path as a
                    // direct file.
                    None => self.surface.set_source(uri, sink),
                }
            }
            PlaybackKind::DirectFile => {
                self.set_status(PlaybackStatus::Loading);
                let sink = self.sink();
                self.surface.set_source(uri, sink);
            }
        }

        self.surface.set_volume(self.volume);
        self.surface.set_muted(self.muted);
    }

    /// Re-bind the stored locator: the scoped retry used by the host UI's
    /// error panel instead of reloading the whole application.
    pub fn retry(&mut self) {
        if let Some(locator) = self.locator.clone() {
            log::info!("retrying locator: {locator}");
            self.bind_locator(&locator);
        }
    }

    /// Feed one event into the state machine. Events tagged with a
    /// superseded attempt are discarded without touching session state.
    pub fn handle(&mut self, event: SessionEvent) {
        if event.attempt != self.attempt {
            log::debug!(
                "discarding event from superseded attempt {} (current {})",
                event.attempt,
                self.attempt
            );
            return;
        }
        match event.payload {
            EventPayload::ManifestParsed | EventPayload::MetadataLoaded => self.on_loaded(),
            EventPayload::SurfaceError { reason } => {
                if self.client.is_some() {
                    // The segmented client owns failure handling for this
                    // attempt.
                    log::debug!("surface error while segmented client active: {reason}");
                    return;
                }
                log::error!("surface reported media error: {reason}");
                self.fail(REASON_CONNECTION_FAILED);
            }
            EventPayload::Fatal { category, reason } => self.on_fatal(category, &reason),
        }
    }

    /// Wait for the next client/surface event and run it through the state
    /// machine. Pends until an event arrives.
    pub async fn drive_once(&mut self) {
        // The session holds a sender itself, so recv never returns None.
        if let Some(event) = self.events_rx.recv().await {
            self.handle(event);
        }
    }

    /// Drain and handle everything already queued, without waiting.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
        }
    }

    pub fn toggle_play(&mut self) {
        if self.is_delegated() {
            return;
        }
        match self.status {
            PlaybackStatus::Playing => {
                self.surface.pause();
                self.set_status(PlaybackStatus::Paused);
            }
            PlaybackStatus::Ready | PlaybackStatus::Paused => match self.surface.play() {
                Ok(()) => self.set_status(PlaybackStatus::Playing),
                Err(err) => log::warn!("play request rejected: {err}"),
            },
            PlaybackStatus::Loading | PlaybackStatus::Error => {}
        }
    }

    /// Clamps to `[0, 1]`; volume zero mutes, any other value unmutes.
    pub fn set_volume(&mut self, volume: f64) {
        if self.is_delegated() || !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.muted = self.volume == 0.0;
        self.surface.set_volume(self.volume);
        self.surface.set_muted(self.muted);
        self.notify_volume();
    }

    /// Flips mute without touching the stored volume, so unmuting restores
    /// audible playback at the previous level.
    pub fn toggle_mute(&mut self) {
        if self.is_delegated() {
            return;
        }
        self.muted = !self.muted;
        self.surface.set_muted(self.muted);
        if !self.muted {
            self.surface.set_volume(self.volume);
        }
        self.notify_volume();
    }

    /// Fullscreen rejection by the host is ignored; it never changes
    /// playback status.
    pub fn toggle_fullscreen(&self) {
        if self.is_delegated() {
            return;
        }
        if self.surface.is_fullscreen() {
            self.surface.exit_fullscreen();
        } else if let Err(err) = self.surface.enter_fullscreen() {
            log::debug!("fullscreen request rejected: {err}");
        }
    }

    /// Release the current attempt's resources. Idempotent: safe to call
    /// repeatedly or on a session that never left `Loading`.
    pub fn teardown(&mut self) {
        // Invalidate in-flight events before releasing anything.
        self.attempt = self.attempt.wrapping_add(1);
        if let Some(mut client) = self.client.take() {
            client.destroy();
        }
        self.surface.pause();
        self.surface.clear_source();
    }

    fn sink(&self) -> EventSink {
        EventSink::new(self.attempt, self.events_tx.clone())
    }

    fn is_delegated(&self) -> bool {
        matches!(self.kind, Some(PlaybackKind::ExternalEmbed))
    }

    fn segmented_factory(&self) -> Option<Arc<dyn SegmentedClientFactory>> {
        if self.surface.plays_segmented_natively() {
            return None;
        }
        self.factory.clone()
    }

    fn on_loaded(&mut self) {
        if self.status == PlaybackStatus::Error {
            // Error always wins within an attempt.
            return;
        }
        self.set_status(PlaybackStatus::Ready);
        if self.options.autoplay {
            self.request_autoplay();
        }
    }

    fn on_fatal(&mut self, category: FatalCategory, reason: &str) {
        match category {
            FatalCategory::Network => {
                if let Some(client) = self.client.as_mut() {
                    // Stay connected: re-issue the load, unbounded. The
                    // relay is typically self-healing within seconds.
                    log::warn!("fatal network failure, resuming load: {reason}");
                    client.start_load();
                    let _ = self.notify.send(PlayerEvent::RecoveryStarted {
                        attempt: self.attempt,
                        category,
                    });
                }
            }
            FatalCategory::Media => {
                if let Some(client) = self.client.as_mut() {
                    log::warn!("fatal media failure, recovering in place: {reason}");
                    client.recover_media_error();
                    let _ = self.notify.send(PlayerEvent::RecoveryStarted {
                        attempt: self.attempt,
                        category,
                    });
                }
            }
            FatalCategory::Other => {
                log::error!("unrecoverable stream failure: {reason}");
                if let Some(mut client) = self.client.take() {
                    client.destroy();
                }
                self.fail(REASON_STREAM_UNAVAILABLE);
            }
        }
    }

    fn request_autoplay(&mut self) {
        match self.surface.play() {
            Ok(()) => self.set_status(PlaybackStatus::Playing),
            Err(err) => {
                // Autoplay with sound is commonly blocked; degrade to muted
                // playback instead of surfacing an error.
                log::debug!("autoplay rejected ({err}), retrying muted");
                self.muted = true;
                self.surface.set_muted(true);
                self.notify_volume();
                match self.surface.play() {
                    Ok(()) => self.set_status(PlaybackStatus::Playing),
                    // Still Ready: the user has to press play.
                    Err(err) => log::debug!("muted autoplay rejected as well: {err}"),
                }
            }
        }
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        log::debug!("attempt {}: status {:?}", self.attempt, status);
        let _ = self.notify.send(PlayerEvent::StatusChanged {
            attempt: self.attempt,
            status,
            reason: None,
        });
    }

    fn fail(&mut self, reason: &str) {
        self.error_reason = Some(reason.to_string());
        self.status = PlaybackStatus::Error;
        let _ = self.notify.send(PlayerEvent::StatusChanged {
            attempt: self.attempt,
            status: PlaybackStatus::Error,
            reason: self.error_reason.clone(),
        });
    }

    fn notify_volume(&self) {
        let _ = self.notify.send(PlayerEvent::VolumeChanged {
            volume: self.volume,
            muted: self.muted,
        });
    }
}
