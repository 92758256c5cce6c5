use std::sync::Mutex;

use playback::{EventSink, MediaSurface, PlaybackError};

#[derive(Default)]
struct ProbeState {
    playing: bool,
    volume: f64,
    muted: bool,
    fullscreen: bool,
}

/// Headless stand-in for a video element.
///
/// Readiness is probed with a single HTTP request against the source;
/// transport state is tracked in-process so session logic behaves the same
/// as against a real surface.
pub struct ProbeSurface {
    http: reqwest::Client,
    state: Mutex<ProbeState>,
}

impl ProbeSurface {
    /// Must be constructed within a tokio runtime; source probes run on
    /// spawned tasks.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            state: Mutex::new(ProbeState {
                volume: 1.0,
                ..ProbeState::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ProbeState> {
        // Lock poisoning cannot happen: no holder panics.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MediaSurface for ProbeSurface {
    fn set_source(&self, uri: &str, sink: EventSink) {
        let http = self.http.clone();
        let uri = uri.to_string();
        tokio::spawn(async move {
            match http.get(&uri).send().await {
                Ok(response) if response.status().is_success() => {
                    log::debug!("source reachable: {uri}");
                    sink.metadata_loaded();
                }
                Ok(response) => {
                    sink.surface_error(format!("unexpected status {}", response.status()));
                }
                Err(e) => {
                    sink.surface_error(e.to_string());
                }
            }
        });
    }

    fn clear_source(&self) {
        self.state().playing = false;
    }

    fn play(&self) -> Result<(), PlaybackError> {
        self.state().playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.state().playing = false;
    }

    fn set_volume(&self, volume: f64) {
        self.state().volume = volume;
    }

    fn set_muted(&self, muted: bool) {
        self.state().muted = muted;
    }

    fn enter_fullscreen(&self) -> Result<(), PlaybackError> {
        self.state().fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&self) {
        self.state().fullscreen = false;
    }

    fn is_fullscreen(&self) -> bool {
        self.state().fullscreen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_state_round_trips() {
        let surface = ProbeSurface::new(reqwest::Client::new());
        assert!(surface.play().is_ok());
        assert!(surface.state().playing);
        surface.pause();
        assert!(!surface.state().playing);

        surface.set_volume(0.5);
        surface.set_muted(true);
        assert_eq!(surface.state().volume, 0.5);
        assert!(surface.state().muted);

        assert!(surface.enter_fullscreen().is_ok());
        assert!(surface.is_fullscreen());
        surface.exit_fullscreen();
        assert!(!surface.is_fullscreen());
    }

    #[tokio::test]
    async fn unreachable_source_reports_a_surface_error() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let surface = ProbeSurface::new(reqwest::Client::new());
        surface.set_source("http://127.0.0.1:9/game.mp4", EventSink::new(1, tx));

        let event = tokio::time::timeout(std::time::Duration::from_secs(30), rx.recv())
            .await
            .expect("no event before timeout")
            .expect("sink closed");
        assert!(matches!(
            event.payload,
            playback::EventPayload::SurfaceError { .. }
        ));
    }
}
