use std::time::Duration;

use m3u8_rs::MediaPlaylist;
use playback::{
    EventSink, FatalCategory, SegmentedClient, SegmentedClientConfig, SegmentedClientFactory,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use url::Url;

use crate::buffer::{BufferedSegment, SegmentBuffer, payload_looks_valid};
use crate::errors::HlsClientError;
use crate::manifest;

const DOWNLOAD_RETRY: u32 = 3;
const DOWNLOAD_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_CONSECUTIVE_ERRORS: u32 = 5;
const LOW_LATENCY_REFRESH_INTERVAL: Duration = Duration::from_millis(500);
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

enum Command {
    StartLoad,
    RecoverMedia,
    Destroy,
}

/// Segmented live-stream client backed by a background worker task.
///
/// The worker polls the manifest, prefetches new segments into the back
/// buffer and classifies failures. Control methods only post commands; the
/// worker applies them between refreshes.
pub struct HlsClient {
    commands: mpsc::UnboundedSender<Command>,
    task: tokio::task::JoinHandle<()>,
}

impl HlsClient {
    /// Spawn a worker for `manifest_url`. Must be called within a tokio
    /// runtime.
    pub fn spawn(
        http: reqwest::Client,
        manifest_url: &str,
        config: &SegmentedClientConfig,
        sink: EventSink,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let worker = Worker::new(http, manifest_url.to_string(), config.clone(), sink);
        let task = tokio::spawn(worker.run(rx));
        Self { commands, task }
    }
}

impl SegmentedClient for HlsClient {
    fn start_load(&mut self) {
        let _ = self.commands.send(Command::StartLoad);
    }

    fn recover_media_error(&mut self) {
        let _ = self.commands.send(Command::RecoverMedia);
    }

    fn destroy(&mut self) {
        let _ = self.commands.send(Command::Destroy);
    }
}

impl Drop for HlsClient {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Destroy);
        self.task.abort();
    }
}

/// Creates one fresh `HlsClient` per attempt; clients are never reused.
pub struct HlsClientFactory {
    http: reqwest::Client,
}

impl HlsClientFactory {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for HlsClientFactory {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl SegmentedClientFactory for HlsClientFactory {
    fn create(
        &self,
        manifest_url: &str,
        config: &SegmentedClientConfig,
        sink: EventSink,
    ) -> Box<dyn SegmentedClient> {
        Box::new(HlsClient::spawn(
            self.http.clone(),
            manifest_url,
            config,
            sink,
        ))
    }
}

struct Worker {
    http: reqwest::Client,
    manifest_url: String,
    config: SegmentedClientConfig,
    sink: EventSink,
    buffer: SegmentBuffer,
    media_url: Option<Url>,
    last_sequence: Option<u64>,
    streak: ErrorStreak,
    /// Cleared when a fatal failure is reported; set again by
    /// `StartLoad`/`RecoverMedia`.
    loading: bool,
    manifest_announced: bool,
}

impl Worker {
    fn new(
        http: reqwest::Client,
        manifest_url: String,
        config: SegmentedClientConfig,
        sink: EventSink,
    ) -> Self {
        let buffer = SegmentBuffer::new(config.back_buffer);
        Self {
            http,
            manifest_url,
            config,
            sink,
            buffer,
            media_url: None,
            last_sequence: None,
            streak: ErrorStreak::new(MAX_CONSECUTIVE_ERRORS),
            loading: true,
            manifest_announced: false,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut refresh = tokio::time::interval(self.refresh_interval());
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::StartLoad) => {
                        log::info!("resuming load for {}", self.manifest_url);
                        self.streak.reset();
                        self.loading = true;
                    }
                    Some(Command::RecoverMedia) => {
                        // Drop the buffered data that tripped the failure
                        // and refill from the live edge; the manifest URL
                        // is kept.
                        log::info!("recovering media pipeline for {}", self.manifest_url);
                        self.buffer.clear();
                        self.streak.reset();
                        self.loading = true;
                    }
                    Some(Command::Destroy) | None => {
                        log::debug!("hls client for {} destroyed", self.manifest_url);
                        return;
                    }
                },
                _ = refresh.tick(), if self.loading => {
                    if let Err(error) = self.refresh().await {
                        self.on_refresh_error(error);
                    }
                }
            }
        }
    }

    fn refresh_interval(&self) -> Duration {
        if self.config.low_latency {
            LOW_LATENCY_REFRESH_INTERVAL
        } else {
            REFRESH_INTERVAL
        }
    }

    async fn refresh(&mut self) -> Result<(), HlsClientError> {
        let url = match &self.media_url {
            Some(url) => url.clone(),
            None => Url::parse(self.manifest_url.trim()).map_err(|_| {
                HlsClientError::InvalidSegmentUrl {
                    url: self.manifest_url.clone(),
                }
            })?,
        };

        let playlist = manifest::fetch_playlist(&self.http, &url).await?;
        let (media_url, media) =
            manifest::resolve_media_playlist(&self.http, &url, playlist).await?;
        self.media_url = Some(media_url.clone());

        if !self.manifest_announced {
            self.manifest_announced = true;
            log::debug!("manifest parsed for {}", self.manifest_url);
            self.sink.manifest_parsed();
        }

        if self.config.prefetch {
            self.fetch_new_segments(&media_url, &media).await?;
        }
        self.streak.reset();
        Ok(())
    }

    async fn fetch_new_segments(
        &mut self,
        media_url: &Url,
        media: &MediaPlaylist,
    ) -> Result<(), HlsClientError> {
        for (i, segment) in media.segments.iter().enumerate() {
            let sequence = media.media_sequence + i as u64;
            if self.last_sequence.is_some_and(|last| sequence <= last) {
                continue;
            }

            let segment_url = manifest::resolve_relative(media_url, &segment.uri)?;
            let data = download(&self.http, &segment_url, DOWNLOAD_RETRY).await?;
            if !payload_looks_valid(&data) {
                return Err(HlsClientError::CorruptedSegment {
                    url: segment_url.to_string(),
                });
            }

            self.buffer.push(BufferedSegment {
                sequence,
                duration: Duration::from_secs_f64(f64::from(segment.duration).max(0.0)),
                data,
            });
            self.last_sequence = Some(sequence);
            log::trace!(
                "buffered segment {sequence} ({} retained, window {:?}, {:?})",
                self.buffer.len(),
                self.buffer.sequence_window(),
                self.buffer.duration()
            );
        }
        Ok(())
    }

    fn on_refresh_error(&mut self, error: HlsClientError) {
        match &error {
            HlsClientError::M3u8ParseFailed { .. }
            | HlsClientError::NoVariants
            | HlsClientError::InvalidSegmentUrl { .. } => {
                log::error!("unrecoverable manifest failure: {error}");
                self.loading = false;
                self.sink.fatal(FatalCategory::Other, error.to_string());
            }
            HlsClientError::CorruptedSegment { .. } => {
                log::error!("segment payload failed validation: {error}");
                self.loading = false;
                self.sink.fatal(FatalCategory::Media, error.to_string());
            }
            HlsClientError::ClientError(_) | HlsClientError::InvalidResponseStatus { .. } => {
                let fatal = self.streak.record();
                log::warn!(
                    "transport failure ({}/{MAX_CONSECUTIVE_ERRORS}): {error}",
                    self.streak.count()
                );
                if fatal {
                    self.loading = false;
                    self.sink.fatal(FatalCategory::Network, error.to_string());
                }
            }
        }
    }
}

/// Download a segment with bounded internal retries. Only the last error
/// escapes; earlier ones are absorbed here.
async fn download(
    http: &reqwest::Client,
    url: &Url,
    retry: u32,
) -> Result<Vec<u8>, HlsClientError> {
    let mut attempt = 0;
    loop {
        match download_inner(http, url).await {
            Ok(data) => return Ok(data),
            Err(error) => {
                attempt += 1;
                if attempt >= retry {
                    return Err(error);
                }
                log::warn!("segment download failed (attempt {attempt}): {error}");
                tokio::time::sleep(DOWNLOAD_RETRY_DELAY).await;
            }
        }
    }
}

async fn download_inner(http: &reqwest::Client, url: &Url) -> Result<Vec<u8>, HlsClientError> {
    let response = http.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(HlsClientError::InvalidResponseStatus {
            status: response.status(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Consecutive-failure counter deciding when transport errors turn fatal.
struct ErrorStreak {
    count: u32,
    limit: u32,
}

impl ErrorStreak {
    fn new(limit: u32) -> Self {
        Self { count: 0, limit }
    }

    /// Record one failure; returns true once the streak reaches the limit.
    fn record(&mut self) -> bool {
        self.count += 1;
        self.count >= self.limit
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
