use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("play request rejected: {reason}")]
    PlayRejected { reason: String },
    #[error("fullscreen request rejected: {reason}")]
    FullscreenRejected { reason: String },
    #[error("stream connection failed")]
    ConnectionFailed,
    #[error("stream unavailable")]
    StreamUnavailable,
}
