use thiserror::Error;

#[derive(Error, Debug)]
pub enum HlsClientError {
    #[error("Parse m3u8 content failed: {content}")]
    M3u8ParseFailed { content: String },
    #[error("No variants found in master playlist")]
    NoVariants,
    #[error("Invalid segment url: {url}")]
    InvalidSegmentUrl { url: String },
    #[error("Corrupted segment payload: {url}")]
    CorruptedSegment { url: String },
    #[error("Invalid response status: {status}")]
    InvalidResponseStatus { status: reqwest::StatusCode },
    #[error("Client error: {0}")]
    ClientError(#[from] reqwest::Error),
}
