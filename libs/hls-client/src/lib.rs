//! Segmented live-stream client for the playback core.
//!
//! Polls an HLS manifest on a background task, prefetches announced
//! segments into a bounded back buffer and reports only the failures it
//! cannot absorb itself, classified as network, media or other fatal
//! categories for the session's recovery policy.

mod buffer;
pub mod client;
pub mod errors;
pub mod manifest;

pub use client::{HlsClient, HlsClientFactory};
pub use errors::HlsClientError;
