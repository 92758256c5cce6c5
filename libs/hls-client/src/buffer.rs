use std::collections::VecDeque;
use std::time::Duration;

/// Every MPEG-TS packet starts with this sync byte.
const TS_SYNC_BYTE: u8 = 0x47;

#[derive(Debug, Clone)]
pub struct BufferedSegment {
    pub sequence: u64,
    pub duration: Duration,
    pub data: Vec<u8>,
}

/// Retained back buffer of downloaded segments.
///
/// Bounds memory while keeping a limited rewind window: once the retained
/// duration exceeds the configured length, the oldest segments are dropped.
/// The most recent segment is always kept.
pub struct SegmentBuffer {
    segments: VecDeque<BufferedSegment>,
    retain: Duration,
}

impl SegmentBuffer {
    pub fn new(retain: Duration) -> Self {
        Self {
            segments: VecDeque::new(),
            retain,
        }
    }

    pub fn push(&mut self, segment: BufferedSegment) {
        self.segments.push_back(segment);
        while self.duration() > self.retain && self.segments.len() > 1 {
            self.segments.pop_front();
        }
    }

    pub fn duration(&self) -> Duration {
        self.segments.iter().map(|segment| segment.duration).sum()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Oldest and newest retained sequence, the rewind window currently
    /// held in memory.
    pub fn sequence_window(&self) -> Option<(u64, u64)> {
        let first = self.segments.front()?;
        let last = self.segments.back()?;
        Some((first.sequence, last.sequence))
    }
}

/// Quick integrity check for a downloaded segment payload.
///
/// TS segments start with the sync byte; fMP4 segments start with a box
/// header whose type field is ASCII (ftyp, styp, moof, ...).
pub fn payload_looks_valid(data: &[u8]) -> bool {
    match data.first() {
        Some(&TS_SYNC_BYTE) => true,
        Some(_) => data.len() > 8 && data[4..8].iter().all(u8::is_ascii_alphanumeric),
        None => false,
    }
}
