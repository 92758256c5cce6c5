use url::Url;

/// Playback strategy selected for a stream locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKind {
    /// Locator points at a third-party embeddable player page.
    /// Playback is delegated wholesale; no transport controls apply.
    ExternalEmbed,
    /// Locator resolves to a segmented live-stream manifest.
    SegmentedLive,
    /// Anything the rendering surface can open natively.
    DirectFile,
}

impl PlaybackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackKind::ExternalEmbed => "external embed",
            PlaybackKind::SegmentedLive => "segmented live",
            PlaybackKind::DirectFile => "direct file",
        }
    }
}

const EMBED_HOSTS: &[&str] = &["youtube.com", "youtu.be"];
const MANIFEST_SUFFIX: &str = ".m3u8";
const SEGMENT_SUFFIX: &str = ".ts";
const RELAY_PORT_MARKER: &str = ":8080";

/// Classify a stream locator into a playback strategy.
///
/// Total and side-effect free: empty or malformed locators fall through to
/// `DirectFile` and fail at bind time instead of here.
pub fn classify(locator: &str) -> PlaybackKind {
    if is_embed_host(locator) {
        return PlaybackKind::ExternalEmbed;
    }
    if locator.contains(MANIFEST_SUFFIX)
        || locator.contains(SEGMENT_SUFFIX)
        || locator.contains(RELAY_PORT_MARKER)
    {
        return PlaybackKind::SegmentedLive;
    }
    PlaybackKind::DirectFile
}

fn is_embed_host(locator: &str) -> bool {
    if let Ok(parsed) = Url::parse(locator.trim()) {
        if let Some(host) = parsed.host_str() {
            return EMBED_HOSTS
                .iter()
                .any(|embed| host == *embed || host.ends_with(&format!(".{embed}")));
        }
    }
    // Locators that do not parse as URLs still get the substring check.
    EMBED_HOSTS.iter().any(|embed| locator.contains(embed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_hosts_are_external_embeds() {
        assert_eq!(
            classify("https://www.youtube.com/embed/abc123"),
            PlaybackKind::ExternalEmbed
        );
        assert_eq!(
            classify("https://youtu.be/abc123"),
            PlaybackKind::ExternalEmbed
        );
    }

    #[test]
    fn embed_host_must_match_host_not_path() {
        // A manifest that merely mentions the embed host in its path is not
        // an embed.
        assert_eq!(
            classify("https://cdn.example/youtube.com/live.m3u8"),
            PlaybackKind::SegmentedLive
        );
    }

    #[test]
    fn manifest_suffix_is_segmented_live() {
        assert_eq!(
            classify("https://cdn.example/live/index.m3u8"),
            PlaybackKind::SegmentedLive
        );
        assert_eq!(
            classify("https://cdn.example/live/index.m3u8?token=x"),
            PlaybackKind::SegmentedLive
        );
    }

    #[test]
    fn segment_suffix_is_segmented_live() {
        assert_eq!(
            classify("https://cdn.example/live/42.ts"),
            PlaybackKind::SegmentedLive
        );
    }

    #[test]
    fn relay_port_marker_is_segmented_live() {
        assert_eq!(
            classify("https://relay.example:8080/stream/42"),
            PlaybackKind::SegmentedLive
        );
    }

    #[test]
    fn everything_else_is_direct_file() {
        assert_eq!(
            classify("https://video.example/watch?id=abc123"),
            PlaybackKind::DirectFile
        );
        assert_eq!(
            classify("https://cdn.example/match.mp4"),
            PlaybackKind::DirectFile
        );
    }

    #[test]
    fn empty_and_malformed_locators_are_direct_file() {
        assert_eq!(classify(""), PlaybackKind::DirectFile);
        assert_eq!(classify("not a url at all"), PlaybackKind::DirectFile);
    }
}
