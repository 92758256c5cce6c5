use m3u8_rs::{MediaPlaylist, Playlist};
use url::Url;

use crate::errors::HlsClientError;

/// Fetch and parse the playlist at `url`.
pub async fn fetch_playlist(
    http: &reqwest::Client,
    url: &Url,
) -> Result<Playlist, HlsClientError> {
    let response = http.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(HlsClientError::InvalidResponseStatus {
            status: response.status(),
        });
    }
    let bytes = response.bytes().await?;
    parse_playlist(&bytes)
}

pub fn parse_playlist(bytes: &[u8]) -> Result<Playlist, HlsClientError> {
    let (_, playlist) =
        m3u8_rs::parse_playlist(bytes).map_err(|_| HlsClientError::M3u8ParseFailed {
            content: String::from_utf8_lossy(bytes).into_owned(),
        })?;
    Ok(playlist)
}

/// Resolve a playlist to a media playlist.
///
/// A master playlist resolves to its first variant, fetched at the variant
/// URL. Returns the URL the media playlist was loaded from so segment URIs
/// can be resolved against it.
pub async fn resolve_media_playlist(
    http: &reqwest::Client,
    manifest_url: &Url,
    playlist: Playlist,
) -> Result<(Url, MediaPlaylist), HlsClientError> {
    match playlist {
        Playlist::MediaPlaylist(media) => Ok((manifest_url.clone(), media)),
        Playlist::MasterPlaylist(master) => {
            let variant = master.variants.first().ok_or(HlsClientError::NoVariants)?;
            let variant_url = resolve_relative(manifest_url, &variant.uri)?;
            match fetch_playlist(http, &variant_url).await? {
                Playlist::MediaPlaylist(media) => Ok((variant_url, media)),
                Playlist::MasterPlaylist(_) => Err(HlsClientError::M3u8ParseFailed {
                    content: "No media playlist found".to_string(),
                }),
            }
        }
    }
}

/// Resolve a possibly-relative URI against the playlist it came from.
///
/// Absolute URIs are used as-is; relative ones join the playlist URL, which
/// keeps the playlist's path but not its query, per RFC 8216.
pub fn resolve_relative(base: &Url, uri: &str) -> Result<Url, HlsClientError> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Url::parse(uri).map_err(|_| HlsClientError::InvalidSegmentUrl {
            url: uri.to_string(),
        });
    }
    base.join(uri).map_err(|_| HlsClientError::InvalidSegmentUrl {
        url: uri.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDIA_PLAYLIST: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:2\n\
#EXT-X-MEDIA-SEQUENCE:120\n\
#EXTINF:2.000,\n\
120.ts\n\
#EXTINF:2.000,\n\
121.ts\n";

    const MASTER_PLAYLIST: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720\n\
hd/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n\
sd/index.m3u8\n";

    #[test]
    fn parses_a_media_playlist() {
        let playlist = parse_playlist(MEDIA_PLAYLIST.as_bytes()).unwrap();
        match playlist {
            Playlist::MediaPlaylist(media) => {
                assert_eq!(media.media_sequence, 120);
                assert_eq!(media.segments.len(), 2);
                assert_eq!(media.segments[0].uri, "120.ts");
            }
            Playlist::MasterPlaylist(_) => panic!("expected media playlist"),
        }
    }

    #[test]
    fn parses_a_master_playlist() {
        let playlist = parse_playlist(MASTER_PLAYLIST.as_bytes()).unwrap();
        match playlist {
            Playlist::MasterPlaylist(master) => {
                assert_eq!(master.variants.len(), 2);
                assert_eq!(master.variants[0].uri, "hd/index.m3u8");
            }
            Playlist::MediaPlaylist(_) => panic!("expected master playlist"),
        }
    }

    #[test]
    fn garbage_is_a_parse_failure() {
        let result = parse_playlist(b"<html>not a playlist</html>");
        assert!(matches!(
            result,
            Err(HlsClientError::M3u8ParseFailed { .. })
        ));
    }

    #[test]
    fn relative_segment_resolves_against_the_playlist_url() {
        let base = Url::parse("https://cdn.example/live/42/index.m3u8?token=x").unwrap();
        let resolved = resolve_relative(&base, "120.ts").unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example/live/42/120.ts");
    }

    #[test]
    fn absolute_segment_is_kept_as_is() {
        let base = Url::parse("https://cdn.example/live/index.m3u8").unwrap();
        let resolved =
            resolve_relative(&base, "https://edge.example/seg/120.ts?expires=1760808243").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://edge.example/seg/120.ts?expires=1760808243"
        );
    }

    #[test]
    fn segment_query_parameters_are_preserved() {
        let base = Url::parse("https://cdn.example/live/index.m3u8").unwrap();
        let resolved = resolve_relative(&base, "120.ts?expires=1760808243").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://cdn.example/live/120.ts?expires=1760808243"
        );
    }
}
