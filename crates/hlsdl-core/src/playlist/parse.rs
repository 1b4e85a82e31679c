//! Playlist documents via `m3u8_rs`, plus the few decisions the downloader
//! makes on top: which variant to follow, where segments live, and which
//! features it refuses.

use m3u8_rs::{KeyMethod, MasterPlaylist, MediaPlaylist, Playlist};
use url::Url;

/// A variant stream listed in a master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub bandwidth: u64,
    pub url: Url,
}

/// Parse playlist text. The error carries nom's description of the failure.
pub fn parse_playlist(text: &str) -> Result<Playlist, String> {
    m3u8_rs::parse_playlist_res(text.as_bytes()).map_err(|e| {
        let reason = e.to_string();
        // nom echoes the unparsed input; keep the message to its first line.
        reason.lines().next().unwrap_or("parse error").to_string()
    })
}

/// Resolve a playlist entry against `base`. Absolute URLs come back unchanged.
fn resolve_entry(base: &Url, entry: &str) -> Result<Url, url::ParseError> {
    match Url::parse(entry) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(entry),
        Err(e) => Err(e),
    }
}

/// Highest-bandwidth variant; ties keep the first listed. I-frame streams and
/// variants whose URI is missing or unresolvable are skipped.
pub fn select_variant(master: &MasterPlaylist, base: &Url) -> Option<Variant> {
    let candidates: Vec<Variant> = master
        .variants
        .iter()
        .filter(|v| !v.is_i_frame)
        .filter_map(|v| {
            let uri = v.uri.trim();
            // A stream tag without a URI line swallows the next line as its URI.
            if uri.is_empty() || uri.starts_with('#') {
                tracing::warn!(bandwidth = v.bandwidth, "skipping variant without URI");
                return None;
            }
            match resolve_entry(base, uri) {
                Ok(url) => Some(Variant {
                    bandwidth: v.bandwidth,
                    url,
                }),
                Err(e) => {
                    tracing::warn!(uri, "skipping variant with bad URI: {}", e);
                    None
                }
            }
        })
        .collect();
    // `max_by_key` keeps the last maximum; reversing makes ties go to the first.
    candidates.into_iter().rev().max_by_key(|v| v.bandwidth)
}

/// Ordered, absolute segment URLs of a media playlist.
pub fn segment_urls(media: &MediaPlaylist, base: &Url) -> Result<Vec<String>, url::ParseError> {
    media
        .segments
        .iter()
        .map(|seg| resolve_entry(base, seg.uri.trim()).map(String::from))
        .collect()
}

/// Name of the first feature in `media` that the downloader cannot handle.
pub fn unsupported_feature(media: &MediaPlaylist) -> Option<&'static str> {
    for seg in &media.segments {
        if let Some(key) = &seg.key {
            if key.method != KeyMethod::None {
                return Some("encrypted segments (EXT-X-KEY)");
            }
        }
        if seg.map.is_some() {
            return Some("fragmented MP4 segments (EXT-X-MAP)");
        }
    }
    None
}
