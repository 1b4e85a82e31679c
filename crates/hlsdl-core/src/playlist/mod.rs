//! Playlist resolution: master → variant → ordered segment URLs.
//!
//! Documents are parsed with `m3u8_rs` (see `parse`); this module adds the
//! fetching and the single level of master-playlist indirection.

mod parse;
mod reference;

pub use parse::{parse_playlist, segment_urls, select_variant, unsupported_feature, Variant};
pub use reference::PlaylistRef;

use m3u8_rs::{MediaPlaylist, Playlist};

use crate::error::PipelineError;
use crate::fetch::Fetch;
use crate::scheduler::SegmentTask;

/// A media playlist ready for acquisition.
#[derive(Debug, Clone)]
pub struct ResolvedPlaylist {
    /// The media playlist the segments came from (the variant, for masters).
    pub playlist: PlaylistRef,
    /// Bandwidth of the selected variant, when resolved through a master.
    pub bandwidth: Option<u64>,
    pub tasks: Vec<SegmentTask>,
}

fn fetch_playlist<F: Fetch>(fetcher: &F, playlist: &PlaylistRef) -> Result<Playlist, PipelineError> {
    let text = fetcher
        .fetch_text(playlist.url.as_str())
        .map_err(|source| PipelineError::PlaylistFetch {
            url: playlist.url.to_string(),
            source,
        })?;
    parse_playlist(&text).map_err(|reason| PipelineError::PlaylistParse {
        url: playlist.url.to_string(),
        reason,
    })
}

/// Fetch `url`, follow it to the highest-bandwidth variant if it is a master
/// playlist, and return the ordered segment tasks.
pub fn resolve<F: Fetch>(fetcher: &F, url: &str) -> Result<ResolvedPlaylist, PipelineError> {
    let mut playlist = PlaylistRef::parse(url)?;
    let mut bandwidth = None;

    let media: MediaPlaylist = match fetch_playlist(fetcher, &playlist)? {
        Playlist::MediaPlaylist(media) => media,
        Playlist::MasterPlaylist(master) => {
            let variant = select_variant(&master, &playlist.base).ok_or_else(|| {
                PipelineError::NoVariant {
                    url: playlist.url.to_string(),
                }
            })?;
            tracing::info!(
                bandwidth = variant.bandwidth,
                url = %variant.url,
                "master playlist: selected variant"
            );
            playlist = PlaylistRef::from_url(variant.url);
            bandwidth = Some(variant.bandwidth);
            match fetch_playlist(fetcher, &playlist)? {
                Playlist::MediaPlaylist(media) => media,
                Playlist::MasterPlaylist(_) => {
                    return Err(PipelineError::Unsupported {
                        url: playlist.url.to_string(),
                        reason: "variant is itself a master playlist".to_string(),
                    });
                }
            }
        }
    };

    if let Some(reason) = unsupported_feature(&media) {
        return Err(PipelineError::Unsupported {
            url: playlist.url.to_string(),
            reason: reason.to_string(),
        });
    }
    if !media.end_list {
        tracing::warn!(url = %playlist.url, "playlist has no #EXT-X-ENDLIST; downloading current snapshot only");
    }

    let urls = segment_urls(&media, &playlist.base).map_err(|source| {
        PipelineError::PlaylistUrl {
            url: playlist.url.to_string(),
            source,
        }
    })?;
    if urls.is_empty() {
        return Err(PipelineError::NoSegments {
            url: playlist.url.to_string(),
        });
    }

    let tasks: Vec<SegmentTask> = urls
        .into_iter()
        .enumerate()
        .map(|(ordinal, url)| SegmentTask { ordinal, url })
        .collect();
    tracing::info!(url = %playlist.url, segments = tasks.len(), "playlist resolved");
    Ok(ResolvedPlaylist {
        playlist,
        bandwidth,
        tasks,
    })
}
