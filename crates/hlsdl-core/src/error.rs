//! Run-level errors. Everything here is fatal: per-segment failures are
//! retried inside the scheduler and only surface as `MissingSegment` once the
//! retry rounds are exhausted.

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::merge::MergeError;
use crate::scheduler::SegmentError;
use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch playlist {url}")]
    PlaylistFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("invalid playlist URL {url}")]
    PlaylistUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("malformed playlist {url}: {reason}")]
    PlaylistParse { url: String, reason: String },

    #[error("no valid variant stream found in master playlist {url}")]
    NoVariant { url: String },

    #[error("no segments found in playlist {url}")]
    NoSegments { url: String },

    #[error("unsupported playlist {url}: {reason}")]
    Unsupported { url: String, reason: String },

    #[error("segment {ordinal} ({url}) failed to download after {retries} retry round(s)")]
    MissingSegment {
        ordinal: usize,
        url: String,
        retries: u32,
        #[source]
        cause: Option<SegmentError>,
    },

    #[error("segment {ordinal} file {} is empty (0 bytes)", .path.display())]
    SegmentEmpty { ordinal: usize, path: PathBuf },

    #[error("segment {ordinal} file {} failed integrity check", .path.display())]
    SegmentValidation {
        ordinal: usize,
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("cannot prepare staging directory {}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("merge failed")]
    Merge(#[from] MergeError),

    #[error("run aborted")]
    Aborted,
}
