//! Single-resource HTTP retrieval.
//!
//! The scheduler and playlist resolver only depend on the `Fetch` trait; the
//! production implementation is `CurlFetcher` (libcurl via the curl crate).

mod curl_fetcher;
mod error;

pub use curl_fetcher::{CurlFetcher, USER_AGENT};
pub use error::FetchError;

use std::path::Path;

/// One bounded-time GET of a single resource.
///
/// Implementations must not leave a partial file at `dest`: it either holds
/// the complete body after `Ok`, or does not exist after `Err`.
pub trait Fetch: Send + Sync {
    /// Download `url` into `dest`, returning the number of body bytes written.
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;

    /// Download `url` into memory as text (used for playlists).
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
