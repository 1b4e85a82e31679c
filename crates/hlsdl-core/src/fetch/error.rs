//! Fetch error type.

use std::time::Duration;
use thiserror::Error;

/// Error returned by a single fetch. Carries enough detail (status code,
/// timeout) for the caller to report and classify it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Response had a non-2xx status.
    #[error("HTTP status {0}")]
    HttpStatus(u32),
    /// Request exceeded the configured deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Any other transfer failure reported by libcurl (DNS, connect, reset, ...).
    #[error("transfer failed: {0}")]
    Transfer(#[source] curl::Error),
    /// Writing the body to local storage failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}

impl FetchError {
    /// HTTP status code, if the server answered with an error status.
    pub fn status(&self) -> Option<u32> {
        match self {
            FetchError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}
