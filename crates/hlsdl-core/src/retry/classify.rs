//! Classify HTTP status and curl errors into coarse failure kinds.

use crate::fetch::FetchError;
use crate::scheduler::SegmentError;

/// High-level classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP 5xx other than 503.
    Http5xx(u16),
    /// Body arrived but was empty or failed the integrity check.
    BadContent,
    /// Local disk failure.
    Storage,
    /// Anything else (4xx, malformed URL, ...).
    Other,
}

impl ErrorKind {
    /// Short label for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Throttled => "throttled",
            ErrorKind::Connection => "connection",
            ErrorKind::Http5xx(_) => "http5xx",
            ErrorKind::BadContent => "bad-content",
            ErrorKind::Storage => "storage",
            ErrorKind::Other => "other",
        }
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a fetch error.
pub fn classify_fetch_error(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::HttpStatus(code) => classify_http_status(*code),
        FetchError::Timeout(_) => ErrorKind::Timeout,
        FetchError::Transfer(ce) => classify_curl_error(ce),
        FetchError::Storage(_) => ErrorKind::Storage,
    }
}

/// Classify a failed segment attempt.
pub fn classify(e: &SegmentError) -> ErrorKind {
    match e {
        SegmentError::Download(fe) => classify_fetch_error(fe),
        SegmentError::Empty | SegmentError::Invalid(_) => ErrorKind::BadContent,
    }
}
