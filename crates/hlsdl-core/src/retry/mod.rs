//! Retry rounds and error classification.
//!
//! Failed segments are not retried one by one; the scheduler re-runs the
//! whole failure set in rounds with a linearly growing pause in between.
//! Classification only labels failures for logs and the run summary.

mod classify;
mod policy;

pub use classify::{classify, classify_fetch_error, classify_http_status, ErrorKind};
pub use policy::RetryPolicy;
