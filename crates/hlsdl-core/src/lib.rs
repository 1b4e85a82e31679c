//! HLS downloader core: playlist resolution, concurrent segment acquisition
//! with staged retries, transport stream integrity checks, ordered merge.

pub mod config;
pub mod control;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod playlist;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod validate;

pub use config::{HlsdlConfig, RunConfig};
pub use control::AbortToken;
pub use error::PipelineError;
pub use fetch::{CurlFetcher, Fetch, FetchError};
pub use pipeline::{run, RunReport};
