//! libcurl-backed fetcher: one easy handle per request.

use curl::easy::{Easy, List};
use std::io;
use std::path::Path;
use std::time::Duration;

use super::{Fetch, FetchError};
use crate::storage::AtomicFileWriter;

/// Fixed identifying client header sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: u32 = 10;

/// Blocking HTTP fetcher. Cheap to share across worker threads: every call
/// builds its own curl handle.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    timeout: Duration,
    user_agent: String,
}

impl CurlFetcher {
    /// Fetcher whose requests each fail after `timeout` (whole transfer, not just connect).
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn easy(&self, url: &str) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTS)?;
        easy.connect_timeout(self.timeout.min(CONNECT_TIMEOUT))?;
        easy.timeout(self.timeout)?;
        easy.useragent(&self.user_agent)?;
        // No Accept-Encoding is sent and bodies are stored exactly as received.
        easy.http_content_decoding(false)?;

        let mut list = List::new();
        list.append("Connection: keep-alive")?;
        list.append("Accept: */*")?;
        easy.http_headers(list)?;
        Ok(easy)
    }

    fn transfer_error(&self, e: curl::Error) -> FetchError {
        if e.is_operation_timedout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transfer(e)
        }
    }

    fn check_status(easy: &mut Easy) -> Result<(), FetchError> {
        let code = easy.response_code().map_err(FetchError::Transfer)?;
        if !(200..300).contains(&code) {
            return Err(FetchError::HttpStatus(code));
        }
        Ok(())
    }
}

impl Fetch for CurlFetcher {
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut writer = AtomicFileWriter::create(dest)?;
        let mut easy = self.easy(url).map_err(FetchError::Transfer)?;
        let mut storage_error: Option<io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match writer.write(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        storage_error = Some(e);
                        // Short count makes curl abort the transfer with a write error.
                        Ok(0)
                    }
                })
                .map_err(FetchError::Transfer)?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if e.is_write_error() {
                if let Some(io_err) = storage_error.take() {
                    return Err(FetchError::Storage(io_err));
                }
            }
            return Err(self.transfer_error(e));
        }
        Self::check_status(&mut easy)?;

        let written = writer.finalize()?;
        tracing::trace!(url, dest = %dest.display(), written, "fetched");
        Ok(written)
    }

    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut easy = self.easy(url).map_err(FetchError::Transfer)?;
        let mut body = Vec::new();

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(FetchError::Transfer)?;
            transfer.perform()
        };

        performed.map_err(|e| self.transfer_error(e))?;
        Self::check_status(&mut easy)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
