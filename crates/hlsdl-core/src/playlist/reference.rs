use url::Url;

use crate::error::PipelineError;

/// A playlist URL and the base that relative references resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub url: Url,
    /// `url` with the last path component, query and fragment removed.
    pub base: Url,
}

impl PlaylistRef {
    /// Parse an absolute HTTP(S) playlist URL.
    pub fn parse(url: &str) -> Result<Self, PipelineError> {
        let parsed = Url::parse(url).map_err(|source| PipelineError::PlaylistUrl {
            url: url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PipelineError::Unsupported {
                url: url.to_string(),
                reason: format!("scheme {:?} is not http(s)", parsed.scheme()),
            });
        }
        Ok(Self::from_url(parsed))
    }

    pub fn from_url(url: Url) -> Self {
        let base = base_of(&url);
        Self { url, base }
    }
}

/// Directory of `url`: everything up to and including the last `/` of the path.
pub(crate) fn base_of(url: &Url) -> Url {
    let mut base = url.clone();
    let dir_len = base.path().rfind('/').map(|i| i + 1).unwrap_or(0);
    let dir = base.path()[..dir_len].to_string();
    base.set_path(if dir.is_empty() { "/" } else { dir.as_str() });
    base.set_query(None);
    base.set_fragment(None);
    base
}
