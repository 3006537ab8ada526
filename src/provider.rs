//! Provider capability shared by the status sources

use thiserror::Error;

pub(crate) const USER_AGENT: &str = "obs-status-core/0.1";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Not found (404)")]
    NotFound,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Map a failed `ureq` call, treating only 404 as `NotFound`
    pub(crate) fn from_ureq(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(404, _) => ProviderError::NotFound,
            ureq::Error::Status(code, resp) => {
                ProviderError::NetworkError(format!("HTTP {} {}", code, resp.status_text()))
            }
            ureq::Error::Transport(t) => ProviderError::NetworkError(t.to_string()),
        }
    }
}

/// A remote source that can be polled for one identifier.
///
/// `fetch` performs exactly one network round trip. `Ok(None)` means the
/// source answered but has nothing to report (e.g. nothing playing).
pub trait Provider {
    type Payload;

    /// Provider name as shown to the user, e.g. `chess.com`
    fn name(&self) -> &'static str;

    /// What the identifier is called, e.g. `username`
    fn id_kind(&self) -> &'static str;

    fn fetch(&self, identifier: &str) -> Result<Option<Self::Payload>, ProviderError>;

    /// One-line summary of a successful fetch
    fn describe(&self, identifier: &str, payload: &Self::Payload) -> String;

    fn idle_text(&self) -> String {
        "Not Playing!".to_string()
    }
}

/// Build `{base}/{prefix}/{identifier}{suffix}` with the identifier encoded
/// as a single path segment.
pub(crate) fn endpoint(base: &str, prefix: &str, identifier: &str, suffix: &str) -> String {
    format!(
        "{}/{}/{}{}",
        base.trim_end_matches('/'),
        prefix.trim_matches('/'),
        urlencoding::encode(identifier),
        suffix
    )
}
