use thiserror::Error;

/// Transport-level failures talking to the upstream source. All of these are
/// fatal to the batch that triggered the request.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("upstream request to {url} timed out")]
    UpstreamTimeout { url: String },

    #[error("upstream unavailable at {url}: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("could not build upstream client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("invalid upstream URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure to pull an embedded listings payload out of an HTML document.
/// Scoped to a single fragment; the batch carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no embedded JSON payload found in document")]
    NotFound,

    /// Only the captured length is kept, not the content, so error values
    /// stay small even for multi-megabyte pages.
    #[error("embedded payload of {captured_len} bytes is malformed: {reason}")]
    MalformedPayload { captured_len: usize, reason: String },
}

/// A record whose overall type makes it impossible to read as a listing,
/// e.g. an array or string where an object was expected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot normalize {found} as a listing record")]
pub struct NormalizationError {
    pub found: &'static str,
}
