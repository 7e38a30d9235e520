//! Error types.
//!
//! Each stage of the per-feed pipeline has its own error enum so callers can
//! tell a flaky network apart from a broken document or a rejected message.
//! [`PollError`] is the umbrella a single feed's pass reports.

use thiserror::Error;

/// A network read failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// A fetched document could not be decoded into a channel.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document root is <{0}>, expected an RDF container")]
    NotRdf(String),

    #[error("document is empty")]
    Empty,

    #[error("RDF document has no <channel> element")]
    MissingChannel,

    #[error("document ended inside <{0}>")]
    Truncated(String),
}

/// The cursor store could not be read or written.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cursor file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// A notification sink refused or failed to accept a message.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{sink} API error: {message}")]
    Api { sink: &'static str, message: String },

    #[error("delivery queue is closed")]
    QueueClosed,
}

/// Everything that can stop one feed's pass.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("cursor store: {0}")]
    Store(#[from] StoreError),

    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse: {0}")]
    Parse(#[from] ParseError),

    #[error("notify: {0}")]
    Notify(#[from] NotifyError),
}
