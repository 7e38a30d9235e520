//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait (the one network read the
//! relay performs, used for both feeds and `robots.txt`) and the common
//! [`FeedItem`] / [`FeedChannel`] types.  The RDF format lives in [`rdf`];
//! the production HTTP implementation lives in [`http`].
//!
//! ## For contributors
//!
//! Everything that talks to a feed host goes through [`DataSource`], so the
//! orchestrator can be driven entirely from memory in tests.  A new transport
//! (a caching proxy, a local mirror) only needs to implement `fetch_text`.

mod feed_item;
mod http;
pub mod rdf;

// Re-export the public API of this module so callers can write
// `use crate::source::{DataSource, FeedChannel, FeedItem, HttpSource};`
pub use feed_item::{FeedChannel, FeedItem};
pub use http::HttpSource;

use async_trait::async_trait;

use crate::error::FetchError;

/// Trait that every transport must implement.
///
/// The orchestrator awaits each read before starting the next, so
/// implementations never see two concurrent requests for the same feed.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// GET `url` and return the body as text.
    ///
    /// Non-success HTTP statuses are errors: a missing `robots.txt` and a
    /// missing feed both surface as [`FetchError::Status`].
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
