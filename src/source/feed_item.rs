//! The data types shared by the parser, the detector and the notifiers.
//!
//! `FeedItem` and `FeedChannel` only live for one polling cycle: they are
//! parsed fresh from the document on every pass and dropped once the new
//! items have been relayed.  The only thing that outlives a cycle is the
//! cursor (see [`crate::store`]).

use chrono::{DateTime, Utc};

/// A single entry of a feed.
///
/// `link` doubles as the item's identity: the detector compares links to
/// find the cursor, and the cursor stored after a pass is a link.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedItem {
    /// Human-readable headline.
    pub title: String,

    /// URL of the full content, unique within the feed.
    pub link: String,

    /// The item's `dc:date`, when present and well formed.
    ///
    /// Not used to decide what is new; only consulted to warn about feeds
    /// that are not ordered newest-first.
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published: None,
        }
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }
}

/// A parsed feed: the channel title plus its items in document order.
///
/// Feeds list their items newest-first by convention.  Nothing here enforces
/// that; [`crate::detect::is_newest_first`] can check it after the fact.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FeedChannel {
    pub title: String,
    pub items: Vec<FeedItem>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
