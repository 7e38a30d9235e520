//! New-item detection.
//!
//! A feed's cursor is the link of the newest item already relayed.  Feeds
//! list items newest-first, so everything ahead of the cursor is new.
//!
//! **Precondition:** `items` is ordered newest-first.  This is a convention
//! of the feed format, not something the detector can verify; a feed that
//! breaks it will have items reported in the wrong order or missed.  Use
//! [`is_newest_first`] to flag such feeds.

use crate::source::FeedItem;

/// Return the items published after `cursor`.
///
/// Scans from the front and stops at the first item whose link equals the
/// cursor; that item and everything after it are old.  An empty cursor (feed
/// never polled) or a cursor that has rotated out of the feed window makes
/// every item new.
///
/// The result is always a prefix of `items`, in the same order.
pub fn unchecked_items<'a>(items: &'a [FeedItem], cursor: &str) -> &'a [FeedItem] {
    if cursor.is_empty() {
        return items;
    }
    let end = items
        .iter()
        .position(|item| item.link == cursor)
        .unwrap_or(items.len());
    &items[..end]
}

/// The cursor to store after relaying `new_items`: the newest item's link,
/// or `None` when there is nothing new and the cursor must stay put.
pub fn next_cursor(new_items: &[FeedItem]) -> Option<&str> {
    new_items.first().map(|item| item.link.as_str())
}

/// Check the newest-first precondition against the items' publish dates.
///
/// Only adjacent pairs where both items carry a date are compared; undated
/// items never count as a violation.
pub fn is_newest_first(items: &[FeedItem]) -> bool {
    items.windows(2).all(|pair| match (pair[0].published, pair[1].published) {
        (Some(newer), Some(older)) => newer >= older,
        _ => true,
    })
}
