//! Markdown digests for receivers with a hard length limit.
//!
//! A digest looks like
//!
//! ```text
//! # Channel title
//! ## Item title
//! https://example.com/item
//! ## Next item
//! ...
//! ```
//!
//! Discord rejects message content longer than [`DISCORD_CONTENT_LIMIT`]
//! characters, so [`pack`] splits a run of new items into as few digests as
//! fit under a configurable threshold.  Every digest repeats the header.

use crate::source::FeedItem;

/// Hard ceiling Discord enforces on message content.
pub const DISCORD_CONTENT_LIMIT: usize = 2000;

/// Default packing threshold; leaves headroom below the hard ceiling.
pub const DEFAULT_MAX_LENGTH: usize = 1900;

/// A run of consecutive items that will be sent as one digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageGroup<'a> {
    pub title: &'a str,
    pub items: &'a [FeedItem],
}

impl MessageGroup<'_> {
    /// Render the digest text.
    pub fn content(&self) -> String {
        let mut content = header(self.title);
        for item in self.items {
            content.push_str(&entry(item));
        }
        content
    }
}

fn header(title: &str) -> String {
    format!("# {title}\n")
}

fn entry(item: &FeedItem) -> String {
    format!("## {}\n{}\n", item.title, item.link)
}

/// Length as the receiver counts it: characters, not bytes.
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Greedily split `items` into groups whose rendered size stays within
/// `max_length`.
///
/// Items are never split and never reordered.  A group is closed when the
/// next item would push it past `max_length` and it already holds at least
/// one item, so a single item that is longer than the limit on its own still
/// gets a group to itself (and that group overflows).  No items, no groups.
pub fn pack<'a>(title: &'a str, items: &'a [FeedItem], max_length: usize) -> Vec<MessageGroup<'a>> {
    let header_len = char_len(&header(title));

    let mut groups = Vec::new();
    let mut start = 0;
    let mut size = header_len;

    for (i, item) in items.iter().enumerate() {
        let len = char_len(&entry(item));
        if size + len > max_length && i > start {
            groups.push(MessageGroup {
                title,
                items: &items[start..i],
            });
            start = i;
            size = header_len;
        }
        size += len;
    }

    if start < items.len() {
        groups.push(MessageGroup {
            title,
            items: &items[start..],
        });
    }

    groups
}
