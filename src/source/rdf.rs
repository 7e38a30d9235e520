//! RDF (RSS 1.0) feed parsing.
//!
//! The documents this relay consumes look like
//!
//! ```xml
//! <rdf:RDF xmlns="http://purl.org/rss/1.0/" xmlns:rdf="..." xmlns:dc="...">
//!   <channel><title>Site</title>...</channel>
//!   <item><title>...</title><link>...</link><dc:date>...</dc:date></item>
//!   <item>...</item>
//! </rdf:RDF>
//! ```
//!
//! Unlike RSS 2.0 the items are siblings of `<channel>`, not children of it.
//! Namespace prefixes are dropped before matching, so `rdf:RDF` and `RDF`
//! (or `dc:date` and `date`) are the same element as far as this module is
//! concerned.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use super::{DataSource, FeedChannel, FeedItem};
use crate::error::{ParseError, PollError};

/// Fetch `url` through `source` and parse the body as an RDF feed.
///
/// Network and parse failures are both returned to the caller; the
/// orchestrator decides what a failed feed means for the rest of the pass.
pub async fn fetch_feed(source: &dyn DataSource, url: &str) -> Result<FeedChannel, PollError> {
    let body = source.fetch_text(url).await?;
    let channel = parse_channel(&body)?;
    debug!(feed = %url, title = %channel.title, items = channel.items.len(), "parsed feed");
    Ok(channel)
}

/// Parse an RDF document into its channel title and items.
///
/// This is a pure function (no I/O) so the parsing rules can be tested
/// without a network.  Items are returned in document order.  An item with
/// no `<link>` is dropped because it could never serve as a cursor.
pub fn parse_channel(xml: &str) -> Result<FeedChannel, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = RdfState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(e.local_name().as_ref());
                state.open(name)?;
            }
            Event::Empty(e) => {
                // `<item/>` and friends: open and immediately close.
                let name = local_name(e.local_name().as_ref());
                state.open(name)?;
                state.close();
            }
            Event::End(_) => state.close(),
            Event::Text(e) => {
                let text = e.unescape().map_err(quick_xml::Error::from)?;
                state.text(&text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                state.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    state.finish()
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn depth(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

// ---------------------------------------------------------------------------
// Parser state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RdfState {
    /// Local names of the currently open elements, root first.
    path: Vec<String>,
    root_seen: bool,
    channel_seen: bool,
    title: String,
    items: Vec<FeedItem>,
    current: Option<ItemBuilder>,
}

impl RdfState {
    fn open(&mut self, name: String) -> Result<(), ParseError> {
        if self.path.is_empty() && !self.root_seen {
            if name != "RDF" {
                return Err(ParseError::NotRdf(name));
            }
            self.root_seen = true;
        }

        self.path.push(name);
        match depth(&self.path).as_slice() {
            ["RDF", "channel"] => self.channel_seen = true,
            ["RDF", "item"] => self.current = Some(ItemBuilder::default()),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self) {
        if depth(&self.path).as_slice() == ["RDF", "item"] {
            if let Some(item) = self.current.take().and_then(ItemBuilder::build) {
                self.items.push(item);
            }
        }
        self.path.pop();
    }

    fn text(&mut self, text: &str) {
        match depth(&self.path).as_slice() {
            ["RDF", "channel", "title"] => self.title.push_str(text),
            ["RDF", "item", field] => {
                if let Some(item) = self.current.as_mut() {
                    item.push(field, text);
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<FeedChannel, ParseError> {
        if !self.root_seen {
            return Err(ParseError::Empty);
        }
        if let Some(open) = self.path.last() {
            return Err(ParseError::Truncated(open.clone()));
        }
        if !self.channel_seen {
            return Err(ParseError::MissingChannel);
        }
        Ok(FeedChannel {
            title: self.title,
            items: self.items,
        })
    }
}

#[derive(Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    date: Option<String>,
}

impl ItemBuilder {
    fn push(&mut self, field: &str, text: &str) {
        let slot = match field {
            "title" => &mut self.title,
            "link" => &mut self.link,
            "date" => &mut self.date,
            _ => return,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn build(self) -> Option<FeedItem> {
        let link = self.link.filter(|l| !l.trim().is_empty())?;
        let item = FeedItem::new(
            self.title.unwrap_or_else(|| "(untitled)".to_string()),
            link.trim(),
        );

        match self
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok())
        {
            Some(dt) => Some(item.with_published(dt.with_timezone(&Utc))),
            None => Some(item),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
