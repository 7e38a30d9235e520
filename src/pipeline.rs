//! The polling pass.
//!
//! One pass walks every tracked feed, one at a time:
//!
//! ```text
//! read cursor → robots check ─(disallowed)─► done
//!                   │
//!                   ▼
//!             fetch + parse → detect new ─(none)─► done
//!                                  │
//!                                  ▼
//!                     slack → discord digests → advance cursor
//! ```
//!
//! A feed that fails anywhere is recorded in the [`PassReport`] and the pass
//! moves on to the next feed.  The cursor is written only after both sinks
//! have accepted the new items, so a failed send means those items are
//! offered again next pass (at-least-once delivery).
//!
//! Slack goes first and gates the rest.  A message Slack will never accept
//! (a header over its length limit, more blocks than it allows) therefore
//! holds the feed in place: every pass retries it and Discord never sees
//! those items.  That case is logged at `error` with the feed URL.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::detect;
use crate::digest;
use crate::error::PollError;
use crate::notify::{ChatSink, DiscordMessage, QueueSink, SlackMessage};
use crate::robots::RobotsGate;
use crate::source::{rdf, DataSource};
use crate::store::CursorStore;

/// Where the notifications go and how big a digest may get.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub user_agent: String,
    pub slack_channel: String,
    pub discord_channel_id: String,
    pub max_message_length: usize,
}

/// What happened to one feed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// robots.txt forbids fetching the feed.
    Disallowed,
    /// Nothing newer than the cursor.
    NoNewItems,
    /// `items` new items went out in one Slack message and `digests` Discord
    /// digests; the cursor now points at `cursor`.
    Delivered {
        items: usize,
        digests: usize,
        cursor: String,
    },
}

/// A feed whose pass was cut short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    pub feed_url: String,
    pub error: String,
}

/// Per-feed results of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub outcomes: Vec<(String, FeedOutcome)>,
    pub failures: Vec<FeedFailure>,
}

impl PassReport {
    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FeedOutcome::Delivered { .. }))
            .count()
    }
}

/// Owns the collaborators of a pass.  Shared between the timer and the HTTP
/// trigger behind an [`Arc`].
pub struct Pipeline {
    store: Arc<dyn CursorStore>,
    source: Arc<dyn DataSource>,
    gate: RobotsGate,
    chat: Arc<dyn ChatSink>,
    queue: Arc<dyn QueueSink>,
    settings: DeliverySettings,
    /// Held for a whole pass; a second trigger waits for the first to finish.
    pass_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn CursorStore>,
        source: Arc<dyn DataSource>,
        chat: Arc<dyn ChatSink>,
        queue: Arc<dyn QueueSink>,
        settings: DeliverySettings,
    ) -> Self {
        let gate = RobotsGate::new(source.clone(), settings.user_agent.clone());
        Self {
            store,
            source,
            gate,
            chat,
            queue,
            settings,
            pass_lock: Mutex::new(()),
        }
    }

    /// Run one pass over every tracked feed.
    ///
    /// Never fails as a whole: per-feed errors land in the report, and a
    /// store that cannot list its feeds yields an empty report.
    pub async fn run(&self) -> PassReport {
        let _pass = self.pass_lock.lock().await;
        let mut report = PassReport::default();

        let feeds = match self.store.list().await {
            Ok(feeds) => feeds,
            Err(e) => {
                error!(error = %e, "failed to list tracked feeds");
                return report;
            }
        };
        info!(feeds = feeds.len(), "starting pass");

        for feed_url in feeds {
            match self.poll_feed(&feed_url).await {
                Ok(outcome) => report.outcomes.push((feed_url, outcome)),
                Err(e) => {
                    warn!(feed = %feed_url, error = %e, "feed failed");
                    report.failures.push(FeedFailure {
                        feed_url,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            delivered = report.delivered(),
            failed = report.failures.len(),
            "pass finished"
        );
        report
    }

    /// Take one feed through the whole state machine.
    pub async fn poll_feed(&self, feed_url: &str) -> Result<FeedOutcome, PollError> {
        let cursor = self.store.get(feed_url).await?.unwrap_or_default();

        if !self.gate.is_allowed(feed_url).await {
            info!(feed = %feed_url, "disallowed by robots.txt");
            return Ok(FeedOutcome::Disallowed);
        }
        debug!(feed = %feed_url, "allowed by robots.txt");

        let channel = rdf::fetch_feed(self.source.as_ref(), feed_url).await?;
        info!(feed = %feed_url, title = %channel.title, "fetched feed");

        if !detect::is_newest_first(&channel.items) {
            warn!(feed = %feed_url, "items are not ordered newest-first; new-item detection may be wrong");
        }

        let new_items = detect::unchecked_items(&channel.items, &cursor);
        let Some(next_cursor) = detect::next_cursor(new_items) else {
            info!(feed = %feed_url, "no new items");
            return Ok(FeedOutcome::NoNewItems);
        };
        info!(feed = %feed_url, new = new_items.len(), "found new items");

        let slack = SlackMessage::digest(&self.settings.slack_channel, &channel.title, new_items);
        if let Err(e) = self.chat.post(&slack).await {
            error!(
                feed = %feed_url,
                items = new_items.len(),
                error = %e,
                "slack rejected the digest; cursor held, discord skipped"
            );
            return Err(e.into());
        }

        let groups = digest::pack(&channel.title, new_items, self.settings.max_message_length);
        for group in &groups {
            self.queue
                .enqueue(DiscordMessage {
                    channel_id: self.settings.discord_channel_id.clone(),
                    content: group.content(),
                })
                .await?;
        }
        debug!(feed = %feed_url, digests = groups.len(), "queued discord digests");

        self.store.put(feed_url, next_cursor).await?;
        info!(feed = %feed_url, cursor = %next_cursor, "advanced cursor");

        Ok(FeedOutcome::Delivered {
            items: new_items.len(),
            digests: groups.len(),
            cursor: next_cursor.to_string(),
        })
    }
}
