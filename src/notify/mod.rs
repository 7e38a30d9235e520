//! Notification sinks.
//!
//! New items leave the relay through two independent channels:
//!
//! * [`ChatSink`]: one rich Slack message per feed per pass, carrying every
//!   new item.  Slack has no practical size limit for this.
//! * [`QueueSink`]: one or more plain-text digests per feed per pass, packed
//!   by [`crate::digest::pack`] to stay under Discord's content limit.  The
//!   production sink only places messages on an in-process queue; a
//!   [`DiscordWorker`] drains it.
//!
//! Neither sink retries.  A rejected send is reported to the caller.

mod discord;
mod slack;

pub use discord::{DiscordMessage, DiscordQueue, DiscordWorker};
pub use slack::{SlackMessage, SlackNotifier};

use async_trait::async_trait;

use crate::error::NotifyError;

/// Receiver of the rich per-feed message.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn post(&self, message: &SlackMessage) -> Result<(), NotifyError>;
}

/// Receiver of the packed digests.
#[async_trait]
pub trait QueueSink: Send + Sync {
    async fn enqueue(&self, message: DiscordMessage) -> Result<(), NotifyError>;
}
