//! Discord delivery: a bounded in-process queue and the worker draining it.
//!
//! The orchestrator only ever talks to [`DiscordQueue`]; enqueueing succeeds
//! as soon as the message is accepted by the queue.  [`DiscordWorker`] posts
//! queued messages one at a time, in order, and logs (but does not retry)
//! failed deliveries.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::QueueSink;
use crate::error::NotifyError;

/// One queued digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordMessage {
    pub channel_id: String,
    pub content: String,
}

/// Producer side of the delivery queue.
#[derive(Clone)]
pub struct DiscordQueue {
    sender: mpsc::Sender<DiscordMessage>,
}

impl DiscordQueue {
    /// Create a queue holding at most `capacity` undelivered messages.
    /// Producers wait when it is full.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<DiscordMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl QueueSink for DiscordQueue {
    async fn enqueue(&self, message: DiscordMessage) -> Result<(), NotifyError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| NotifyError::QueueClosed)
    }
}

/// Consumer side: posts each message to the channel-messages endpoint.
pub struct DiscordWorker {
    client: Client,
    api_base: String,
    token: Option<String>,
    receiver: mpsc::Receiver<DiscordMessage>,
}

impl DiscordWorker {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        token: Option<String>,
        receiver: mpsc::Receiver<DiscordMessage>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token,
            receiver,
        }
    }

    /// Drain the queue until every [`DiscordQueue`] handle is dropped.
    pub async fn run(mut self) {
        info!("discord worker started");

        while let Some(message) = self.receiver.recv().await {
            if let Err(e) = self.deliver(&message).await {
                error!(channel_id = %message.channel_id, error = %e, "discord delivery failed");
            }
        }

        info!("discord worker stopped");
    }

    async fn deliver(&self, message: &DiscordMessage) -> Result<(), NotifyError> {
        let url = format!(
            "{}/channels/{}/messages",
            self.api_base.trim_end_matches('/'),
            message.channel_id
        );

        let mut request = self
            .client
            .post(&url)
            .json(&json!({ "content": message.content }));
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bot {token}"));
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                sink: "discord",
                message: format!("HTTP {status}: {body}"),
            });
        }

        debug!(channel_id = %message.channel_id, chars = message.content.chars().count(), "posted to discord");
        Ok(())
    }
}
