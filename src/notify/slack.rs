use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ChatSink;
use crate::error::NotifyError;
use crate::source::FeedItem;

/// A `chat.postMessage` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackMessage {
    pub channel: String,
    pub blocks: Vec<Block>,
}

/// The Block Kit blocks this relay uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: Text },
    Divider,
    Section { text: Text },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl SlackMessage {
    /// Header with the channel title, a divider, then one section per item.
    pub fn digest(channel: &str, title: &str, items: &[FeedItem]) -> Self {
        let mut blocks = Vec::with_capacity(items.len() + 2);
        blocks.push(Block::Header {
            text: Text::PlainText {
                text: title.to_string(),
            },
        });
        blocks.push(Block::Divider);
        blocks.extend(items.iter().map(|item| Block::Section {
            text: Text::Mrkdwn {
                text: format!("*{}*\n{}", item.title, item.link),
            },
        }));

        Self {
            channel: channel.to_string(),
            blocks,
        }
    }
}

/// Slack answers HTTP 200 even for failures; `ok` says what happened.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts [`SlackMessage`]s to the Web API.
pub struct SlackNotifier {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl SlackNotifier {
    pub fn new(client: Client, api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token,
        }
    }
}

#[async_trait]
impl ChatSink for SlackNotifier {
    async fn post(&self, message: &SlackMessage) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.api_url).json(message);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                sink: "slack",
                message: format!("HTTP {status}: {body}"),
            });
        }

        let reply: SlackResponse = resp.json().await?;
        if !reply.ok {
            return Err(NotifyError::Api {
                sink: "slack",
                message: reply.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        debug!(channel = %message.channel, blocks = message.blocks.len(), "posted to slack");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CaptureServer;
    use serde_json::json;

    fn two_items() -> Vec<FeedItem> {
        vec![
            FeedItem::new("item_title_1", "http://example.com/chanel/items/1"),
            FeedItem::new("item_title_2", "http://example.com/chanel/items/2"),
        ]
    }

    #[test]
    fn digest_serializes_to_block_kit() {
        let message = SlackMessage::digest("TEST_CHANNEL", "CHANNEL_TITLE", &two_items());

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "channel": "TEST_CHANNEL",
                "blocks": [
                    { "type": "header", "text": { "type": "plain_text", "text": "CHANNEL_TITLE" } },
                    { "type": "divider" },
                    { "type": "section", "text": { "type": "mrkdwn", "text": "*item_title_1*\nhttp://example.com/chanel/items/1" } },
                    { "type": "section", "text": { "type": "mrkdwn", "text": "*item_title_2*\nhttp://example.com/chanel/items/2" } }
                ]
            })
        );
    }

    #[tokio::test]
    async fn post_sends_payload_with_token() {
        let server = CaptureServer::start(json!({ "ok": true })).await;
        let notifier = SlackNotifier::new(
            Client::new(),
            format!("{}/api/chat.postMessage", server.base_url),
            Some("xoxb-test".into()),
        );

        let message = SlackMessage::digest("C1", "Title", &two_items());
        notifier.post(&message).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/chat.postMessage");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer xoxb-test"));
        assert_eq!(requests[0].body, serde_json::to_value(&message).unwrap());
    }

    #[tokio::test]
    async fn post_reports_api_rejection() {
        let server = CaptureServer::start(json!({ "ok": false, "error": "channel_not_found" })).await;
        let notifier = SlackNotifier::new(Client::new(), server.base_url.clone(), None);

        let err = notifier
            .post(&SlackMessage::digest("C1", "Title", &two_items()))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Api { message, .. } if message == "channel_not_found"));
        assert!(server.requests()[0].authorization.is_none());
    }
}
