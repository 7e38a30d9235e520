//! In-memory stand-ins for the network and the notification sinks.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, Uri};
use axum::{Json, Router};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{FetchError, NotifyError, StoreError};
use crate::notify::{ChatSink, DiscordMessage, QueueSink, SlackMessage};
use crate::source::DataSource;
use crate::store::CursorStore;

/// A [`DataSource`] answering from a URL → body table.
///
/// Unknown URLs answer 404, URLs registered with [`with_failure`] answer 503.
/// Bodies can be swapped between passes.
///
/// [`with_failure`]: StaticSource::with_failure
#[derive(Default)]
pub struct StaticSource {
    bodies: Mutex<HashMap<String, Option<String>>>,
    requests: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, url: &str, body: impl Into<String>) -> Self {
        self.set_body(url, body);
        self
    }

    pub fn with_failure(self, url: &str) -> Self {
        self.bodies.lock().unwrap().insert(url.to_string(), None);
        self
    }

    pub fn set_body(&self, url: &str, body: impl Into<String>) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(body.into()));
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.bodies.lock().unwrap().get(url) {
            Some(Some(body)) => Ok(body.clone()),
            Some(None) => Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Volatile [`CursorStore`].
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for MemoryStore {
    async fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn get(&self, feed_url: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(feed_url).cloned())
    }

    async fn put(&self, feed_url: &str, cursor: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(feed_url.to_string(), cursor.to_string());
        Ok(())
    }
}

/// Records every Slack message; optionally rejects them all.
#[derive(Default)]
pub struct RecordingChat {
    pub sent: Mutex<Vec<SlackMessage>>,
    pub fail: bool,
}

impl RecordingChat {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SlackMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSink for RecordingChat {
    async fn post(&self, message: &SlackMessage) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Api {
                sink: "slack",
                message: "channel_not_found".into(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Records every queued Discord message; optionally behaves like a queue
/// whose worker is gone.
#[derive(Default)]
pub struct RecordingQueue {
    pub sent: Mutex<Vec<DiscordMessage>>,
    pub closed: bool,
}

impl RecordingQueue {
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<DiscordMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueSink for RecordingQueue {
    async fn enqueue(&self, message: DiscordMessage) -> Result<(), NotifyError> {
        if self.closed {
            return Err(NotifyError::QueueClosed);
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Build an RDF document with the given channel title and `(title, link)`
/// items, newest first.
pub fn rdf_document(title: &str, items: &[(&str, &str)]) -> String {
    let mut xml = format!(
        r#"<rdf:RDF xmlns="http://purl.org/rss/1.0/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel><title>{title}</title><link>http://example.com/chanel</link><description>this is channel</description></channel>
"#
    );
    for (item_title, link) in items {
        xml.push_str(&format!(
            "<item><title>{item_title}</title><link>{link}</link><dc:date>2024-12-26T15:00:00Z</dc:date></item>\n"
        ));
    }
    xml.push_str("</rdf:RDF>");
    xml
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve_router(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// A request seen by [`CaptureServer`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct CaptureState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    reply: Value,
}

/// A local HTTP server that records every request and answers each one
/// with the same JSON body.
pub struct CaptureServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl CaptureServer {
    pub async fn start(reply: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = CaptureState {
            requests: requests.clone(),
            reply,
        };
        let app = Router::new().fallback(capture).with_state(state);

        Self {
            base_url: serve_router(app).await,
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn capture(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    state.requests.lock().unwrap().push(CapturedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    Json(state.reply.clone())
}
