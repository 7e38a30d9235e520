//! reqwest-backed [`DataSource`].

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::DataSource;
use crate::error::FetchError;

/// Fetches feeds and `robots.txt` files over HTTP.
///
/// Cheap to clone: the inner [`Client`] is reference counted and shares its
/// connection pool.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Wrap a client shared with the notifiers.  The user agent and request
    /// timeout configured on `client` apply to every feed and robots read.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }
}
