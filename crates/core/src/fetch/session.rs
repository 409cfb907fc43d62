//! reqwest-backed item source.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientConfig, EndpointsConfig};
use crate::metrics;

use super::{extract_item_id, FetchError, ItemSource, Stage};

/// Maximum number of body characters kept in a status error.
const ERROR_BODY_LIMIT: usize = 200;

/// Shared HTTP session for one batch run.
///
/// Wraps a single connection pool configured once with the connect/read
/// timeout. The pool is released when the last handle is dropped.
pub struct HttpSession {
    client: Client,
    base_url: String,
    item_url: String,
    timeout: Duration,
}

impl HttpSession {
    /// Create a new session from endpoint and client configuration.
    pub fn new(endpoints: &EndpointsConfig, client: &ClientConfig) -> Result<Self, FetchError> {
        let timeout = client.timeout();
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        debug!(
            base_url = %endpoints.base_url,
            item_url = %endpoints.item_url,
            timeout_secs = timeout.as_secs(),
            "HTTP session opened"
        );

        Ok(Self {
            client,
            base_url: endpoints.base_url.clone(),
            item_url: endpoints.item_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Connect/read timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL of the second-stage record for `item_id`.
    pub fn item_url_for(&self, item_id: i64) -> String {
        format!("{}/{}", self.item_url, item_id)
    }

    /// GET `url` and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: summarize_body(&body),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// Collapse an error body onto one line and cap its length.
fn summarize_body(body: &str) -> String {
    body.split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(ERROR_BODY_LIMIT)
        .collect()
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        debug!(base_url = %self.base_url, "HTTP session closed");
    }
}

#[async_trait]
impl ItemSource for HttpSession {
    async fn fetch_item_id(&self) -> Result<i64, FetchError> {
        let start = Instant::now();
        let result = self
            .get_json(&self.base_url)
            .await
            .and_then(|body| extract_item_id(&body));

        debug!(url = %self.base_url, ok = result.is_ok(), "First-stage fetch finished");
        metrics::record_fetch(Stage::First, result.is_ok(), start.elapsed());
        result
    }

    async fn fetch_item(&self, item_id: i64) -> Result<Value, FetchError> {
        let start = Instant::now();
        let url = self.item_url_for(item_id);
        let result = self.get_json(&url).await;

        debug!(url = %url, ok = result.is_ok(), "Second-stage fetch finished");
        metrics::record_fetch(Stage::Second, result.is_ok(), start.elapsed());
        result
    }
}
