//! HTTP client utilities.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Longest error body kept in an API error message
const MAX_ERROR_BODY: usize = 200;

/// Shared HTTP client configured from the `[http]` settings
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with the configured user agent and timeouts
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        Self::with_user_agent(config, &config.user_agent)
    }

    /// Create a client with a custom user agent
    pub fn with_user_agent(config: &HttpConfig, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// GET `url` and return the body of a successful response.
    ///
    /// 429 maps to [`SourceError::RateLimit`], any other non-2xx status to
    /// [`SourceError::Api`].
    pub async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        tracing::trace!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok(response.text().await?)
    }

    /// GET `url` and deserialize a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
