use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::external::price_source::SourceConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Plain GET of a source page. Retries and fallback belong to the resolver.
#[derive(Clone, Default)]
pub struct HtmlFetcher {
    client: Client,
}

impl HtmlFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, source: &SourceConfig) -> Result<String, FetchError> {
        debug!("GET {} ({})", source.url, source.kind);

        let mut request = self.client.get(&source.url).timeout(source.timeout);
        for (name, value) in &source.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        info!("Fetched {} chars from {}", body.len(), source.kind);
        Ok(body)
    }
}
