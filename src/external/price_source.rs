use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::external::extractor::ExtractError;
use crate::external::fetcher::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Upstream pages we know how to read. Each kind has its own extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    GoodReturns,
    BankBazaar,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::GoodReturns => f.write_str("GoodReturns"),
            SourceKind::BankBazaar => f.write_str("BankBazaar"),
        }
    }
}

/// Where and how to fetch one source page.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl SourceConfig {
    pub fn new(kind: SourceKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            headers: browser_headers(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Header set that keeps rate sites from serving their bot page.
pub fn browser_headers() -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), BROWSER_USER_AGENT.to_string()),
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        ("Accept-Language".to_string(), "en-IN,en;q=0.9".to_string()),
    ]
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Extract(#[from] ExtractError),
}

/// A single upstream that can produce a 10-gram retail price.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> String;

    async fn fetch_price(&self) -> Result<f64, SourceError>;
}
