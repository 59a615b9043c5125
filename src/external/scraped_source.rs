use async_trait::async_trait;

use crate::external::extractor::{self, ExtractTarget};
use crate::external::fetcher::HtmlFetcher;
use crate::external::price_source::{PriceSource, SourceConfig, SourceError};

/// A rate page fetched over HTTP and read with its kind's extraction rule.
pub struct ScrapedSource {
    config: SourceConfig,
    target: ExtractTarget,
    fetcher: HtmlFetcher,
}

impl ScrapedSource {
    pub fn new(config: SourceConfig, target: ExtractTarget, fetcher: HtmlFetcher) -> Self {
        Self { config, target, fetcher }
    }
}

#[async_trait]
impl PriceSource for ScrapedSource {
    fn name(&self) -> String {
        self.config.kind.to_string()
    }

    async fn fetch_price(&self) -> Result<f64, SourceError> {
        let html = self.fetcher.fetch(&self.config).await?;
        let price = extractor::extract(&html, self.config.kind, &self.target)?;
        Ok(price)
    }
}
