use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::external::price_source::DEFAULT_TIMEOUT;

pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1034768;

#[derive(Debug, Error)]
pub enum SpotError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SpotError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SpotError::Parse(e.to_string())
        } else {
            SpotError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotConfig {
    pub spot_url: String,
    pub fx_url: String,
    pub currency: String,
    pub markup_percent: f64,
    pub timeout: Duration,
}

impl SpotConfig {
    pub fn new(spot_url: impl Into<String>, fx_url: impl Into<String>, markup_percent: f64) -> Self {
        Self {
            spot_url: spot_url.into(),
            fx_url: fx_url.into(),
            currency: "INR".to_string(),
            markup_percent,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    price: f64,
}

#[derive(Debug, Deserialize)]
struct FxResponse {
    rates: HashMap<String, f64>,
}

/// Retail estimate built from the international spot price, used only when
/// every scraped source has failed.
pub struct SpotEstimator {
    client: Client,
    config: SpotConfig,
}

impl SpotEstimator {
    pub fn new(client: Client, config: SpotConfig) -> Self {
        Self { client, config }
    }

    pub async fn estimate(&self) -> Result<f64, SpotError> {
        let spot = self.fetch_spot_per_ounce().await?;
        let fx = self.fetch_fx_rate().await?;
        let price = retail_estimate(spot, fx, self.config.markup_percent);

        info!(
            "Spot estimate: {:.2} USD/oz x {:.4} {} + {:.1}% markup = {:.2} per 10g",
            spot, fx, self.config.currency, self.config.markup_percent, price
        );
        Ok(price)
    }

    async fn fetch_spot_per_ounce(&self) -> Result<f64, SpotError> {
        let resp = self
            .client
            .get(&self.config.spot_url)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SpotError::BadResponse(format!("spot status {}", resp.status())));
        }

        let body = resp.json::<SpotResponse>().await?;
        if body.price <= 0.0 {
            return Err(SpotError::BadResponse(format!("non-positive spot price {}", body.price)));
        }
        Ok(body.price)
    }

    async fn fetch_fx_rate(&self) -> Result<f64, SpotError> {
        let resp = self
            .client
            .get(&self.config.fx_url)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SpotError::BadResponse(format!("fx status {}", resp.status())));
        }

        let body = resp.json::<FxResponse>().await?;
        body.rates
            .get(&self.config.currency)
            .copied()
            .filter(|rate| *rate > 0.0)
            .ok_or_else(|| SpotError::BadResponse(format!("missing {} rate", self.config.currency)))
    }
}

/// Price per 10 grams in the local currency, with the retail markup
/// (making charges, tax, margin) applied as one composite percentage.
pub fn retail_estimate(spot_usd_per_oz: f64, usd_rate: f64, markup_percent: f64) -> f64 {
    let per_gram = spot_usd_per_oz / GRAMS_PER_TROY_OUNCE * usd_rate;
    per_gram * 10.0 * (1.0 + markup_percent / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_retail_estimate() {
        // one ounce priced so a gram costs exactly 1 USD
        let price = retail_estimate(GRAMS_PER_TROY_OUNCE, 80.0, 26.0);
        assert!((price - 1008.0).abs() < 1e-9);
    }

    async fn server_with(spot: ResponseTemplate, fx: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/price/XAU"))
            .respond_with(spot)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/USD"))
            .respond_with(fx)
            .mount(&server)
            .await;
        server
    }

    fn estimator(server: &MockServer) -> SpotEstimator {
        SpotEstimator::new(
            Client::new(),
            SpotConfig::new(
                format!("{}/price/XAU", server.uri()),
                format!("{}/latest/USD", server.uri()),
                26.0,
            ),
        )
    }

    #[tokio::test]
    async fn test_estimate_combines_spot_and_fx() {
        let server = server_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "name": "Gold", "price": GRAMS_PER_TROY_OUNCE })),
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "result": "success", "rates": { "INR": 80.0 } })),
        )
        .await;

        let price = estimator(&server).estimate().await.unwrap();
        assert!((price - 1008.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_missing_currency_is_bad_response() {
        let server = server_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "price": 2650.0 })),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "rates": { "EUR": 0.9 } })),
        )
        .await;

        let err = estimator(&server).estimate().await.unwrap_err();
        assert!(matches!(err, SpotError::BadResponse(_)));
    }

    #[tokio::test]
    async fn test_spot_outage_is_error() {
        let server = server_with(
            ResponseTemplate::new(500),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "rates": { "INR": 83.0 } })),
        )
        .await;

        assert!(estimator(&server).estimate().await.is_err());
    }
}
