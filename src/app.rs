use std::sync::Arc;

use reqwest::Client;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::external::extractor::ExtractTarget;
use crate::external::fetcher::HtmlFetcher;
use crate::external::multi_source::MultiSourceResolver;
use crate::external::price_source::{PriceSource, SourceConfig, SourceKind};
use crate::external::scraped_source::ScrapedSource;
use crate::external::spot::{SpotConfig, SpotEstimator};
use crate::services::alert_service::AlertRule;
use crate::services::notification_service::{LogNotifier, Notifier, NtfyNotifier};
use crate::services::price_service::{PriceUpdateService, TrackedSeries};

pub fn build_client() -> Result<Client, AppError> {
    Client::builder()
        .build()
        .map_err(|e| AppError::External(format!("Failed to build HTTP client: {}", e)))
}

/// GoodReturns first, BankBazaar second, then the spot estimate when enabled.
pub fn build_resolver(config: &AppConfig, client: &Client) -> MultiSourceResolver {
    let fetcher = HtmlFetcher::new(client.clone());
    let target = ExtractTarget::new(&config.karat, &config.city);

    let sources: Vec<Box<dyn PriceSource>> = vec![
        Box::new(ScrapedSource::new(
            SourceConfig::new(SourceKind::GoodReturns, &config.goodreturns_url)
                .with_timeout(config.http_timeout),
            target.clone(),
            fetcher.clone(),
        )),
        Box::new(ScrapedSource::new(
            SourceConfig::new(SourceKind::BankBazaar, &config.bankbazaar_url)
                .with_timeout(config.http_timeout),
            target,
            fetcher,
        )),
    ];

    let resolver = MultiSourceResolver::new(sources, config.fallback_price);
    if !config.spot_fallback_enabled {
        return resolver;
    }

    info!("📊 Spot price estimate enabled as last scraped-source fallback");
    let mut spot = SpotConfig::new(
        &config.spot_price_url,
        &config.fx_rate_url,
        config.retail_markup_percent,
    );
    spot.timeout = config.http_timeout;
    resolver.with_spot_estimator(SpotEstimator::new(client.clone(), spot))
}

pub fn build_notifier(config: &AppConfig, client: &Client) -> Arc<dyn Notifier> {
    match &config.ntfy_topic_url {
        Some(topic) => {
            info!("📣 Alerts go to ntfy topic {}", topic);
            Arc::new(NtfyNotifier::new(client.clone(), topic, config.http_timeout))
        }
        None => {
            info!("📣 NTFY_TOPIC_URL not set, alerts are logged only");
            Arc::new(LogNotifier)
        }
    }
}

pub fn build_update_service(
    config: &AppConfig,
    pool: SqlitePool,
    client: &Client,
) -> PriceUpdateService {
    PriceUpdateService::new(
        pool,
        build_resolver(config, client),
        build_notifier(config, client),
        AlertRule::new(config.alert_threshold_percent),
        TrackedSeries {
            karat: config.karat.clone(),
            city: config.city.clone(),
        },
        config.trailing_days,
    )
}
