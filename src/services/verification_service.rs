// End-to-end check of the alert path against a throwaway copy of the store.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use reqwest::Client;
use tracing::{info, warn};

use crate::app;
use crate::config::AppConfig;
use crate::db::{self, price_queries};
use crate::errors::AppError;
use crate::external::multi_source::{PriceOrigin, ResolvedPrice};
use crate::models::NewPriceRecord;
use crate::services::price_service::UpdateOutcome;

/// Price seeded on each of the previous days; high enough that any realistic
/// current price counts as a drop.
pub const SEED_PRICE: f64 = 150000.0;
pub const SEED_DAYS: i64 = 3;

/// File path behind a `sqlite:` URL. `None` for in-memory databases.
pub fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path.starts_with(":memory:") || path == "memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

pub fn scratch_path(store: &Path) -> PathBuf {
    let mut name = store
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "gold_prices.db".into());
    name.push(".verify");
    store.with_file_name(name)
}

/// Copy the store (if it exists), seed it, run one update and clean up.
///
/// With `forced_price` the resolver is skipped and that price is recorded
/// as-is, which makes the alert outcome deterministic.
pub async fn verify_notification(
    config: &AppConfig,
    client: &Client,
    forced_price: Option<f64>,
    now: NaiveDateTime,
) -> Result<UpdateOutcome, AppError> {
    let store = sqlite_file_path(&config.database_url).ok_or_else(|| {
        AppError::Config(format!(
            "verify-notification needs a file-backed DATABASE_URL, got {}",
            config.database_url
        ))
    })?;
    let scratch = scratch_path(&store);

    if tokio::fs::try_exists(&store).await? {
        tokio::fs::copy(&store, &scratch).await?;
    }
    info!("🧪 Verifying alert path on scratch copy {}", scratch.display());

    let result = run_on_scratch(config, client, &scratch, forced_price, now).await;

    if let Err(e) = tokio::fs::remove_file(&scratch).await {
        warn!("Failed to remove scratch store {}: {}", scratch.display(), e);
    }
    result
}

async fn run_on_scratch(
    config: &AppConfig,
    client: &Client,
    scratch: &Path,
    forced_price: Option<f64>,
    now: NaiveDateTime,
) -> Result<UpdateOutcome, AppError> {
    let url = format!("sqlite:{}", scratch.display());
    let pool = db::connect(&url).await?;

    for days_ago in 1..=SEED_DAYS {
        let record = NewPriceRecord::at(
            now - Duration::days(days_ago),
            SEED_PRICE,
            &config.karat,
            &config.city,
        );
        price_queries::insert(&pool, &record).await?;
    }

    let service = app::build_update_service(config, pool.clone(), client);
    let outcome = match forced_price {
        Some(price) => {
            let resolved = ResolvedPrice {
                price,
                origin: PriceOrigin::Manual,
            };
            service.record_and_evaluate(now, resolved).await
        }
        None => service.run_once_at(now).await,
    };

    pool.close().await;
    Ok(outcome)
}
