use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db::price_queries;
use crate::external::multi_source::{MultiSourceResolver, PriceOrigin, ResolvedPrice};
use crate::models::{InsertOutcome, NewPriceRecord};
use crate::services::alert_service::{drop_percentage, AlertRule};
use crate::services::notification_service::Notifier;

/// The karat/city pair every record and average is tagged with.
#[derive(Debug, Clone)]
pub struct TrackedSeries {
    pub karat: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersistStatus {
    Inserted(i64),
    Duplicate,
    /// Nothing was fetched; the fallback constant is reported but not stored.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertStatus {
    NotTriggered,
    Delivered,
    DeliveryFailed(String),
}

/// Everything one update run did. A run always produces a price.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub origin: PriceOrigin,
    pub persisted: PersistStatus,
    pub trailing_average: Option<f64>,
    pub drop_percent: Option<f64>,
    pub alert: AlertStatus,
}

impl UpdateOutcome {
    pub fn alert_fired(&self) -> bool {
        !matches!(self.alert, AlertStatus::NotTriggered)
    }
}

/// Resolve, persist, evaluate, notify. No step after resolving can abort the
/// run; failures are logged and reflected in the outcome.
pub struct PriceUpdateService {
    pool: SqlitePool,
    resolver: MultiSourceResolver,
    notifier: Arc<dyn Notifier>,
    rule: AlertRule,
    series: TrackedSeries,
    trailing_days: i64,
}

impl PriceUpdateService {
    pub fn new(
        pool: SqlitePool,
        resolver: MultiSourceResolver,
        notifier: Arc<dyn Notifier>,
        rule: AlertRule,
        series: TrackedSeries,
        trailing_days: i64,
    ) -> Self {
        Self {
            pool,
            resolver,
            notifier,
            rule,
            series,
            trailing_days,
        }
    }

    pub async fn run_once(&self) -> UpdateOutcome {
        self.run_once_at(Local::now().naive_local()).await
    }

    pub async fn run_once_at(&self, now: NaiveDateTime) -> UpdateOutcome {
        info!("💰 Resolving {} {} gold price...", self.series.karat, self.series.city);
        let resolved = self.resolver.resolve().await;
        self.record_and_evaluate(now, resolved).await
    }

    /// Runs the steps after resolving with an already known price.
    pub async fn record_and_evaluate(
        &self,
        now: NaiveDateTime,
        resolved: ResolvedPrice,
    ) -> UpdateOutcome {
        let ResolvedPrice { price, origin } = resolved;

        if origin == PriceOrigin::Fallback {
            warn!(
                "⚠ No source produced a price; reporting fallback {:.2} without storing or alerting",
                price
            );
            return UpdateOutcome {
                timestamp: now.with_nanosecond(0).unwrap_or(now),
                price,
                origin,
                persisted: PersistStatus::Skipped,
                trailing_average: None,
                drop_percent: None,
                alert: AlertStatus::NotTriggered,
            };
        }

        // Read before inserting so the fresh price is compared against history only.
        let trailing_average = match price_queries::average_since(
            &self.pool,
            self.trailing_days,
            now.date(),
            &self.series.karat,
            &self.series.city,
        )
        .await
        {
            Ok(avg) => avg,
            Err(e) => {
                error!("Failed to read {}-day average: {}", self.trailing_days, e);
                None
            }
        };

        let record = NewPriceRecord::at(now, price, &self.series.karat, &self.series.city);
        let persisted = match price_queries::insert(&self.pool, &record).await {
            Ok(InsertOutcome::Inserted(id)) => {
                info!("✓ Saved ₹{:.2} per 10g at {} ({})", price, record.timestamp_text(), origin);
                PersistStatus::Inserted(id)
            }
            Ok(InsertOutcome::AlreadyExists) => {
                warn!("⚠ Price already exists for {}", record.timestamp_text());
                PersistStatus::Duplicate
            }
            Err(e) => {
                error!("Failed to save price {:.2}: {}", price, e);
                PersistStatus::Failed(e.to_string())
            }
        };

        let drop_percent = trailing_average
            .filter(|avg| *avg > 0.0)
            .map(|avg| drop_percentage(price, avg));

        let alert = match trailing_average {
            Some(avg) if self.rule.should_alert(price, trailing_average) => {
                let message = self.rule.build_message(
                    &self.series.karat,
                    &self.series.city,
                    price,
                    avg,
                    self.trailing_days,
                );
                info!("🚨 {}", message.body);

                match self.notifier.send(&message).await {
                    Ok(()) => AlertStatus::Delivered,
                    Err(e) => {
                        error!("Failed to deliver price alert: {}", e);
                        AlertStatus::DeliveryFailed(e.to_string())
                    }
                }
            }
            _ => AlertStatus::NotTriggered,
        };

        UpdateOutcome {
            timestamp: record.timestamp,
            price,
            origin,
            persisted,
            trailing_average,
            drop_percent,
            alert,
        }
    }
}
