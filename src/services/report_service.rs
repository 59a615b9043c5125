// Read-only summaries of stored prices for the command line.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::price_queries;
use crate::errors::AppError;
use crate::models::{PriceRecord, WindowStats};
use crate::services::price_service::TrackedSeries;

#[derive(Debug, Clone, Serialize)]
pub struct PriceSummary {
    pub current: f64,
    pub current_at: NaiveDateTime,
    pub change: f64,
    pub change_percent: f64,
    pub today_average: Option<f64>,
    pub week_average: Option<f64>,
    pub month_average: Option<f64>,
    pub window_days: i64,
    pub window: Option<WindowStats>,
}

/// Latest price of the tracked series against the one before it, plus rolling
/// averages and high/low/std-dev over the last `window_days`.
pub async fn summarize(
    pool: &SqlitePool,
    series: &TrackedSeries,
    now: NaiveDateTime,
    window_days: i64,
) -> Result<Option<PriceSummary>, AppError> {
    let TrackedSeries { karat, city } = series;
    let latest = price_queries::latest_in_series(pool, 2, karat, city).await?;
    let Some(current) = latest.first() else {
        return Ok(None);
    };
    let previous = latest.get(1).unwrap_or(current);

    let history = price_queries::fetch_since(pool, now - Duration::days(30), karat, city).await?;

    let change = current.price_per_10g - previous.price_per_10g;
    let change_percent = if previous.price_per_10g != 0.0 {
        change / previous.price_per_10g * 100.0
    } else {
        0.0
    };

    let window_start = now - Duration::days(window_days);
    let window = price_queries::window_stats(pool, window_start, karat, city).await?;

    Ok(Some(PriceSummary {
        current: current.price_per_10g,
        current_at: current.timestamp,
        change,
        change_percent,
        today_average: mean(&history
            .iter()
            .filter(|r| r.date == current.date)
            .map(|r| r.price_per_10g)
            .collect::<Vec<_>>()),
        week_average: mean(&prices_since(&history, now - Duration::days(7))),
        month_average: mean(&prices_since(&history, now - Duration::days(30))),
        window_days,
        window,
    }))
}

fn prices_since(records: &[PriceRecord], since: NaiveDateTime) -> Vec<f64> {
    records
        .iter()
        .filter(|r| r.timestamp >= since)
        .map(|r| r.price_per_10g)
        .collect()
}

fn mean(prices: &[f64]) -> Option<f64> {
    WindowStats::from_prices(prices).map(|s| s.mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::NewPriceRecord;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn series() -> TrackedSeries {
        TrackedSeries { karat: "22K".to_string(), city: "Hyderabad".to_string() }
    }

    async fn seed(pool: &SqlitePool, ts: NaiveDateTime, price: f64) {
        price_queries::insert(pool, &NewPriceRecord::at(ts, price, "22K", "Hyderabad"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_store_has_no_summary() {
        let pool = db::connect_in_memory().await.unwrap();
        assert!(summarize(&pool, &series(), at(20, 12), 30).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_figures() {
        let pool = db::connect_in_memory().await.unwrap();
        seed(&pool, at(2, 6), 120000.0).await;
        seed(&pool, at(18, 6), 130000.0).await;
        seed(&pool, at(20, 6), 131000.0).await;
        seed(&pool, at(20, 12), 132000.0).await;
        price_queries::insert(&pool, &NewPriceRecord::at(at(20, 15), 90000.0, "22K", "Chennai"))
            .await
            .unwrap();

        let summary = summarize(&pool, &series(), at(20, 18), 7).await.unwrap().unwrap();

        assert_eq!(summary.current, 132000.0);
        assert_eq!(summary.current_at, at(20, 12));
        assert_eq!(summary.change, 1000.0);
        assert_eq!(summary.today_average, Some(131500.0));
        assert_eq!(summary.week_average, Some(131000.0));
        assert_eq!(summary.month_average, Some(128250.0));

        let window = summary.window.unwrap();
        assert_eq!(window.count, 3);
        assert_eq!(window.min, 130000.0);
        assert_eq!(window.max, 132000.0);
    }
}
