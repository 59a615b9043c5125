use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// One persisted observation of the tracked retail price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub timestamp: NaiveDateTime,
    pub price_per_10g: f64,
    pub karat: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceRecord {
    pub date: NaiveDate,
    pub timestamp: NaiveDateTime,
    pub price_per_10g: f64,
    pub karat: String,
    pub city: String,
}

impl NewPriceRecord {
    /// Build a record stamped at `now`, truncated to whole seconds.
    pub fn at(now: NaiveDateTime, price_per_10g: f64, karat: &str, city: &str) -> Self {
        let timestamp = now.with_nanosecond(0).unwrap_or(now);
        Self {
            date: timestamp.date(),
            timestamp,
            price_per_10g,
            karat: karat.to_string(),
            city: city.to_string(),
        }
    }

    pub fn date_text(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Result of an insert against the `(date, timestamp)` uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    AlreadyExists,
}

/// Summary of prices over a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl WindowStats {
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let count = prices.len();
        let mean = prices.iter().sum::<f64>() / count as f64;
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            min,
            max,
            std_dev: variance.sqrt(),
        })
    }
}
