use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:gold_prices.db";
pub const DEFAULT_GOODRETURNS_URL: &str = "https://www.goodreturns.in/gold-rates/hyderabad.html";
pub const DEFAULT_BANKBAZAAR_URL: &str = "https://www.bankbazaar.com/gold-rate-hyderabad.html";
pub const DEFAULT_SPOT_PRICE_URL: &str = "https://api.gold-api.com/price/XAU";
pub const DEFAULT_FX_RATE_URL: &str = "https://open.er-api.com/v6/latest/USD";
// Last known good retail price, Jan 2026.
pub const DEFAULT_FALLBACK_PRICE: f64 = 132000.0;
// Every 6 hours, on the hour (sec min hour day month weekday).
pub const DEFAULT_UPDATE_SCHEDULE: &str = "0 0 */6 * * *";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub karat: String,
    pub city: String,
    pub goodreturns_url: String,
    pub bankbazaar_url: String,
    pub fallback_price: f64,
    pub spot_fallback_enabled: bool,
    pub spot_price_url: String,
    pub fx_rate_url: String,
    pub retail_markup_percent: f64,
    pub alert_threshold_percent: f64,
    pub trailing_days: i64,
    pub ntfy_topic_url: Option<String>,
    pub http_timeout: Duration,
    pub update_schedule: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            karat: "22K".to_string(),
            city: "Hyderabad".to_string(),
            goodreturns_url: DEFAULT_GOODRETURNS_URL.to_string(),
            bankbazaar_url: DEFAULT_BANKBAZAAR_URL.to_string(),
            fallback_price: DEFAULT_FALLBACK_PRICE,
            spot_fallback_enabled: false,
            spot_price_url: DEFAULT_SPOT_PRICE_URL.to_string(),
            fx_rate_url: DEFAULT_FX_RATE_URL.to_string(),
            retail_markup_percent: 26.0,
            alert_threshold_percent: 1.0,
            trailing_days: 7,
            ntfy_topic_url: None,
            http_timeout: Duration::from_secs(10),
            update_schedule: DEFAULT_UPDATE_SCHEDULE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let config = Self {
            database_url: text("DATABASE_URL", defaults.database_url),
            karat: text("TRACKED_KARAT", defaults.karat),
            city: text("TRACKED_CITY", defaults.city),
            goodreturns_url: text("GOODRETURNS_URL", defaults.goodreturns_url),
            bankbazaar_url: text("BANKBAZAAR_URL", defaults.bankbazaar_url),
            fallback_price: parse_or(&lookup, "FALLBACK_PRICE", defaults.fallback_price)?,
            spot_fallback_enabled: parse_or(
                &lookup,
                "SPOT_FALLBACK_ENABLED",
                defaults.spot_fallback_enabled,
            )?,
            spot_price_url: text("SPOT_PRICE_URL", defaults.spot_price_url),
            fx_rate_url: text("FX_RATE_URL", defaults.fx_rate_url),
            retail_markup_percent: parse_or(
                &lookup,
                "RETAIL_MARKUP_PERCENT",
                defaults.retail_markup_percent,
            )?,
            alert_threshold_percent: parse_or(
                &lookup,
                "ALERT_THRESHOLD_PERCENT",
                defaults.alert_threshold_percent,
            )?,
            trailing_days: parse_or(&lookup, "TRAILING_DAYS", defaults.trailing_days)?,
            ntfy_topic_url: lookup("NTFY_TOPIC_URL").filter(|url| !url.trim().is_empty()),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            update_schedule: text("UPDATE_SCHEDULE", defaults.update_schedule),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.fallback_price > 0.0) {
            return Err(AppError::Config("FALLBACK_PRICE must be positive".to_string()));
        }
        if self.alert_threshold_percent < 0.0 {
            return Err(AppError::Config(
                "ALERT_THRESHOLD_PERCENT must not be negative".to_string(),
            ));
        }
        if self.trailing_days <= 0 {
            return Err(AppError::Config("TRAILING_DAYS must be at least 1".to_string()));
        }
        if self.http_timeout.is_zero() {
            return Err(AppError::Config("HTTP_TIMEOUT_SECS must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}
