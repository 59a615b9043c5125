use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use tracing::error;

use crate::models::{InsertOutcome, NewPriceRecord, PriceRecord, WindowStats, DATE_FORMAT, TIMESTAMP_FORMAT};

/// Insert one record. A row with the same `(date, timestamp)` is left untouched
/// and reported as `AlreadyExists`.
pub async fn insert(
    pool: &SqlitePool,
    record: &NewPriceRecord,
) -> Result<InsertOutcome, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO gold_prices (date, timestamp, price_per_10g, karat, city)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (date, timestamp) DO NOTHING
        "#,
    )
    .bind(record.date_text())
    .bind(record.timestamp_text())
    .bind(record.price_per_10g)
    .bind(&record.karat)
    .bind(&record.city)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(
            "Failed to insert price {} at {}: {}",
            record.price_per_10g,
            record.timestamp_text(),
            e
        );
        e
    })?;

    if result.rows_affected() == 0 {
        Ok(InsertOutcome::AlreadyExists)
    } else {
        Ok(InsertOutcome::Inserted(result.last_insert_rowid()))
    }
}

/// Mean price of the tracked series over records dated on or after `today - days`.
///
/// Returns `None` when no row qualifies.
pub async fn average_since(
    pool: &SqlitePool,
    days: i64,
    today: NaiveDate,
    karat: &str,
    city: &str,
) -> Result<Option<f64>, sqlx::Error> {
    let since = today - Duration::days(days);

    sqlx::query_scalar::<_, Option<f64>>(
        r#"
        SELECT AVG(price_per_10g)
        FROM gold_prices
        WHERE date >= ?1 AND karat = ?2 AND city = ?3
        "#,
    )
    .bind(since.format(DATE_FORMAT).to_string())
    .bind(karat)
    .bind(city)
    .fetch_one(pool)
    .await
}

/// Most recent `n` records, newest first.
pub async fn latest_n(pool: &SqlitePool, n: i64) -> Result<Vec<PriceRecord>, sqlx::Error> {
    sqlx::query_as::<_, PriceRecord>(
        r#"
        SELECT id, date, timestamp, price_per_10g, karat, city
        FROM gold_prices
        ORDER BY timestamp DESC, id DESC
        LIMIT ?1
        "#,
    )
    .bind(n)
    .fetch_all(pool)
    .await
}

/// Most recent `n` records of one karat/city series, newest first.
pub async fn latest_in_series(
    pool: &SqlitePool,
    n: i64,
    karat: &str,
    city: &str,
) -> Result<Vec<PriceRecord>, sqlx::Error> {
    sqlx::query_as::<_, PriceRecord>(
        r#"
        SELECT id, date, timestamp, price_per_10g, karat, city
        FROM gold_prices
        WHERE karat = ?1 AND city = ?2
        ORDER BY timestamp DESC, id DESC
        LIMIT ?3
        "#,
    )
    .bind(karat)
    .bind(city)
    .bind(n)
    .fetch_all(pool)
    .await
}

/// Records of one karat/city series stamped at or after `since`, oldest first.
pub async fn fetch_since(
    pool: &SqlitePool,
    since: NaiveDateTime,
    karat: &str,
    city: &str,
) -> Result<Vec<PriceRecord>, sqlx::Error> {
    sqlx::query_as::<_, PriceRecord>(
        r#"
        SELECT id, date, timestamp, price_per_10g, karat, city
        FROM gold_prices
        WHERE timestamp >= ?1 AND karat = ?2 AND city = ?3
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(since.format(TIMESTAMP_FORMAT).to_string())
    .bind(karat)
    .bind(city)
    .fetch_all(pool)
    .await
}

/// Count, mean, min, max and population std-dev of one series' prices stamped
/// at or after `since`. `None` for an empty window.
pub async fn window_stats(
    pool: &SqlitePool,
    since: NaiveDateTime,
    karat: &str,
    city: &str,
) -> Result<Option<WindowStats>, sqlx::Error> {
    let prices = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT price_per_10g
        FROM gold_prices
        WHERE timestamp >= ?1 AND karat = ?2 AND city = ?3
        "#,
    )
    .bind(since.format(TIMESTAMP_FORMAT).to_string())
    .bind(karat)
    .bind(city)
    .fetch_all(pool)
    .await?;

    Ok(WindowStats::from_prices(&prices))
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM gold_prices")
        .fetch_one(pool)
        .await
}
