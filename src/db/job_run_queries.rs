use sqlx::SqlitePool;

use crate::models::JobStatus;

pub async fn record_job_start(pool: &SqlitePool, job_name: &str) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO job_runs (job_name, status)
        VALUES (?1, ?2)
        "#,
    )
    .bind(job_name)
    .bind(JobStatus::Running.as_str())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn record_job_success(
    pool: &SqlitePool,
    job_id: i64,
    items_processed: i32,
    items_failed: i32,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE job_runs
        SET completed_at = datetime('now'),
            status = ?2,
            items_processed = ?3,
            items_failed = ?4,
            duration_ms = ?5
        WHERE id = ?1
        "#,
    )
    .bind(job_id)
    .bind(JobStatus::Success.as_str())
    .bind(items_processed)
    .bind(items_failed)
    .bind(duration_ms)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn record_job_failure(
    pool: &SqlitePool,
    job_id: i64,
    error_message: &str,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE job_runs
        SET completed_at = datetime('now'),
            status = ?2,
            error_message = ?3,
            duration_ms = ?4
        WHERE id = ?1
        "#,
    )
    .bind(job_id)
    .bind(JobStatus::Failed.as_str())
    .bind(error_message)
    .bind(duration_ms)
    .execute(pool)
    .await?;

    Ok(())
}

/// Status of the most recent run of `job_name`, if any.
pub async fn last_status(pool: &SqlitePool, job_name: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT status FROM job_runs WHERE job_name = ?1 ORDER BY id DESC LIMIT 1",
    )
    .bind(job_name)
    .fetch_optional(pool)
    .await
}
