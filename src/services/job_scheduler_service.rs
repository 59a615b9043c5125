use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::db::job_run_queries::{record_job_failure, record_job_start, record_job_success};
use crate::errors::AppError;
use crate::jobs::price_update_job;
use crate::models::JobResult;
use crate::services::price_service::PriceUpdateService;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: SqlitePool,
    pub update_service: Arc<PriceUpdateService>,
    pub run_in_progress: Arc<AtomicBool>,
}

impl JobContext {
    pub fn new(pool: SqlitePool, update_service: Arc<PriceUpdateService>) -> Self {
        Self {
            pool,
            update_service,
            run_in_progress: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Clears the run-in-progress flag when the run ends, however it ends.
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl RunGuard {
    /// `None` when another run already holds the flag.
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Register the price update job on `schedule` (cron with seconds) and start.
    pub async fn start(&mut self, schedule: &str) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        self.schedule_job(
            schedule,
            price_update_job::JOB_NAME,
            "Gold price update",
            price_update_job::run_price_update,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    /// Helper to schedule a job with tracking
    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

// Job tracking wrapper
pub async fn execute_job_with_tracking<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();
    let pool = context.pool.clone();

    // Bookkeeping failures are logged; the job itself still runs.
    let job_id = match record_job_start(&pool, job_name).await {
        Ok(id) => Some(id),
        Err(e) => {
            error!("Failed to record job start: {}", e);
            None
        }
    };

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );

            let Some(job_id) = job_id else { return };
            if let Err(e) = record_job_success(
                &pool,
                job_id,
                job_result.items_processed,
                job_result.items_failed,
                duration_ms,
            )
            .await
            {
                error!("Failed to record job success: {}", e);
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);

            let Some(job_id) = job_id else { return };
            if let Err(e) = record_job_failure(&pool, job_id, &e.to_string(), duration_ms).await {
                error!("Failed to record job failure: {}", e);
            }
        }
    }
}
