use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::JobResult;
use crate::services::job_scheduler_service::{JobContext, RunGuard};
use crate::services::price_service::PersistStatus;

pub const JOB_NAME: &str = "update_gold_price";

/// Scheduled entry point. One update run; skipped if the previous run is still
/// going.
pub async fn run_price_update(ctx: JobContext) -> Result<JobResult, AppError> {
    let Some(_guard) = RunGuard::acquire(&ctx.run_in_progress) else {
        warn!("Previous price update still running, skipping this tick");
        return Ok(JobResult {
            items_processed: 0,
            items_failed: 0,
        });
    };

    let outcome = ctx.update_service.run_once().await;

    info!(
        "Price update finished: ₹{:.2} from {}, alert fired: {}",
        outcome.price,
        outcome.origin,
        outcome.alert_fired()
    );

    let items_failed = match outcome.persisted {
        PersistStatus::Failed(_) | PersistStatus::Skipped => 1,
        PersistStatus::Inserted(_) | PersistStatus::Duplicate => 0,
    };

    Ok(JobResult {
        items_processed: 1,
        items_failed,
    })
}
