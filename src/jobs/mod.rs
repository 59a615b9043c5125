//! Background Jobs Module
//!
//! Jobs registered with the job scheduler service. Each job is safe to re-run
//! and logs its own failures; the scheduler records every run in `job_runs`.
//!
//! # Available Jobs
//!
//! - `price_update_job` - Resolves, stores and evaluates the tracked gold price

pub mod price_update_job;
