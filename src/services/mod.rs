pub mod alert_service;
pub mod export_service;
pub mod job_scheduler_service;
pub mod notification_service;
pub mod price_service;
pub mod report_service;
pub mod verification_service;
