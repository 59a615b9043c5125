mod price_record;
pub mod job_run;

pub use price_record::{
    InsertOutcome, NewPriceRecord, PriceRecord, WindowStats, DATE_FORMAT, TIMESTAMP_FORMAT,
};
pub use job_run::{JobResult, JobStatus};
