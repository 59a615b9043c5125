use std::io::Write;

use serde::Serialize;

use crate::errors::AppError;
use crate::models::{PriceRecord, TIMESTAMP_FORMAT};

#[derive(Debug, Serialize)]
struct CsvRow {
    timestamp: String,
    price_per_10g: f64,
}

/// Write `timestamp,price_per_10g` rows, in the order given, with a header.
pub fn write_csv<W: Write>(records: &[PriceRecord], writer: W) -> Result<usize, AppError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in records {
        csv_writer.serialize(CsvRow {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            price_per_10g: record.price_per_10g,
        })?;
    }

    if records.is_empty() {
        csv_writer.write_record(["timestamp", "price_per_10g"])?;
    }

    csv_writer.flush()?;
    Ok(records.len())
}
