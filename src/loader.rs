// CSV row fetch. This is collaborator territory: the engine only ever sees
// the resulting `Vec<RawRecord>`, so swapping this file for an HTTP or
// database source changes nothing downstream. A fetch failure propagates to
// the caller before `rebuild` is invoked, leaving the previous snapshot
// intact.
use csv::ReaderBuilder;
use thiserror::Error;
use tracing::warn;

use crate::types::RawRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read metrics source: {0}")]
    Csv(#[from] csv::Error),
}

pub fn load_rows(path: &str) -> Result<Vec<RawRecord>, SourceError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawRecord>() {
        match result {
            Ok(row) => rows.push(row),
            // Structurally unreadable lines never reach the validator; log
            // and move on.
            Err(e) => warn!("skipping unreadable csv row: {}", e),
        }
    }
    Ok(rows)
}
