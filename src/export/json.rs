//! JSON import/export of stored review states.
//! Provides functionality to save and load (learner, card, state) records to/from JSON files.

use crate::database::StoredReview;
use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Exports review records to a JSON file at the specified path.
/// Returns an error if file creation or writing fails.
pub fn export_json_to_path(records: &[StoredReview], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;

    info!(count = records.len(), path = %path.display(), "review states exported");
    Ok(())
}

/// Imports review records from a JSON file.
/// States are returned as stored; the scheduler repairs any that break invariants when
/// they are next reviewed.
pub fn import_json(path: impl AsRef<Path>) -> Result<Vec<StoredReview>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let records: Vec<StoredReview> = serde_json::from_reader(reader)?;

    info!(count = records.len(), path = %path.display(), "review states imported");
    Ok(records)
}
