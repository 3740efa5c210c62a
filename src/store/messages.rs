//! Message table storage — reads and writes scraped rows as CSV.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::classifier::Category;
use crate::error::StoreError;
use crate::pipeline::types::MessageRecord;

/// Column order of the scraped message table.
pub const MESSAGE_HEADER: [&str; 6] = [
    "Channel Title",
    "Channel Username",
    "ID",
    "Message",
    "Date",
    "Media Path",
];

/// Message table columns plus the assigned category.
pub const CLASSIFIED_HEADER: [&str; 7] = [
    "Channel Title",
    "Channel Username",
    "ID",
    "Message",
    "Date",
    "Media Path",
    "Category",
];

/// Column that must be present for preprocessing.
const MESSAGE_COLUMN: &str = "Message";

/// Read all rows from a CSV file.
pub fn read_records(path: &Path) -> Result<Vec<MessageRecord>, StoreError> {
    let file = File::open(path)?;
    let records = read_records_from(file).map_err(|e| match e {
        StoreError::MissingColumn { column, .. } => StoreError::MissingColumn {
            column,
            path: path.display().to_string(),
        },
        other => other,
    })?;
    info!(path = %path.display(), rows = records.len(), "Loaded message table");
    Ok(records)
}

/// Read all rows from any CSV source with a header row.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<MessageRecord>, StoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if !headers.iter().any(|h| h == MESSAGE_COLUMN) {
        return Err(StoreError::MissingColumn {
            column: MESSAGE_COLUMN.into(),
            path: "<reader>".into(),
        });
    }

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<MessageRecord>() {
        records.push(row?);
    }
    Ok(records)
}

/// Write rows to a CSV file with the message header, creating parent dirs.
pub fn write_records(path: &Path, records: &[MessageRecord]) -> Result<(), StoreError> {
    let file = create_file(path)?;
    write_records_to(file, records)?;
    debug!(path = %path.display(), rows = records.len(), "Wrote message table");
    Ok(())
}

/// Write rows with the message header to any writer.
pub fn write_records_to<W: Write>(writer: W, records: &[MessageRecord]) -> Result<(), StoreError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(MESSAGE_HEADER)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows with a trailing `Category` column.
pub fn write_classified<'a, I>(path: &Path, rows: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = (&'a MessageRecord, Category)>,
{
    let file = create_file(path)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    csv_writer.write_record(CLASSIFIED_HEADER)?;

    let mut written = 0;
    for (record, category) in rows {
        let id = record.id.to_string();
        let date = record.date.map(|d| d.to_rfc3339()).unwrap_or_default();
        csv_writer.write_record([
            record.channel_title.as_str(),
            record.channel_username.as_str(),
            id.as_str(),
            record.message.as_deref().unwrap_or_default(),
            date.as_str(),
            record.media_path.as_deref().unwrap_or_default(),
            category.as_str(),
        ])?;
        written += 1;
    }
    csv_writer.flush()?;
    debug!(path = %path.display(), rows = written, "Wrote classified table");
    Ok(written)
}

/// Drop rows whose message is missing, logging how many were removed.
pub fn drop_missing(records: Vec<MessageRecord>) -> Vec<MessageRecord> {
    let before = records.len();
    let kept: Vec<MessageRecord> = records
        .into_iter()
        .filter(|r| r.message.is_some())
        .collect();
    info!(
        column = MESSAGE_COLUMN,
        missing = before - kept.len(),
        remaining = kept.len(),
        "Dropped rows with missing messages"
    );
    kept
}

pub(super) fn create_file(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}
