//! JSON reports written next to the CSV outputs.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;
use crate::store::messages::create_file;

/// Write `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut writer = BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    debug!(path = %path.display(), "Wrote JSON report");
    Ok(())
}
