//! Labeled corpus file output.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::info;

use crate::error::StoreError;
use crate::labeler::{CorpusWriter, LabeledToken};

/// Write labeled messages to `path` in corpus format. Returns the record count.
pub fn write_corpus<'a, I>(path: &Path, labeled: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a [LabeledToken]>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = CorpusWriter::new(BufWriter::new(File::create(path)?));
    for record in labeled {
        writer.write_record(record)?;
    }
    let records = writer.records();
    writer.finish()?;

    info!(path = %path.display(), records, "Labeled data saved");
    Ok(records)
}
