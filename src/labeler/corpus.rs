//! Labeled corpus text format.
//!
//! ```text
//! <token1> <tag1>
//! <token2> <tag2>
//!
//! <token1> <tag1>
//!
//! ```
//!
//! One line per pair, each message followed by a blank line. A message with
//! no pairs still produces its (empty) record so line positions stay aligned
//! with the source rows.

use std::io::{self, Write};

use crate::labeler::LabeledToken;

/// Lines of one message joined by `\n`, without the record terminator.
pub fn format_block(labeled: &[LabeledToken]) -> String {
    labeled
        .iter()
        .map(LabeledToken::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Streams labeled messages in corpus format.
pub struct CorpusWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> CorpusWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    /// Write one message record.
    pub fn write_record(&mut self, labeled: &[LabeledToken]) -> io::Result<()> {
        self.inner.write_all(format_block(labeled).as_bytes())?;
        self.inner.write_all(b"\n\n")?;
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeler::EntityLabeler;

    #[test]
    fn block_joins_lines() {
        let labeled = EntityLabeler::default().label("ዋጋ 500 ብር");
        assert_eq!(format_block(&labeled), "ዋጋ O\n500 I-PRICE\nብር I-PRICE");
    }

    #[test]
    fn records_are_separated_by_blank_lines() {
        let labeler = EntityLabeler::default();
        let mut writer = CorpusWriter::new(Vec::new());
        writer.write_record(&labeler.label("ገርጂ 300")).unwrap();
        writer.write_record(&labeler.label("@shop")).unwrap();
        writer.write_record(&labeler.label("ብስራተ ገብርኤል")).unwrap();
        assert_eq!(writer.records(), 3);

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "ገርጂ I-LOC\n300 I-PRICE\n\n\n\nብስራተ ገብርኤል I-LOC\n\n"
        );
    }
}
